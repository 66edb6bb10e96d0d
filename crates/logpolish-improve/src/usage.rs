//! Token accounting for a rewrite run.

/// Running request and token totals across a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsageTracker {
    pub requests: u64,
    pub failures: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record token usage from a successful response.
    pub fn record(&mut self, input_tokens: Option<u64>, output_tokens: Option<u64>) {
        self.requests += 1;
        if let Some(t) = input_tokens {
            self.total_input_tokens += t;
        }
        if let Some(t) = output_tokens {
            self.total_output_tokens += t;
        }
    }

    /// Record a request that produced no usable response.
    pub fn record_failure(&mut self) {
        self.requests += 1;
        self.failures += 1;
    }
}

impl std::fmt::Display for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requests ({} failed), {} input / {} output tokens",
            self.requests, self.failures, self.total_input_tokens, self.total_output_tokens
        )
    }
}
