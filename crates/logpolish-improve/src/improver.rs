//! Single-message rewriting on top of an [`LlmProvider`].

use crate::prompt::{build_prompt, strip_quotes};
use crate::provider::LlmProvider;
use crate::usage::UsageTracker;
use logpolish_core::LogRecord;

/// What the provider needs to know about one log statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImproveRequest<'a> {
    /// The message text as collected, possibly still quoted.
    pub original: &'a str,
    /// The logging call it came from, e.g. `log.Printf`.
    pub function_call: &'a str,
    /// Free-text description of the call's arguments; may be empty.
    pub arguments: &'a str,
    /// May be empty.
    pub log_level: &'a str,
}

impl<'a> From<&LogRecord<'a>> for ImproveRequest<'a> {
    fn from(record: &LogRecord<'a>) -> Self {
        Self {
            original: record.message_template,
            function_call: record.original_call,
            arguments: record.argument_details,
            log_level: record.log_level,
        }
    }
}

/// Something that can rewrite a log message, or decline to.
///
/// `None` covers every failure mode: transport errors, API errors, and
/// responses that are empty once cleaned.
pub trait Improver {
    fn improve(&mut self, request: &ImproveRequest<'_>) -> Option<String>;

    /// Why the last `improve` call returned `None`, if known. Taking it
    /// clears it; the caller is responsible for logging it.
    fn take_failure(&mut self) -> Option<String> {
        None
    }
}

/// [`Improver`] backed by a text-generation provider.
pub struct LogImprover {
    provider: Box<dyn LlmProvider>,
    usage: UsageTracker,
    last_failure: Option<String>,
}

impl LogImprover {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            usage: UsageTracker::new(),
            last_failure: None,
        }
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }
}

impl Improver for LogImprover {
    fn improve(&mut self, request: &ImproveRequest<'_>) -> Option<String> {
        let prompt = build_prompt(request);
        let service = self.provider.kind().display_name();
        self.last_failure = None;

        match self.provider.complete(&prompt) {
            Ok(response) => {
                self.usage.record(response.input_tokens, response.output_tokens);
                let cleaned = strip_quotes(response.text.trim());
                if cleaned.is_empty() {
                    self.last_failure = Some(format!("{service} returned an empty message"));
                    None
                } else {
                    Some(cleaned.to_string())
                }
            }
            Err(e) => {
                self.usage.record_failure();
                self.last_failure = Some(format!("Error with {service} API: {e}"));
                None
            }
        }
    }

    fn take_failure(&mut self) -> Option<String> {
        self.last_failure.take()
    }
}
