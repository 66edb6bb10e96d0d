//! Terminal progress display for a rewrite run.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "  {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar over the rows of a table.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_prefix("Improving");
        Self { bar }
    }

    /// A bar that draws nothing; `suspend` still runs its closure.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Advance by one row.
    pub fn tick(&self) {
        self.bar.inc(1);
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    /// Suspend the bar for clean console output, then resume.
    pub fn suspend<F: FnOnce()>(&self, f: F) {
        self.bar.suspend(f);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        assert!(ProgressStyle::default_bar().template(TEMPLATE).is_ok());
    }

    #[test]
    fn test_hidden_bar_runs_suspended_output() {
        let progress = BatchProgress::hidden();
        progress.tick();
        progress.set_message("LOG-0001");

        let mut ran = false;
        progress.suspend(|| ran = true);
        assert!(ran);
        progress.finish();
    }
}
