//! Row-by-row rewrite driver.
//!
//! Walks a [`LogTable`] in order, decides per row whether to skip it or ask
//! the [`Improver`], and assembles a new table with the accepted rewrites.
//! The input table is never modified.

use crate::improver::{ImproveRequest, Improver};
use crate::progress::BatchProgress;
use logpolish_core::{LogRecord, LogTable};
use std::sync::atomic::{AtomicBool, Ordering};

/// Options for a batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchConfig {
    /// Leave rows that already have a `NewMessage` alone.
    pub skip_existing: bool,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

/// Why a row was not sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ExistingMessage,
    EmptyTemplate,
}

/// What happened to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Improved(String),
    Skipped(SkipReason),
    Failed,
    /// The run was interrupted before reaching this row.
    NotVisited,
}

/// Counts for the end-of-run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub improved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub interrupted: bool,
}

impl RunSummary {
    fn from_outcomes(outcomes: &[RowOutcome], interrupted: bool) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            interrupted,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                RowOutcome::Improved(_) => summary.improved += 1,
                RowOutcome::Skipped(_) => summary.skipped += 1,
                RowOutcome::Failed => summary.failed += 1,
                RowOutcome::NotVisited => {}
            }
        }
        summary
    }

    /// Rows never reached because of an interruption.
    pub fn not_visited(&self) -> usize {
        self.total - self.improved - self.skipped - self.failed
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Total entries: {}", self.total)?;
        writeln!(f, "  Improved: {}", self.improved)?;
        writeln!(f, "  Skipped: {}", self.skipped)?;
        write!(f, "  Failed: {}", self.failed)?;
        if self.interrupted {
            write!(f, "\n  Not processed (interrupted): {}", self.not_visited())?;
        }
        Ok(())
    }
}

/// Result of [`run_batch`].
#[derive(Debug)]
pub struct BatchOutcome {
    /// Copy of the input with accepted rewrites applied.
    pub table: LogTable,
    pub summary: RunSummary,
    /// One entry per input row, in order.
    pub outcomes: Vec<RowOutcome>,
}

/// Decide whether a row goes to the provider at all.
fn skip_reason(record: &LogRecord<'_>, config: &BatchConfig) -> Option<SkipReason> {
    if config.skip_existing && !record.new_message.is_empty() {
        Some(SkipReason::ExistingMessage)
    } else if record.message_template.is_empty() {
        Some(SkipReason::EmptyTemplate)
    } else {
        None
    }
}

/// Rewrite every eligible row of `table`.
///
/// `interrupted` is checked before each row; once set, the remaining rows
/// are left as [`RowOutcome::NotVisited`] and the partial result is returned.
pub fn run_batch(
    table: &LogTable,
    improver: &mut dyn Improver,
    config: &BatchConfig,
    interrupted: &AtomicBool,
) -> BatchOutcome {
    let total = table.len();
    let progress = if config.show_progress {
        BatchProgress::new(total as u64)
    } else {
        BatchProgress::hidden()
    };

    let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(total);
    let mut was_interrupted = false;

    for record in table.records() {
        if interrupted.load(Ordering::SeqCst) {
            progress.suspend(|| println!("\nInterrupted by user. Saving partial results..."));
            was_interrupted = true;
            break;
        }

        let outcome = match skip_reason(&record, config) {
            Some(reason) => {
                progress.suspend(|| tracing::debug!(id = record.id, ?reason, "skipping row"));
                RowOutcome::Skipped(reason)
            }
            None => {
                progress.set_message(record.id);
                progress.suspend(|| {
                    println!("[{}/{}] {}", record.position + 1, total, record.id);
                    println!("  Original: {}", record.message_template);
                });

                match improver.improve(&ImproveRequest::from(&record)) {
                    Some(text) => {
                        progress.suspend(|| println!("  Improved: {text}"));
                        RowOutcome::Improved(text)
                    }
                    None => {
                        let reason = improver.take_failure();
                        progress.suspend(|| {
                            if let Some(reason) = &reason {
                                tracing::warn!("{}", reason);
                            }
                            println!("  Failed to improve");
                        });
                        RowOutcome::Failed
                    }
                }
            }
        };

        outcomes.push(outcome);
        progress.tick();
    }

    progress.finish();
    outcomes.resize(total, RowOutcome::NotVisited);

    let updated = table.with_new_messages(outcomes.iter().map(|outcome| match outcome {
        RowOutcome::Improved(text) => Some(text.as_str()),
        _ => None,
    }));

    BatchOutcome {
        table: updated,
        summary: RunSummary::from_outcomes(&outcomes, was_interrupted),
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logpolish_core::table::columns;
    use std::collections::VecDeque;

    /// Improver that replays scripted answers and optionally raises the
    /// interrupt flag after a number of calls.
    struct ScriptedImprover<'a> {
        answers: VecDeque<Option<String>>,
        seen: Vec<String>,
        interrupt_after: Option<(usize, &'a AtomicBool)>,
        failure: Option<String>,
        failures_taken: usize,
    }

    impl<'a> ScriptedImprover<'a> {
        fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(String::from)).collect(),
                seen: Vec::new(),
                interrupt_after: None,
                failure: None,
                failures_taken: 0,
            }
        }
    }

    impl Improver for ScriptedImprover<'_> {
        fn improve(&mut self, request: &ImproveRequest<'_>) -> Option<String> {
            self.seen.push(request.original.to_string());
            if let Some((n, flag)) = self.interrupt_after
                && self.seen.len() >= n
            {
                flag.store(true, Ordering::SeqCst);
            }
            let answer = self.answers.pop_front().flatten();
            if answer.is_none() {
                self.failure = Some(format!("no answer for {}", request.original));
            }
            answer
        }

        fn take_failure(&mut self) -> Option<String> {
            let failure = self.failure.take();
            if failure.is_some() {
                self.failures_taken += 1;
            }
            failure
        }
    }

    fn table(rows: &[(&str, &str, &str)]) -> LogTable {
        let headers = vec![
            columns::ID.to_string(),
            columns::MESSAGE_TEMPLATE.to_string(),
            columns::NEW_MESSAGE.to_string(),
        ];
        let rows = rows
            .iter()
            .map(|(id, template, new)| {
                vec![(*id).to_string(), (*template).to_string(), (*new).to_string()]
            })
            .collect();
        LogTable::from_parts(headers, rows).unwrap()
    }

    fn run(input: &LogTable, improver: &mut ScriptedImprover<'_>) -> BatchOutcome {
        run_batch(input, improver, &BatchConfig::default(), &AtomicBool::new(false))
    }

    fn new_messages(table: &LogTable) -> Vec<&str> {
        (0..table.len())
            .map(|i| table.cell(i, columns::NEW_MESSAGE).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_mixed_rows() {
        let input = table(&[
            ("1", "failed to open %s", ""),
            ("2", "", ""),
            ("3", "conn lost", "Connection lost"),
        ]);
        let mut improver = ScriptedImprover::new(&[
            Some("Failed to open file %s"),
            Some("Connection to peer lost"),
        ]);

        let out = run(&input, &mut improver);

        assert_eq!(
            out.outcomes,
            vec![
                RowOutcome::Improved("Failed to open file %s".to_string()),
                RowOutcome::Skipped(SkipReason::EmptyTemplate),
                RowOutcome::Improved("Connection to peer lost".to_string()),
            ]
        );
        assert_eq!(
            new_messages(&out.table),
            vec!["Failed to open file %s", "", "Connection to peer lost"]
        );
        assert_eq!(out.summary.improved, 2);
        assert_eq!(out.summary.skipped, 1);
        assert!(!out.summary.interrupted);
        // Input untouched
        assert_eq!(new_messages(&input), vec!["", "", "Connection lost"]);
    }

    #[test]
    fn test_skip_existing_leaves_row_alone() {
        let input = table(&[("1", "a", "kept"), ("2", "b", "")]);
        let mut improver = ScriptedImprover::new(&[Some("B")]);
        let config = BatchConfig {
            skip_existing: true,
            show_progress: false,
        };

        let out = run_batch(&input, &mut improver, &config, &AtomicBool::new(false));

        assert_eq!(improver.seen, vec!["b"]);
        assert_eq!(out.outcomes[0], RowOutcome::Skipped(SkipReason::ExistingMessage));
        assert_eq!(new_messages(&out.table), vec!["kept", "B"]);
    }

    #[test]
    fn test_empty_templates_never_reach_improver() {
        let input = table(&[("1", "", ""), ("2", "", "x")]);
        let mut improver = ScriptedImprover::new(&[]);

        let out = run(&input, &mut improver);

        assert!(improver.seen.is_empty());
        assert_eq!(out.summary.skipped, 2);
        assert_eq!(out.table, input);
    }

    #[test]
    fn test_failure_keeps_original_and_continues() {
        let input = table(&[("1", "a", "old"), ("2", "b", "")]);
        let mut improver = ScriptedImprover::new(&[None, Some("B")]);

        let out = run(&input, &mut improver);

        assert_eq!(out.outcomes[0], RowOutcome::Failed);
        assert_eq!(new_messages(&out.table), vec!["old", "B"]);
        // The failure reason is collected once, for the failed row only
        assert_eq!(improver.failures_taken, 1);
        assert_eq!(improver.failure, None);
        assert_eq!(out.summary.failed, 1);
        assert_eq!(out.summary.improved, 1);
    }

    #[test]
    fn test_interrupt_stops_after_current_row() {
        let input = table(&[
            ("1", "a", ""),
            ("2", "b", ""),
            ("3", "c", ""),
            ("4", "d", ""),
            ("5", "e", ""),
        ]);
        let flag = AtomicBool::new(false);
        let mut improver = ScriptedImprover::new(&[Some("A"), Some("B"), Some("C")]);
        improver.interrupt_after = Some((2, &flag));

        let out = run_batch(&input, &mut improver, &BatchConfig::default(), &flag);

        assert_eq!(improver.seen, vec!["a", "b"]);
        assert!(out.summary.interrupted);
        assert_eq!(out.summary.improved, 2);
        assert_eq!(out.summary.not_visited(), 3);
        assert_eq!(out.outcomes.len(), 5);
        assert_eq!(out.outcomes[2], RowOutcome::NotVisited);
        assert_eq!(new_messages(&out.table), vec!["A", "B", "", "", ""]);
        assert!(out.summary.to_string().contains("Not processed (interrupted): 3"));
    }

    #[test]
    fn test_flag_set_before_start_visits_nothing() {
        let input = table(&[("1", "a", "")]);
        let mut improver = ScriptedImprover::new(&[Some("A")]);

        let out = run_batch(&input, &mut improver, &BatchConfig::default(), &AtomicBool::new(true));

        assert!(improver.seen.is_empty());
        assert_eq!(out.outcomes, vec![RowOutcome::NotVisited]);
        assert_eq!(out.table, input);
    }

    #[test]
    fn test_counts_cover_every_row() {
        let input = table(&[
            ("1", "a", ""),
            ("2", "", ""),
            ("3", "c", "done"),
            ("4", "d", ""),
        ]);
        let mut improver = ScriptedImprover::new(&[Some("A"), None, Some("D")]);

        let out = run(&input, &mut improver);
        let s = out.summary;

        assert_eq!(s.total, 4);
        assert_eq!(s.improved + s.skipped + s.failed, s.total);
        assert_eq!(s.not_visited(), 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            total: 3,
            improved: 1,
            skipped: 1,
            failed: 1,
            interrupted: false,
        };
        assert_eq!(
            summary.to_string(),
            "Summary:\n  Total entries: 3\n  Improved: 1\n  Skipped: 1\n  Failed: 1"
        );
    }
}
