//! LLM-driven rewriting of collected log messages.
//!
//! Sends each log message from a [`logpolish_core::LogTable`] to a text-generation
//! provider and assembles a new table with the improved messages.
//!
//! # Architecture
//!
//! - **prompt**: Builds the rewrite instruction for one message
//! - **provider**: `LlmProvider` trait with Claude, Gemini, and Copilot implementations
//! - **improver**: Turns provider calls into "improved text or nothing"
//! - **batch**: Row-by-row driver with skip rules and interruption
//! - **usage**: Token accounting across a run
//! - **progress**: Terminal progress bar via `indicatif`

pub mod batch;
pub mod improver;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod usage;

pub use batch::{BatchConfig, BatchOutcome, RowOutcome, RunSummary, SkipReason, run_batch};
pub use improver::{ImproveRequest, Improver, LogImprover};
pub use prompt::build_prompt;
pub use provider::{LlmProvider, ProviderError, available_providers, create_provider};
pub use usage::UsageTracker;
