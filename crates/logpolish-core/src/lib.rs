//! Core types for logpolish.
//!
//! Provides the log table model ([`table::LogTable`]) read from and written back to
//! CSV, provider configuration ([`config::PolishConfig`]), and credential sourcing
//! ([`config::Credentials`]).

pub mod config;
pub mod table;

pub use config::{Credentials, PolishConfig, ProviderKind};
pub use table::{LogRecord, LogTable, TableError};
