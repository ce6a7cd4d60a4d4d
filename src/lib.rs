//! Dialpad contact matching: a SQLite-backed prefix index over contact
//! names and numbers, with per-query validation and ranked results.

pub mod charmap;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod logging;
pub mod matching;
pub mod metrics;
pub mod models;

pub use config::{AppConfig, DatabaseConfig, IndexerConfig, MatcherConfig, ScriptFamily};
pub use index::source::{ContactSource, JsonContactSource};
pub use index::{MatchIndex, SyncSummary};
pub use models::{Contact, LookupHit, MatchPosition};
