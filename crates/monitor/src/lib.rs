//! Poll → detect → summarize → report core for chain-file monitoring.
//!
//! Everything here is synchronous and recomputed from disk on every pass.
//! Chat delivery and user lookup are reached only through the
//! [`Notifier`] and [`UserDirectory`] traits.

pub mod discovery;
pub mod error;
pub mod freshness;
pub mod notify;
pub mod pass;
pub mod report;
pub mod runner;
pub mod summary;

pub use discovery::{RECOGNIZED_CHAIN_FILES, find_chain_files};
pub use error::{ChainError, LookupError};
pub use freshness::{is_fresh, is_fresh_at};
pub use notify::{Notifier, UserDirectory};
pub use pass::{Dispatch, Settings, WatchedUser, collect_entries, hours_to_duration, plan_pass, run_pass};
pub use report::{ChainEntry, ChainStatus, format_report, pack_lines};
pub use runner::{RunMode, resolve_users, run};
pub use summary::{ChainSummary, parse_chain, summarize_chain};
