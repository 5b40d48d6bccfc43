//! Analysis client: streaming engine plus the non-streaming degenerate path.

mod core;
mod simple;

pub use self::core::DomainAnalyzer;
pub use crate::ai::session::SnapshotSink;
