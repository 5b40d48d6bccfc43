//! domeval-core: streaming domain analysis over the DeepSeek chat API.
//!
//! The interesting part lives in [`ai`]: an SSE read loop that rebuilds the
//! model's two-phase output (reasoning narrative, then final answer) from
//! incremental deltas, coalesces fragments for smooth rendering, and degrades
//! to a local heuristic appraisal when the API is unreachable.

pub mod ai;

pub use ai::client::DomainAnalyzer;
pub use ai::config::AnalyzerConfig;
pub use ai::transport::{HttpTransport, Transport};
pub use ai::types::{AnalysisOutcome, AnalysisResult, Snapshot};
