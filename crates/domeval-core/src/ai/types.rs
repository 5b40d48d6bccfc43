//! Shared types for the streaming analysis pipeline

use serde::Serialize;

/// Which narrative stage the session currently occupies.
///
/// Monotonically non-decreasing: once a session leaves `Reasoning` it never
/// returns, and once `Done` no further mutation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Reasoning,
    Answering,
    Done,
}

/// Which of the two growing buffers a fragment is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Reasoning,
    Answer,
}

/// One event unit parsed from the SSE stream. Ephemeral: consumed by the
/// classifier and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete, non-incremental message. Overrides accumulated content.
    Terminal {
        content: Option<String>,
        reasoning_content: Option<String>,
    },

    /// An incremental payload. Any subset of fields may be present; a field
    /// that arrived as JSON null is normalized to `Some("")` (present but
    /// empty), distinct from an absent field (`None`).
    Delta {
        reasoning_fragment: Option<String>,
        answer_fragment: Option<String>,
        finish_signal: Option<String>,
    },

    /// The `[DONE]` end-of-transmission marker.
    Sentinel,

    /// A line that failed to parse. Carries no semantic content; logged and
    /// skipped.
    Malformed { raw_line: String },
}

/// Point-in-time view of both accumulated buffers, delivered to the consumer
/// on each flush. Content is always the full accumulation, never a fragment.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub reasoning_content: String,
    pub final_content: String,
    pub is_reasoning_phase: bool,
}

/// The consolidated result returned when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub reasoning_content: String,
    pub final_content: String,
}

/// Outcome of an analysis call.
///
/// `analyze` never returns an error: either the remote path produced the
/// result (`Streamed`, covering both transfer modes) or the transport failed
/// and the local fallback appraisal was substituted (`Degraded`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Streamed(AnalysisResult),
    Degraded(AnalysisResult),
}

impl AnalysisOutcome {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            AnalysisOutcome::Streamed(r) | AnalysisOutcome::Degraded(r) => r,
        }
    }

    pub fn into_result(self) -> AnalysisResult {
        match self {
            AnalysisOutcome::Streamed(r) | AnalysisOutcome::Degraded(r) => r,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These types cross the process boundary in the CLI's --json mode;
    // pin the wire shape down
    #[test]
    fn test_outcome_serializes_with_provenance_tag() {
        let outcome = AnalysisOutcome::Degraded(AnalysisResult {
            reasoning_content: "offline".to_string(),
            final_content: "local result".to_string(),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "degraded");
        assert_eq!(json["reasoning_content"], "offline");
        assert_eq!(json["final_content"], "local result");
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let snapshot = Snapshot {
            reasoning_content: "thinking".to_string(),
            final_content: String::new(),
            is_reasoning_phase: true,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["reasoning_content"], "thinking");
        assert_eq!(json["is_reasoning_phase"], true);
    }
}
