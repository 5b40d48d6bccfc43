//! Analyzer configuration

use std::time::Duration;

/// DeepSeek chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/chat/completions";

/// The reasoning model whose two-phase output this crate reconstructs.
pub const DEFAULT_MODEL: &str = "deepseek-reasoner";

/// Tunables for one analyzer instance.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Minimum spacing between consumer snapshots. Fragments arriving faster
    /// than this are coalesced into one update.
    pub flush_interval: Duration,
    /// Treat an empty delta as a reasoning-phase-over hint. The upstream
    /// protocol gives no explicit marker; this heuristic can misfire if the
    /// service ever emits empty deltas mid-reasoning, hence the toggle.
    pub empty_delta_ends_reasoning: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4000,
            flush_interval: Duration::from_millis(50),
            empty_delta_ends_reasoning: true,
        }
    }
}
