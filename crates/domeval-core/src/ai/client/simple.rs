//! Non-streaming (request/response) mode
//!
//! When no snapshot callback is supplied there is nothing to render
//! incrementally, so the whole pipeline is skipped: one round trip, and the
//! final message's fields are read straight into the result. No phase
//! classification, no coalescing.

use anyhow::{anyhow, Result};
use serde_json::Value;

use super::core::DomainAnalyzer;
use crate::ai::request;
use crate::ai::transport::Transport;
use crate::ai::types::AnalysisResult;

impl<T: Transport> DomainAnalyzer<T> {
    pub(super) async fn run_simple(&self, domain: &str) -> Result<AnalysisResult> {
        let body = request::analysis_body(domain, self.config(), false);
        let json = self.transport().complete(&body).await?;

        let message = json
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| anyhow!("response carries no message object"))?;

        let field = |key: &str| {
            message
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };

        Ok(AnalysisResult {
            reasoning_content: field("reasoning_content"),
            final_content: field("content"),
        })
    }
}
