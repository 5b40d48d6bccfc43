//! Chat-completions request bodies

use serde_json::Value;

use super::config::AnalyzerConfig;

/// System prompt framing the model as a domain appraiser.
const SYSTEM_PROMPT: &str = "You are a professional domain name analyst and \
appraiser. Given a domain name, produce a detailed analysis covering:\n\
1. The domain's basic composition and type (generic, industry-specific, etc.)\n\
2. Its brand value, memorability, and market potential\n\
3. A rough valuation range under current market conditions\n\
4. Recommended use cases and industries\n\n\
Keep the analysis objective and professional, and support every judgement \
with concrete reasons.";

/// Build the request body for one analysis call.
///
/// The same body serves both transfer modes; only the `stream` flag differs.
pub fn analysis_body(domain: &str, config: &AnalyzerConfig, stream: bool) -> Value {
    serde_json::json!({
        "model": config.model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {
                "role": "user",
                "content": format!(
                    "Please analyze the value, suitable use cases, and \
                     recommended industries for this domain: {domain}"
                ),
            }
        ],
        "stream": stream,
        "max_tokens": config.max_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_carries_domain_and_mode() {
        let config = AnalyzerConfig::default();
        let body = analysis_body("shop123.ai", &config, true);

        assert_eq!(body["model"], "deepseek-reasoner");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 4000);
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("shop123.ai"));
    }
}
