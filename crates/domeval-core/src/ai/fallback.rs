//! Offline fallback appraiser
//!
//! A pure, deterministic substitute used when the DeepSeek API cannot be
//! reached. No I/O, no randomness: the same domain always yields the same
//! text, which keeps the degraded path trivially testable.

/// Fixed notice placed in the reasoning buffer on the degraded path.
pub const FALLBACK_NOTICE: &str =
    "Could not reach the DeepSeek API; showing a local analysis instead.";

/// Heuristic local appraisal of a domain name.
pub fn fallback_analysis(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    let extension = if parts.len() > 1 {
        parts.last().copied().unwrap_or("")
    } else {
        ""
    };

    // Base name without the TLD
    let base = if parts.len() > 1 {
        parts[..parts.len() - 1].join(".")
    } else {
        domain.to_string()
    };

    let category = if base.contains("shop") || base.contains("store") {
        "e-commerce"
    } else if base.contains("tech") || base.contains("code") {
        "technology"
    } else if base.contains("blog") {
        "blogging"
    } else {
        "general-purpose"
    };

    let length_description = if base.len() < 6 {
        "short and punchy"
    } else if base.len() < 12 {
        "moderate length"
    } else {
        "on the long side"
    };

    let has_digits = base.chars().any(|c| c.is_ascii_digit());
    let digit_description = if has_digits {
        "contains digits, which can hurt memorability"
    } else {
        "digit-free and easy to remember"
    };

    let brandability = if base.len() < 8 && !has_digits {
        "high"
    } else if base.len() < 12 {
        "average"
    } else {
        "low"
    };

    let tld_value = match extension.to_ascii_lowercase().as_str() {
        "" => String::new(),
        "ai" => "The .ai TLD carries special weight in the AI and technology \
                 space and adds real industry value."
            .to_string(),
        "com" => "The .com TLD has the highest commercial value and recognition."
            .to_string(),
        "org" | "net" | "io" => {
            format!("The .{extension} TLD projects a solid professional image.")
        }
        other => format!(
            "The .{other} TLD is niche and may only matter in specific fields."
        ),
    };

    let suggested_use = match category {
        "e-commerce" => "an online storefront",
        "technology" => "a technology blog or product",
        "blogging" => "a content platform",
        _ => "a multi-purpose website",
    };

    let mut lines = vec![
        "Domain analysis (local):".to_string(),
        format!("- Full domain: {domain}"),
        format!("- Category: {category}"),
        format!("- Length: {length_description} ({} characters)", base.len()),
        format!("- {digit_description}"),
        format!("- Brandability: {brandability}"),
    ];
    if !tld_value.is_empty() {
        lines.push(format!("- {tld_value}"));
    }
    lines.push(format!("- Suggested use: {suggested_use}"));
    lines.push(String::new());
    lines.push(
        "Note: local heuristic result, shown because the DeepSeek API was \
         unreachable."
            .to_string(),
    );

    lines.join("\n")
}
