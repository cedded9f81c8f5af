// Helpers for logging request and response data

use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::Value;

/// Maximum number of characters kept per string value in logged payloads
pub const LOG_TRUNCATE_CHARS: usize = 255;

/// Truncate a string to `max_chars` characters, ending with "..." when cut
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out.chars().take(max_chars).collect()
}

/// Return a copy of `value` with every string truncated to `max_chars`.
/// Keys, nesting and non-string values are preserved.
pub fn truncate_json(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_chars(s, max_chars)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| truncate_json(item, max_chars))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_json(v, max_chars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Mask a credential, keeping the scheme and a short prefix
pub fn mask_credential(value: &str) -> String {
    match value.split_once(' ') {
        Some((scheme, secret)) => {
            let prefix: String = secret.chars().take(6).collect();
            format!("{} {}...", scheme, prefix)
        }
        None => "***".to_string(),
    }
}

/// Render headers for logs with the Authorization value masked
pub fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let text = value.to_str().unwrap_or("<binary>");
            let text = if *name == AUTHORIZATION {
                mask_credential(text)
            } else {
                text.to_string()
            };
            (name.as_str().to_string(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reqwest::header::{HeaderValue, USER_AGENT};
    use serde_json::json;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate_chars("abcdefghijk", 10), "abcdefg...");
        assert_eq!(truncate_chars("abcdef", 2), "..");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        // Cuts on character boundaries
        assert_eq!(truncate_chars("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_truncate_json_nested() {
        let long = "x".repeat(20);
        let value = json!({
            "Tag": long,
            "Amount": 1000,
            "Owners": ["a", long],
            "Address": {"City": long, "Valid": true}
        });

        let truncated = truncate_json(&value, 8);

        assert_eq!(truncated["Tag"], "xxxxx...");
        assert_eq!(truncated["Amount"], 1000);
        assert_eq!(truncated["Owners"][0], "a");
        assert_eq!(truncated["Owners"][1], "xxxxx...");
        assert_eq!(truncated["Address"]["City"], "xxxxx...");
        assert_eq!(truncated["Address"]["Valid"], true);

        // Source is untouched
        assert_eq!(value["Tag"].as_str().unwrap().len(), 20);
    }

    #[test]
    fn test_mask_credential() {
        assert_eq!(mask_credential("Bearer abcdefghijkl"), "Bearer abcdef...");
        assert_eq!(mask_credential("Basic Y2xpZW50OnNlY3JldA=="), "Basic Y2xpZW...");
        assert_eq!(mask_credential("opaque"), "***");
    }

    #[test]
    fn test_redact_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer 0123456789"));
        headers.insert(USER_AGENT, HeaderValue::from_static("MangoPay V2 Rust/0.1.0"));

        let redacted = redact_headers(&headers);

        assert!(redacted.contains(&("authorization".to_string(), "Bearer 012345...".to_string())));
        assert!(redacted.contains(&("user-agent".to_string(), "MangoPay V2 Rust/0.1.0".to_string())));
    }

    proptest! {
        #[test]
        fn prop_truncated_strings_fit(s in ".{0,64}", max in 3usize..40) {
            let value = json!({"Description": s.clone(), "Nested": [s.clone()]});
            let truncated = truncate_json(&value, max);

            let top = truncated["Description"].as_str().unwrap();
            let nested = truncated["Nested"][0].as_str().unwrap();
            prop_assert!(top.chars().count() <= max);
            prop_assert_eq!(top, nested);
            if s.chars().count() <= max {
                prop_assert_eq!(top, s.as_str());
            }
            prop_assert_eq!(value["Description"].as_str().unwrap(), s.as_str());
        }
    }
}
