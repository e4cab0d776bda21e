//! Token accounting reported once per terminal result.

use serde::{Deserialize, Serialize};

/// Usage snapshot derived from a conversation's terminal result message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_omitted_when_absent() {
        let usage = TokenUsage {
            input_tokens: 10,
            output_tokens: 20,
            cache_read_input_tokens: 0,
            cache_creation_input_tokens: 5,
            cost_usd: None,
        };
        let json = serde_json::to_string(&usage).unwrap();
        assert!(!json.contains("cost_usd"));

        let parsed: TokenUsage =
            serde_json::from_str(r#"{"input_tokens":1,"output_tokens":2}"#).unwrap();
        assert_eq!(parsed.cache_read_input_tokens, 0);
        assert_eq!(parsed.cost_usd, None);
    }
}
