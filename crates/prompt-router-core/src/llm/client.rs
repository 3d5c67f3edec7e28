use crate::constants::pricing;
use crate::error::{Result, RouterError};
use crate::llm::provider::ProviderId;
use crate::llm::traits::{ApiClient, ApiResponse};
use serde::Serialize;

/// Stand-in client: direct sending to providers is not available yet.
#[derive(Debug, Default, Clone)]
pub struct PlaceholderClient;

impl PlaceholderClient {
    pub fn new() -> Self {
        tracing::info!("API client initialised in placeholder mode");
        Self
    }
}

#[async_trait::async_trait]
impl ApiClient for PlaceholderClient {
    async fn send(&self, prompt: &str, provider: ProviderId) -> Result<ApiResponse> {
        tracing::warn!(
            "Direct send to {} requested ({} chars); not available",
            provider,
            prompt.len()
        );
        Err(RouterError::NotImplemented(format!(
            "sending directly to {} is not available yet; copy the routed prompt manually",
            provider
        )))
    }
}

/// Rough cost of sending a prompt, based on a word-count token estimate.
#[derive(Debug, Clone, Serialize)]
pub struct CostEstimate {
    pub provider: ProviderId,
    pub estimated_tokens: usize,
    pub estimated_cost_usd: f64,
    pub currency: &'static str,
    pub note: &'static str,
}

pub fn estimate_cost(prompt: &str, provider: ProviderId) -> CostEstimate {
    let tokens = prompt.split_whitespace().count();
    let per_1k = match provider {
        ProviderId::Claude => pricing::CLAUDE_PER_1K,
        ProviderId::OpenAI => pricing::OPENAI_PER_1K,
        ProviderId::Cursor => pricing::CURSOR_PER_1K,
        ProviderId::Universal => pricing::UNIVERSAL_PER_1K,
    };

    CostEstimate {
        provider,
        estimated_tokens: tokens,
        estimated_cost_usd: (tokens as f64 / 1000.0) * per_1k,
        currency: "USD",
        note: "Rough estimate; real costs depend on the provider's tokenizer and pricing.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_is_not_implemented() {
        let client = PlaceholderClient::new();
        for provider in ProviderId::all() {
            let err = client.send("hello", *provider).await.unwrap_err();
            assert!(matches!(err, RouterError::NotImplemented(_)));
        }
    }

    #[test]
    fn test_estimate_cost() {
        let prompt = "one two three four";
        let claude = estimate_cost(prompt, ProviderId::Claude);
        assert_eq!(claude.estimated_tokens, 4);
        assert!((claude.estimated_cost_usd - 0.00006).abs() < 1e-12);

        let cursor = estimate_cost(prompt, ProviderId::Cursor);
        assert_eq!(cursor.estimated_cost_usd, 0.0);
    }
}
