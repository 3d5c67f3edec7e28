use crate::error::Result;
use crate::llm::provider::ProviderId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub provider: ProviderId,
    pub model: String,
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Sends a routed prompt to a provider.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    async fn send(&self, prompt: &str, provider: ProviderId) -> Result<ApiResponse>;
}
