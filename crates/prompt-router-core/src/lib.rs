pub mod analyzer;
pub mod batch;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod llm;
pub mod optimizer;
pub mod pipeline;
pub mod router;
pub mod templates;

// Re-export key types
pub use analyzer::{PromptAnalysis, PromptAnalyzer, PromptComparison, Winner};
pub use batch::{BatchItem, BatchOptions, BatchProcessor, BatchReport, BatchResult};
pub use cache::{CacheStats, PromptCache};
pub use config::Settings;
pub use error::RouterError;
pub use history::{HistoryEntry, PromptHistory};
pub use llm::{ApiClient, PlaceholderClient, ProviderConfig, ProviderId, ProviderRegistry};
pub use optimizer::{OptimizationStats, PromptOptimizer};
pub use pipeline::{PipelineOptions, PromptPipeline};
pub use router::{LlmRouter, RouteTarget, RoutingMetadata, RoutingResult};
pub use templates::TemplateStore;
