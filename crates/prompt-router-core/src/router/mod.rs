mod analysis;
mod classifier;
mod clock;

pub use analysis::{complexity_score, detect_language, has_code, Complexity, LanguageTag};
pub use classifier::{Classification, Classifier, PromptCategory};
pub use clock::{Clock, FixedClock, SystemClock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, RouterError};
use crate::llm::provider::{ProviderConfig, ProviderId, ProviderRegistry};
use crate::templates::TemplateStore;

/// Requested routing target: a fixed provider or content-based selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteTarget {
    Auto,
    #[serde(untagged)]
    Provider(ProviderId),
}

impl RouteTarget {
    pub fn is_auto(&self) -> bool {
        matches!(self, RouteTarget::Auto)
    }
}

impl FromStr for RouteTarget {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(RouteTarget::Auto)
        } else {
            s.parse().map(RouteTarget::Provider)
        }
    }
}

impl From<ProviderId> for RouteTarget {
    fn from(id: ProviderId) -> Self {
        RouteTarget::Provider(id)
    }
}

impl std::fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteTarget::Auto => f.write_str("auto"),
            RouteTarget::Provider(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// The caller named the provider.
    Explicit,
    /// The classifier picked the provider from the prompt text.
    Auto,
}

/// The provider picked for a prompt and how it was picked.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSelection {
    pub provider: ProviderId,
    pub mode: SelectionMode,
    /// Set only when the classifier ran.
    pub category: Option<PromptCategory>,
    pub indicator_hits: usize,
}

impl ProviderSelection {
    /// 0.5 when no category applies, otherwise 0.3 / 0.7 / 0.9 for
    /// none / a few / many indicator hits.
    pub fn confidence(&self) -> f64 {
        if self.provider == ProviderId::Universal {
            return 0.5;
        }
        match self.indicator_hits {
            0 => 0.3,
            1..=2 => 0.7,
            _ => 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingMetadata {
    pub complexity: Complexity,
    pub complexity_score: f64,
    pub detected_language: Option<LanguageTag>,
    pub selection: SelectionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<PromptCategory>,
    pub provider_available: bool,
    pub confidence: f64,
    pub word_count: usize,
    pub char_count: usize,
    pub has_code: bool,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a routing call. Built fresh for every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    /// The prompt merged into the provider's template.
    pub optimized_prompt: String,
    pub target_provider: ProviderId,
    pub template_used: String,
    pub metadata: RoutingMetadata,
}

/// Chooses a provider for a prompt and merges it into that provider's
/// template.
pub struct LlmRouter {
    registry: ProviderRegistry,
    templates: TemplateStore,
    classifier: Classifier,
    clock: Box<dyn Clock>,
}

impl LlmRouter {
    pub fn new(registry: ProviderRegistry, templates: TemplateStore) -> Self {
        tracing::info!(
            "LlmRouter initialised with templates: {}",
            templates.names().join(", ")
        );
        Self {
            registry,
            templates,
            classifier: Classifier::new(),
            clock: Box::new(SystemClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn available_templates(&self) -> Vec<&str> {
        self.templates.names()
    }

    pub fn route(&self, prompt: &str, target: RouteTarget) -> Result<RoutingResult> {
        self.route_with_context(prompt, target, None)
    }

    pub fn route_with_context(
        &self,
        prompt: &str,
        target: RouteTarget,
        context: Option<&str>,
    ) -> Result<RoutingResult> {
        let selection = self.select(prompt, target);
        self.route_selected(prompt, prompt, selection, context)
    }

    /// Resolve `target` to a provider. Explicit targets skip classification.
    pub fn select(&self, prompt: &str, target: RouteTarget) -> ProviderSelection {
        match target {
            RouteTarget::Provider(provider) => ProviderSelection {
                provider,
                mode: SelectionMode::Explicit,
                category: None,
                indicator_hits: self.classifier.indicator_hits(provider, prompt),
            },
            RouteTarget::Auto => {
                let classification = self.classifier.classify(prompt);
                tracing::info!(
                    "Auto-selected {} ({} prompt)",
                    classification.provider,
                    classification.category.name()
                );
                ProviderSelection {
                    provider: classification.provider,
                    mode: SelectionMode::Auto,
                    category: Some(classification.category),
                    indicator_hits: classification.hits,
                }
            }
        }
    }

    /// Merge `body` into the selected provider's template. Metadata is
    /// computed from `analyzed`, which callers set to the pre-optimization
    /// text when they have it.
    pub(crate) fn route_selected(
        &self,
        body: &str,
        analyzed: &str,
        selection: ProviderSelection,
        context: Option<&str>,
    ) -> Result<RoutingResult> {
        let body = body.trim();
        if body.is_empty() {
            return Err(RouterError::EmptyPrompt);
        }

        let provider = selection.provider;
        let available = self.registry.is_available(provider);
        if !available {
            tracing::warn!(
                "Routing to {} although {} is not set",
                provider,
                self.registry.get(provider).api_key_env
            );
        }

        let template = self.templates.get(provider);
        let formatted = template.render(body, context).trim_end().to_string();

        let score = complexity_score(analyzed);
        let metadata = RoutingMetadata {
            complexity: Complexity::from_score(score),
            complexity_score: score,
            detected_language: detect_language(analyzed),
            selection: selection.mode,
            category: selection.category,
            provider_available: available,
            confidence: selection.confidence(),
            word_count: analyzed.split_whitespace().count(),
            char_count: analyzed.chars().count(),
            has_code: has_code(analyzed),
            timestamp: self.clock.now(),
        };

        tracing::info!(
            "Routed to {} using {} ({} chars)",
            provider,
            template.name(),
            formatted.len()
        );

        Ok(RoutingResult {
            optimized_prompt: formatted,
            target_provider: provider,
            template_used: template.name().to_string(),
            metadata,
        })
    }

    /// Fails with `NoProviderAvailable` unless `provider` has credentials.
    /// Used before anything that would talk to the provider.
    pub fn require_available(&self, provider: ProviderId) -> Result<&ProviderConfig> {
        self.registry.require_available(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn router_with_keys(keys: &[&str]) -> LlmRouter {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let registry = ProviderRegistry::load(&Settings::default(), |k| {
            keys.iter().any(|key| key == k).then(|| "test-key".to_string())
        })
        .unwrap();
        LlmRouter::new(registry, TemplateStore::builtin().unwrap())
    }

    #[test]
    fn test_route_target_parsing() {
        assert_eq!("auto".parse::<RouteTarget>().unwrap(), RouteTarget::Auto);
        assert_eq!("AUTO".parse::<RouteTarget>().unwrap(), RouteTarget::Auto);
        assert_eq!(
            "cursor".parse::<RouteTarget>().unwrap(),
            RouteTarget::Provider(ProviderId::Cursor)
        );
        assert!("bard".parse::<RouteTarget>().is_err());
        assert_eq!(RouteTarget::Auto.to_string(), "auto");
    }

    #[test]
    fn test_confidence_levels() {
        let mut selection = ProviderSelection {
            provider: ProviderId::Claude,
            mode: SelectionMode::Explicit,
            category: None,
            indicator_hits: 0,
        };
        assert_eq!(selection.confidence(), 0.3);
        selection.indicator_hits = 2;
        assert_eq!(selection.confidence(), 0.7);
        selection.indicator_hits = 5;
        assert_eq!(selection.confidence(), 0.9);
        selection.provider = ProviderId::Universal;
        assert_eq!(selection.confidence(), 0.5);
    }

    #[test]
    fn test_unavailable_provider_is_flagged_not_fatal() {
        let router = router_with_keys(&["OPENAI_API_KEY"]);
        let result = router
            .route("Tell me about tea", RouteTarget::Provider(ProviderId::Claude))
            .unwrap();
        assert_eq!(result.target_provider, ProviderId::Claude);
        assert!(!result.metadata.provider_available);
        assert!(router.require_available(ProviderId::Claude).is_err());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let router = router_with_keys(&["OPENAI_API_KEY"]);
        let err = router.route("  \n ", RouteTarget::Auto).unwrap_err();
        assert!(matches!(err, RouterError::EmptyPrompt));
    }

    #[test]
    fn test_context_fills_template_slot() {
        let router = router_with_keys(&["ANTHROPIC_API_KEY"]);
        let result = router
            .route_with_context(
                "Summarize the report",
                RouteTarget::Provider(ProviderId::Universal),
                Some("You are a financial analyst."),
            )
            .unwrap();
        assert!(result
            .optimized_prompt
            .starts_with("You are a financial analyst.\n**Prompt:**\nSummarize the report"));
    }
}
