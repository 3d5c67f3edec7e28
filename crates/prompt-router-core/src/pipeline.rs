use crate::cache::PromptCache;
use crate::config::Settings;
use crate::error::Result;
use crate::llm::provider::ProviderRegistry;
use crate::optimizer::PromptOptimizer;
use crate::router::{LlmRouter, RouteTarget, RoutingResult};
use crate::templates::TemplateStore;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Apply the provider-specific rewrite before routing.
    pub optimize: bool,
    /// Text for the template's context slot.
    pub context: Option<String>,
}

/// Optimize-then-route flow used by the command line.
pub struct PromptPipeline {
    optimizer: PromptOptimizer,
    router: LlmRouter,
    cache: Option<PromptCache>,
}

impl PromptPipeline {
    pub fn new(optimizer: PromptOptimizer, router: LlmRouter) -> Self {
        Self {
            optimizer,
            router,
            cache: None,
        }
    }

    /// Wire up the pipeline from settings and the process environment.
    /// The cache file is opened when `settings.cache.enabled` is set.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let registry = ProviderRegistry::from_env(settings)?;
        let templates = TemplateStore::load(settings.templates_dir.as_deref())?;
        let pipeline = Self::new(PromptOptimizer::new(), LlmRouter::new(registry, templates));
        Ok(if settings.cache.enabled {
            pipeline.with_cache(PromptCache::open(&settings.cache))
        } else {
            pipeline
        })
    }

    pub fn with_cache(mut self, cache: PromptCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&PromptCache> {
        self.cache.as_ref()
    }

    pub fn optimizer(&self) -> &PromptOptimizer {
        &self.optimizer
    }

    pub fn router(&self) -> &LlmRouter {
        &self.router
    }

    /// Route one prompt, answering from the cache when one is attached.
    pub fn run(
        &self,
        raw: &str,
        target: RouteTarget,
        options: &PipelineOptions,
    ) -> Result<RoutingResult> {
        let Some(ref cache) = self.cache else {
            return self.route_fresh(raw, target, options);
        };

        let key = PromptCache::key(raw, target, options);
        if let Some(hit) = cache.get(&key) {
            return Ok(hit);
        }
        let result = self.route_fresh(raw, target, options)?;
        cache.insert(key, result.clone());
        Ok(result)
    }

    /// Classification (for `auto`) always looks at the raw text, so markup
    /// added by the optimizer cannot change which provider is picked.
    fn route_fresh(
        &self,
        raw: &str,
        target: RouteTarget,
        options: &PipelineOptions,
    ) -> Result<RoutingResult> {
        if target.is_auto() {
            tracing::debug!("Classifying prompt for automatic routing");
        }
        let selection = self.router.select(raw, target);

        let body = if options.optimize {
            self.optimizer.optimize(raw, selection.provider)?
        } else {
            raw.to_string()
        };

        self.router
            .route_selected(&body, raw, selection, options.context.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ProviderId;
    use crate::optimizer::{INSTRUCTIONS_OPEN, THINKING_OPEN};
    use crate::router::SelectionMode;

    fn pipeline() -> PromptPipeline {
        let registry = ProviderRegistry::load(&Settings::default(), |k| {
            (k == "ANTHROPIC_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        PromptPipeline::new(
            PromptOptimizer::new(),
            LlmRouter::new(registry, TemplateStore::builtin().unwrap()),
        )
    }

    #[test]
    fn test_run_without_optimization_keeps_prompt() {
        let result = pipeline()
            .run(
                "Explain ownership",
                RouteTarget::Provider(ProviderId::OpenAI),
                &PipelineOptions::default(),
            )
            .unwrap();
        assert_eq!(result.target_provider, ProviderId::OpenAI);
        assert!(result.optimized_prompt.contains("Explain ownership"));
        assert!(!result.optimized_prompt.contains("System:"));
    }

    #[test]
    fn test_run_with_optimization_applies_rewrite() {
        let options = PipelineOptions {
            optimize: true,
            context: None,
        };
        let result = pipeline()
            .run(
                "Analise os prós e contras da IA",
                RouteTarget::Auto,
                &options,
            )
            .unwrap();
        assert_eq!(result.target_provider, ProviderId::Claude);
        assert_eq!(result.metadata.selection, SelectionMode::Auto);
        assert!(result.optimized_prompt.contains(INSTRUCTIONS_OPEN));
        assert!(result.optimized_prompt.contains(THINKING_OPEN));
    }

    #[test]
    fn test_metadata_reflects_raw_prompt() {
        let options = PipelineOptions {
            optimize: true,
            context: Some("Be brief.".to_string()),
        };
        let raw = "Tell me about tea";
        let result = pipeline()
            .run(raw, RouteTarget::Provider(ProviderId::Claude), &options)
            .unwrap();
        assert_eq!(result.metadata.word_count, 4);
        assert_eq!(result.metadata.char_count, raw.chars().count());
        assert!(result.optimized_prompt.starts_with("Be brief."));
    }

    #[test]
    fn test_cache_answers_repeated_prompt() {
        let pipeline = pipeline().with_cache(PromptCache::in_memory(24, 10));
        let options = PipelineOptions::default();
        let target = RouteTarget::Provider(ProviderId::OpenAI);

        let first = pipeline.run("Explain ownership", target, &options).unwrap();
        let second = pipeline.run("Explain ownership", target, &options).unwrap();
        assert_eq!(first.metadata.timestamp, second.metadata.timestamp);

        let stats = pipeline.cache().unwrap().stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.session_hits, 1);
        assert_eq!(stats.session_misses, 1);
    }

    #[test]
    fn test_empty_prompt_is_error() {
        let options = PipelineOptions {
            optimize: true,
            context: None,
        };
        assert!(pipeline().run("   ", RouteTarget::Auto, &options).is_err());
    }
}
