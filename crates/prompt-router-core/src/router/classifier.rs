use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::llm::provider::ProviderId;

/// Programming languages, code vocabulary (Portuguese and English) and
/// syntax fragments.
static CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:python|rust|javascript|typescript|java|golang|kotlin|swift|ruby|php|sql|html|css|bash",
        r"|fun[çc][ãa]o|fun[çc][õo]es|function|functions|c[óo]digo|code|bugs?|debug|debugar",
        r"|class|classe|m[ée]todo|method|algoritmo|algorithm|programa[çc][ãa]o|programming",
        r"|refatorar|refatora[çc][ãa]o|refactor|script|api|compile|compilar|vari[áa]vel|variable",
        r"|regex|endpoint|stack trace)\b",
        r"|```|\bdef\s+\w+\s*\(|\bfn\s+\w+|=>|\w\(\)|\bc\+\+|\bc#",
    ))
    .expect("valid code regex")
});

static REASONING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:analise|an[áa]lise|analisar|analyze|analyse|analysis|compare|comparar|compara[çc][ãa]o|comparison",
        r"|pr[óo]s e contras|pros and cons|vantagens e desvantagens|advantages and disadvantages",
        r"|racioc[íi]nio|reasoning|avalie|avaliar|evaluate|trade-?offs?|argumente|argumenta[çc][ãa]o",
        r"|pensamento cr[íi]tico|critical thinking|justifique|justify|explique por que|explain why)\b",
    ))
    .expect("valid reasoning regex")
});

static CREATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:escreva|escrever|crie um texto|write an?|poema|poem|poesia|poetry|hist[óo]ria|story",
        r"|conto|roteiro|slogan|brainstorm|ideias criativas|creative|criativ[oa]|storytelling",
        r"|copywriting|marketing|narrativa|narrative|lyrics|letra de m[úu]sica)\b",
    ))
    .expect("valid creative regex")
});

/// What kind of request a prompt looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptCategory {
    Code,
    Reasoning,
    Creative,
    General,
}

impl PromptCategory {
    /// Categories in the order they are checked. First match wins.
    pub fn priority() -> &'static [PromptCategory] {
        &[
            PromptCategory::Code,
            PromptCategory::Reasoning,
            PromptCategory::Creative,
        ]
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            PromptCategory::Code => ProviderId::Cursor,
            PromptCategory::Reasoning => ProviderId::Claude,
            PromptCategory::Creative => ProviderId::OpenAI,
            PromptCategory::General => ProviderId::Universal,
        }
    }

    /// The category whose indicators point at `provider`.
    pub fn for_provider(provider: ProviderId) -> Self {
        match provider {
            ProviderId::Cursor => PromptCategory::Code,
            ProviderId::Claude => PromptCategory::Reasoning,
            ProviderId::OpenAI => PromptCategory::Creative,
            ProviderId::Universal => PromptCategory::General,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PromptCategory::Code => "code",
            PromptCategory::Reasoning => "reasoning",
            PromptCategory::Creative => "creative",
            PromptCategory::General => "general",
        }
    }

    fn pattern(&self) -> Option<&'static Regex> {
        match self {
            PromptCategory::Code => Some(&*CODE),
            PromptCategory::Reasoning => Some(&*REASONING),
            PromptCategory::Creative => Some(&*CREATIVE),
            PromptCategory::General => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: PromptCategory,
    pub provider: ProviderId,
    /// Indicator matches found for the winning category.
    pub hits: usize,
    /// The first indicator that matched, if any.
    pub matched: Option<String>,
}

/// Keyword classifier for `auto` routing.
///
/// Rules are checked in a fixed order (code, reasoning, creative) and the
/// first category with any match decides. No match routes to `universal`.
#[derive(Debug, Default, Clone)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, prompt: &str) -> Classification {
        for category in PromptCategory::priority() {
            let Some(pattern) = category.pattern() else {
                continue;
            };
            if let Some(first) = pattern.find(prompt) {
                let classification = Classification {
                    category: *category,
                    provider: category.provider(),
                    hits: pattern.find_iter(prompt).count(),
                    matched: Some(first.as_str().to_string()),
                };
                tracing::debug!(
                    "Classified as {} via '{}' ({} hits)",
                    category.name(),
                    first.as_str(),
                    classification.hits
                );
                return classification;
            }
        }

        tracing::debug!("No category matched, defaulting to universal");
        Classification {
            category: PromptCategory::General,
            provider: ProviderId::Universal,
            hits: 0,
            matched: None,
        }
    }

    /// How many indicators for `provider`'s category appear in `prompt`.
    pub fn indicator_hits(&self, provider: ProviderId, prompt: &str) -> usize {
        PromptCategory::for_provider(provider)
            .pattern()
            .map(|p| p.find_iter(prompt).count())
            .unwrap_or(0)
    }
}
