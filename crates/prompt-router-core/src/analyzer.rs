use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::llm::provider::ProviderId;
use crate::optimizer::INSTRUCTIONS_OPEN;
use crate::router::{complexity_score, detect_language, LanguageTag};

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));
static XML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\w+>").expect("valid tag regex"));
static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s").expect("valid heading regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*•]\s").expect("valid bullet regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s").expect("valid numbered regex"));
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid number regex"));

static QUESTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\?",
        r"\b(?:como|quando|onde|por que|o que|qual|quais|how|when|where|why|what|which)\b",
        r"(?:é possível|você pode|consegue|can you|could you|is it possible)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid question regex"))
    .collect()
});

static INSTRUCTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?:crie|faça|desenvolva|implemente|escreva|analise|explique|descreva|create|write|build|implement|analyze|explain|describe)\b",
        r"(?:por favor|preciso|gostaria|poderia|please|i need|i would like)",
        r"(?:passo a passo|detalhado|específico|claro|step by step|detailed|specific|clear)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid instruction regex"))
    .collect()
});

const TECHNICAL_TERMS: &[&str] = &[
    "função", "código", "algoritmo", "variável", "classe", "método", "debug", "api",
    "function", "code", "algorithm", "variable", "class", "method", "machine learning",
    "inteligência artificial", "modelo", "model", "dados", "data", "estratégia", "strategy",
    "roi", "kpi", "análise", "analysis", "mercado", "market", "pesquisa", "research",
    "hipótese", "hypothesis",
];
const POSITIVE_WORDS: &[&str] = &[
    "bom", "ótimo", "excelente", "melhor", "good", "great", "excellent", "best",
];
const NEGATIVE_WORDS: &[&str] = &[
    "ruim", "péssimo", "pior", "erro", "bad", "terrible", "worst", "error",
];
const CLARITY_WORDS: &[&str] = &[
    "claro", "específico", "detalhado", "preciso", "clear", "specific", "detailed", "precise",
];
const SPECIFIC_WORDS: &[&str] = &[
    "específico", "detalhado", "exato", "preciso", "specific", "detailed", "exact",
];
const COMPLETENESS_WORDS: &[&str] = &[
    "completo", "abrangente", "todos", "incluir", "complete", "comprehensive", "all", "include",
];
const CODE_TERMS: &[&str] = &["código", "função", "programação", "code", "function"];
const BUILD_VERBS: &[&str] = &[
    "criar", "desenvolver", "implementar", "create", "develop", "implement",
];
const COURTESY: &[&str] = &["por favor", "preciso", "gostaria", "please", "i need", "i would like"];
const HOW_WORDS: &[&str] = &["como", "how"];

/// How a prompt is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureType {
    Xml,
    Markdown,
    List,
    Plain,
}

/// Metrics computed for one prompt. Scores are rounded to three decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAnalysis {
    pub prompt: String,
    pub target: ProviderId,
    pub timestamp: DateTime<Utc>,

    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,

    pub complexity_score: f64,
    pub readability_score: f64,
    pub technical_density: f64,

    pub language: Option<LanguageTag>,
    /// In `[-1, 1]`.
    pub sentiment_score: f64,
    pub question_ratio: f64,
    pub instruction_ratio: f64,

    pub has_structure: bool,
    pub structure_type: StructureType,
    /// Number of ``` fences.
    pub code_blocks: usize,
    pub list_items: usize,

    pub clarity_score: f64,
    pub specificity_score: f64,
    pub completeness_score: f64,

    pub optimization_potential: f64,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    PromptA,
    PromptB,
    Tie,
}

/// A/B comparison of two prompts for the same target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptComparison {
    pub prompt_a: PromptAnalysis,
    pub prompt_b: PromptAnalysis,
    /// Percent change from A to B per metric. Zero when A's value is zero.
    pub improvements: BTreeMap<String, f64>,
    pub winner: Winner,
    pub recommendation: String,
}

/// Scores prompts on size, readability, tone, structure and quality, and
/// suggests improvements for a given provider.
#[derive(Debug, Default, Clone)]
pub struct PromptAnalyzer;

impl PromptAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, prompt: &str, target: ProviderId) -> PromptAnalysis {
        let lower = prompt.to_lowercase();
        let words: Vec<&str> = prompt.split_whitespace().collect();
        let word_count = words.len();

        let sentences: Vec<&str> = SENTENCE_END
            .split(prompt.trim())
            .filter(|s| !s.trim().is_empty())
            .collect();
        let paragraph_count = prompt
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();

        let technical_hits = count_terms(&lower, TECHNICAL_TERMS);
        let technical_density = ratio(technical_hits, word_count);

        let avg_sentence_len = if sentences.is_empty() {
            0.0
        } else {
            sentences
                .iter()
                .map(|s| s.split_whitespace().count())
                .sum::<usize>() as f64
                / sentences.len() as f64
        };
        let readability = (1.0 - (avg_sentence_len - 15.0) / 20.0).clamp(0.0, 1.0);

        let positive = count_terms(&lower, POSITIVE_WORDS) as f64;
        let negative = count_terms(&lower, NEGATIVE_WORDS) as f64;
        let sentiment = if positive + negative > 0.0 {
            (positive - negative) / (positive + negative)
        } else {
            0.0
        };

        let per_chunk = (word_count as f64 / 20.0).max(1.0);
        let questions: usize = QUESTION_PATTERNS
            .iter()
            .map(|p| p.find_iter(&lower).count())
            .sum();
        let instructions: usize = INSTRUCTION_PATTERNS
            .iter()
            .map(|p| p.find_iter(&lower).count())
            .sum();

        let structure_type = if XML_TAG.is_match(prompt) {
            StructureType::Xml
        } else if MARKDOWN_HEADING.is_match(prompt) || prompt.contains("```") {
            StructureType::Markdown
        } else if BULLET.is_match(prompt) || NUMBERED.is_match(prompt) {
            StructureType::List
        } else {
            StructureType::Plain
        };
        let list_items = BULLET.find_iter(prompt).count() + NUMBERED.find_iter(prompt).count();

        let clarity = (count_terms(&lower, CLARITY_WORDS) as f64 / 2.0).min(1.0);
        let numbers = NUMBER.find_iter(prompt).count() as f64;
        let specificity = ((numbers / 5.0).min(1.0)
            + (count_terms(&lower, SPECIFIC_WORDS) as f64 / 2.0).min(1.0))
            / 2.0;
        let completeness = ((count_terms(&lower, COMPLETENESS_WORDS) as f64 / 2.0).min(1.0)
            + (word_count as f64 / 20.0).min(1.0))
            / 2.0;

        let (optimization_potential, suggestions) =
            suggestions_for(prompt, &lower, word_count, target);

        PromptAnalysis {
            prompt: prompt.to_string(),
            target,
            timestamp: Utc::now(),
            char_count: prompt.chars().count(),
            word_count,
            sentence_count: sentences.len(),
            paragraph_count,
            complexity_score: round3(complexity_score(prompt)),
            readability_score: round3(readability),
            technical_density: round3(technical_density),
            language: detect_language(prompt),
            sentiment_score: round3(sentiment.clamp(-1.0, 1.0)),
            question_ratio: round3((questions as f64 / per_chunk).min(1.0)),
            instruction_ratio: round3((instructions as f64 / per_chunk).min(1.0)),
            has_structure: structure_type != StructureType::Plain,
            structure_type,
            code_blocks: prompt.matches("```").count(),
            list_items,
            clarity_score: round3(clarity),
            specificity_score: round3(specificity),
            completeness_score: round3(completeness),
            optimization_potential: round3(optimization_potential),
            suggestions,
        }
    }

    /// Analyze both prompts and pick the better one by a weighted score.
    pub fn compare(&self, a: &str, b: &str, target: ProviderId) -> PromptComparison {
        let prompt_a = self.analyze(a, target);
        let prompt_b = self.analyze(b, target);

        let improvements = [
            ("complexity_score", prompt_a.complexity_score, prompt_b.complexity_score),
            ("readability_score", prompt_a.readability_score, prompt_b.readability_score),
            ("clarity_score", prompt_a.clarity_score, prompt_b.clarity_score),
            ("specificity_score", prompt_a.specificity_score, prompt_b.specificity_score),
            ("completeness_score", prompt_a.completeness_score, prompt_b.completeness_score),
        ]
        .into_iter()
        .map(|(name, before, after)| {
            let change = if before == 0.0 {
                0.0
            } else {
                (after - before) / before * 100.0
            };
            (name.to_string(), round3(change))
        })
        .collect();

        let score_a = weighted_score(&prompt_a);
        let score_b = weighted_score(&prompt_b);
        let winner = if (score_a - score_b).abs() < 1e-9 {
            Winner::Tie
        } else if score_b > score_a {
            Winner::PromptB
        } else {
            Winner::PromptA
        };

        let recommendation = match winner {
            Winner::PromptB => {
                "Prompt B scores higher. Prefer it, and keep what made it clearer or more specific."
            }
            Winner::PromptA => "Prompt A scores higher. Keep it as the baseline.",
            Winner::Tie => "Both prompts score the same. Pick either, or merge their strengths.",
        }
        .to_string();

        tracing::debug!(score_a, score_b, ?winner, "Compared prompts");

        PromptComparison {
            prompt_a,
            prompt_b,
            improvements,
            winner,
            recommendation,
        }
    }
}

fn suggestions_for(
    prompt: &str,
    lower: &str,
    word_count: usize,
    target: ProviderId,
) -> (f64, Vec<String>) {
    let mut potential = 0.0;
    let mut suggestions = Vec::new();
    let mut suggest = |weight: f64, text: &str| {
        potential += weight;
        suggestions.push(text.to_string());
    };

    if word_count < 10 {
        suggest(0.3, "Add more detail and context to the prompt");
    } else if word_count > 500 {
        suggest(0.2, "Shorten the prompt; it may be too long");
    }

    match target {
        ProviderId::Claude if !prompt.contains(INSTRUCTIONS_OPEN) => {
            suggest(0.2, "Wrap the request in <instructions> tags for Claude");
        }
        ProviderId::Cursor
            if !contains_any(lower, CODE_TERMS) && contains_any(lower, BUILD_VERBS) =>
        {
            suggest(0.15, "Name the programming language or code to work on");
        }
        ProviderId::Cursor if !detect_language(prompt).is_some_and(|l| l.is_programming()) => {
            suggest(0.1, "Say which programming language the code is in");
        }
        _ => {}
    }

    if word_count > 20 && !contains_any(lower, COURTESY) {
        suggest(0.1, "State the request explicitly (\"please\", \"I need\")");
    }
    if prompt.contains('?') && !contains_any(lower, HOW_WORDS) {
        suggest(0.15, "Phrase the question so it asks how, to get a more detailed answer");
    }

    (potential.min(1.0), suggestions)
}

fn weighted_score(a: &PromptAnalysis) -> f64 {
    a.clarity_score * 0.25 + a.specificity_score * 0.20 + a.completeness_score * 0.20
        + a.readability_score * 0.15
        - a.complexity_score * 0.10
        - a.optimization_potential * 0.10
}

fn count_terms(lower: &str, terms: &[&str]) -> usize {
    terms.iter().map(|t| lower.matches(t).count()).sum()
}

fn contains_any(lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| lower.contains(t))
}

fn ratio(hits: usize, words: usize) -> f64 {
    if words == 0 {
        0.0
    } else {
        hits as f64 / words as f64
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
