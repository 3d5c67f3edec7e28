use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::{Result, RouterError};
use crate::llm::provider::ProviderId;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid whitespace regex"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n ?").expect("valid newline regex"));
static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

pub const INSTRUCTIONS_OPEN: &str = "<instructions>";
pub const INSTRUCTIONS_CLOSE: &str = "</instructions>";
pub const THINKING_OPEN: &str = "<thinking>";
pub const THINKING_CLOSE: &str = "</thinking>";

const CLAUDE_THINKING: &str =
    "I will analyze this request carefully and provide a detailed, useful answer.";
const CLAUDE_CLOSING: &str = "Answer following the instructions above.";
const OPENAI_SYSTEM: &str = "System: You are a specialized, helpful and precise assistant.";
const CURSOR_CONTEXT: &str = "You are assisting with software development. \
Follow the language's best practices and keep the code readable and maintainable, \
adding explanatory comments where they help.";

/// Rewrites prompts for a target provider.
///
/// Holds no state; every call is a pure function of its inputs.
#[derive(Debug, Default, Clone)]
pub struct PromptOptimizer;

impl PromptOptimizer {
    pub fn new() -> Self {
        tracing::info!("PromptOptimizer initialised");
        Self
    }

    /// Optimize `prompt` for a target given by name (`claude`, `openai`,
    /// `cursor`, `universal`).
    pub fn optimize_for(&self, prompt: &str, target: &str) -> Result<String> {
        let provider: ProviderId = target.parse()?;
        self.optimize(prompt, provider)
    }

    pub fn optimize(&self, prompt: &str, target: ProviderId) -> Result<String> {
        let normalized = normalize(prompt)?;

        let optimized = match target {
            ProviderId::Claude => for_claude(&normalized),
            ProviderId::OpenAI => for_openai(&normalized),
            ProviderId::Cursor => for_cursor(&normalized),
            ProviderId::Universal => normalized,
        };

        tracing::debug!(
            "Optimized prompt for {}: {} -> {} chars",
            target,
            prompt.len(),
            optimized.len()
        );
        Ok(optimized)
    }

    pub fn stats(&self, original: &str, optimized: &str) -> OptimizationStats {
        OptimizationStats::compute(original, optimized)
    }
}

/// General pass shared by every target.
///
/// Horizontal whitespace runs become one space, single newlines stay, and
/// blank-line runs shrink to one paragraph break. Idempotent.
pub fn normalize(prompt: &str) -> Result<String> {
    let text = prompt.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = EXTRA_BLANK_LINES.replace_all(&text, "\n\n");
    let text = text.trim();

    if text.is_empty() {
        return Err(RouterError::EmptyPrompt);
    }
    Ok(text.to_string())
}

fn for_claude(prompt: &str) -> String {
    format!(
        "{INSTRUCTIONS_OPEN}\n{prompt}\n{INSTRUCTIONS_CLOSE}\n\n\
         {THINKING_OPEN}\n{CLAUDE_THINKING}\n{THINKING_CLOSE}\n\n\
         {CLAUDE_CLOSING}"
    )
}

fn for_openai(prompt: &str) -> String {
    format!("{OPENAI_SYSTEM}\n\nUser: {prompt}")
}

fn for_cursor(prompt: &str) -> String {
    format!("{CURSOR_CONTEXT}\n\n{prompt}")
}

/// Before/after figures for one optimization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OptimizationStats {
    pub original_length: usize,
    pub optimized_length: usize,
    pub length_change: i64,
    pub original_words: usize,
    pub optimized_words: usize,
    pub words_change: i64,
    pub has_structure: bool,
    pub improvement_ratio: f64,
}

impl OptimizationStats {
    pub fn compute(original: &str, optimized: &str) -> Self {
        let original_length = original.chars().count();
        let optimized_length = optimized.chars().count();
        let original_words = original.split_whitespace().count();
        let optimized_words = optimized.split_whitespace().count();

        let has_structure = ["<", "```", "###", "---", "**"]
            .iter()
            .any(|marker| optimized.contains(marker));

        Self {
            original_length,
            optimized_length,
            length_change: optimized_length as i64 - original_length as i64,
            original_words,
            optimized_words,
            words_change: optimized_words as i64 - original_words as i64,
            has_structure,
            improvement_ratio: if original_length > 0 {
                optimized_length as f64 / original_length as f64
            } else {
                1.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_spaces() {
        let messy = "  This   is  a\t\ttest  \n\n\n\n  with  extra   spaces  ";
        let normalized = normalize(messy).unwrap();
        assert_eq!(normalized, "This is a test\n\nwith extra spaces");
        assert!(!normalized.contains("  "));
    }

    #[test]
    fn test_normalize_keeps_single_newlines() {
        let text = "line one\nline two\r\nline three";
        assert_eq!(normalize(text).unwrap(), "line one\nline two\nline three");
    }

    #[test]
    fn test_normalize_rejects_whitespace_only() {
        assert!(matches!(normalize(""), Err(RouterError::EmptyPrompt)));
        assert!(matches!(normalize(" \n\t \r\n "), Err(RouterError::EmptyPrompt)));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let optimizer = PromptOptimizer::new();
        let err = optimizer.optimize_for("hello", "gemini").unwrap_err();
        assert!(matches!(err, RouterError::InvalidTarget(_)));
        assert!(optimizer.optimize_for("hello", "auto").is_err());
    }

    #[test]
    fn test_openai_and_cursor_prefixes() {
        let optimizer = PromptOptimizer::new();

        let openai = optimizer.optimize("Summarize this", ProviderId::OpenAI).unwrap();
        assert!(openai.starts_with("System: "));
        assert!(openai.ends_with("User: Summarize this"));

        let cursor = optimizer
            .optimize("Write a parser", ProviderId::Cursor)
            .unwrap();
        assert!(cursor.starts_with("You are assisting with software development."));
        assert!(cursor.ends_with("Write a parser"));
    }

    #[test]
    fn test_universal_is_normalized_only() {
        let optimizer = PromptOptimizer::new();
        let out = optimizer
            .optimize("  Plain   request  ", ProviderId::Universal)
            .unwrap();
        assert_eq!(out, "Plain request");
    }

    #[test]
    fn test_stats() {
        let stats = OptimizationStats::compute("simple test", "simple test optimized.");
        assert_eq!(stats.original_words, 2);
        assert_eq!(stats.optimized_words, 3);
        assert_eq!(stats.length_change, 11);
        assert!(!stats.has_structure);
        assert!(stats.improvement_ratio > 1.0);

        let stats = OptimizationStats::compute("", "<instructions>");
        assert_eq!(stats.improvement_ratio, 1.0);
        assert!(stats.has_structure);
    }
}
