use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Complexity::Simple
        } else if score < 0.6 {
            Complexity::Moderate
        } else {
            Complexity::Complex
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }
}

/// A detected natural or programming language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "en")]
    English,
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Java,
    Go,
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "csharp")]
    CSharp,
    Sql,
    Ruby,
    Php,
    Bash,
}

impl LanguageTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portuguese => "pt",
            Self::English => "en",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Go => "go",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Sql => "sql",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Bash => "bash",
        }
    }

    pub fn is_programming(&self) -> bool {
        !matches!(self, Self::Portuguese | Self::English)
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static PROGRAMMING_LANGUAGES: LazyLock<Vec<(LanguageTag, Regex)>> = LazyLock::new(|| {
    [
        (LanguageTag::TypeScript, r"(?i)\btypescript\b"),
        (LanguageTag::JavaScript, r"(?i)\b(?:javascript|node\.?js)\b"),
        (LanguageTag::Python, r"(?i)\bpython\b"),
        (LanguageTag::Rust, r"(?i)\b(?:rust|cargo)\b"),
        (LanguageTag::Java, r"(?i)\bjava\b"),
        (LanguageTag::Go, r"(?i)\bgolang\b"),
        (LanguageTag::Cpp, r"(?i)\bc\+\+"),
        (LanguageTag::CSharp, r"(?i)\bc#"),
        (LanguageTag::Sql, r"(?i)\bsql\b"),
        (LanguageTag::Ruby, r"(?i)\bruby\b"),
        (LanguageTag::Php, r"(?i)\bphp\b"),
        (LanguageTag::Bash, r"(?i)\b(?:bash|shell script)\b"),
    ]
    .into_iter()
    .map(|(tag, pattern)| (tag, Regex::new(pattern).expect("valid language regex")))
    .collect()
});

const PORTUGUESE_WORDS: &[&str] = &[
    "e", "o", "a", "de", "em", "para", "com", "não", "um", "uma", "os", "as", "que", "da", "do",
];
const ENGLISH_WORDS: &[&str] = &[
    "and", "the", "a", "an", "of", "in", "for", "with", "not", "is", "to", "that", "this",
];

const CODE_MARKERS: &[&str] = &["def ", "function", "class ", "import ", "```", "fn ", "=>"];

/// Score in `[0, 1]` combining length, long-word density, structural
/// punctuation and question marks.
pub fn complexity_score(prompt: &str) -> f64 {
    let words: Vec<&str> = prompt.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let chars = prompt.chars().count() as f64;
    let long_words = words.iter().filter(|w| w.chars().count() > 8).count() as f64;
    let structure = prompt
        .chars()
        .filter(|c| matches!(c, '\n' | '.' | ':'))
        .count() as f64;
    let questions = prompt.matches('?').count() as f64;

    let score = (chars / 1000.0).min(1.0) * 0.3
        + (long_words / words.len() as f64) * 0.3
        + (structure / 50.0) * 0.2
        + (questions / 10.0) * 0.2;

    score.min(1.0)
}

/// Best-effort language detection. A named programming language wins over
/// the natural language; ties between Portuguese and English yield `None`.
pub fn detect_language(prompt: &str) -> Option<LanguageTag> {
    if let Some((tag, _)) = PROGRAMMING_LANGUAGES
        .iter()
        .find(|(_, pattern)| pattern.is_match(prompt))
    {
        return Some(*tag);
    }

    let lower = prompt.to_lowercase();
    let (mut pt, mut en) = (0usize, 0usize);
    for word in lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if PORTUGUESE_WORDS.contains(&word) {
            pt += 1;
        }
        if ENGLISH_WORDS.contains(&word) {
            en += 1;
        }
    }

    match pt.cmp(&en) {
        std::cmp::Ordering::Greater => Some(LanguageTag::Portuguese),
        std::cmp::Ordering::Less => Some(LanguageTag::English),
        std::cmp::Ordering::Equal => None,
    }
}

pub fn has_code(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    CODE_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_tags() {
        assert_eq!(Complexity::from_score(0.0), Complexity::Simple);
        assert_eq!(Complexity::from_score(0.29), Complexity::Simple);
        assert_eq!(Complexity::from_score(0.3), Complexity::Moderate);
        assert_eq!(Complexity::from_score(0.6), Complexity::Complex);
    }

    #[test]
    fn test_short_prompt_is_simple() {
        let score = complexity_score("Hi there");
        assert!(score < 0.3, "score was {score}");
        assert_eq!(complexity_score("   "), 0.0);
    }

    #[test]
    fn test_long_structured_prompt_is_complex() {
        let paragraph = "Considering interoperability, scalability, maintainability: \
                         what architectural considerations matter? Explain.\n";
        let prompt = paragraph.repeat(20);
        let score = complexity_score(&prompt);
        assert!(score >= 0.6, "score was {score}");
        assert!(score <= 1.0);
    }

    #[test]
    fn test_detect_programming_language_first() {
        assert_eq!(
            detect_language("Crie uma função Python para calcular fibonacci"),
            Some(LanguageTag::Python)
        );
        assert_eq!(
            detect_language("Port this JavaScript to TypeScript"),
            Some(LanguageTag::TypeScript)
        );
        assert_eq!(detect_language("is java or c++ better"), Some(LanguageTag::Java));
    }

    #[test]
    fn test_detect_natural_language() {
        assert_eq!(
            detect_language("Analise os prós e contras da IA para o mercado"),
            Some(LanguageTag::Portuguese)
        );
        assert_eq!(
            detect_language("Explain the history of the printing press"),
            Some(LanguageTag::English)
        );
        assert_eq!(detect_language("Bonjour"), None);
    }

    #[test]
    fn test_has_code() {
        assert!(has_code("def fib(n): return n"));
        assert!(has_code("Write a Function that sums"));
        assert!(!has_code("Tell me a joke"));
    }
}
