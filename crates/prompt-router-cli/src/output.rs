use clap::ValueEnum;
use prompt_router_core::llm::CostEstimate;
use prompt_router_core::optimizer::OptimizationStats;
use prompt_router_core::router::{RoutingResult, SelectionMode};
use prompt_router_core::{BatchReport, CacheStats, PromptAnalysis, PromptComparison, Winner};
use serde::Serialize;

const RULE: &str = "────────────────────────────────────────────────────────────";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

/// Everything printed for one routed prompt.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub result: &'a RoutingResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<OptimizationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PromptAnalysis>,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a RoutingResult) -> Self {
        Self {
            result,
            stats: None,
            cost: None,
            analysis: None,
        }
    }
}

pub fn render_json(report: &Report<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn render(report: &Report<'_>, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => render_json(report),
        OutputFormat::Markdown => Ok(render_markdown(report)),
    }
}

pub fn render_text(report: &Report<'_>) -> String {
    let result = report.result;
    let meta = &result.metadata;
    let mut out = String::new();

    let how = match meta.selection {
        SelectionMode::Explicit => "explicit".to_string(),
        SelectionMode::Auto => match meta.category {
            Some(category) => format!("auto, {}", category.name()),
            None => "auto".to_string(),
        },
    };
    out.push_str(&format!(
        "Target:     {} ({how}, confidence {:.2})\n",
        result.target_provider, meta.confidence
    ));
    if !meta.provider_available {
        out.push_str("            warning: no API key configured for this provider\n");
    }
    out.push_str(&format!("Template:   {}\n", result.template_used));
    out.push_str(&format!(
        "Complexity: {} ({:.2})\n",
        meta.complexity.name(),
        meta.complexity_score
    ));
    out.push_str(&format!(
        "Language:   {}\n",
        meta.detected_language
            .map(|l| l.as_str())
            .unwrap_or("unknown")
    ));
    out.push_str(&format!(
        "Size:       {} words, {} chars{}\n",
        meta.word_count,
        meta.char_count,
        if meta.has_code { ", contains code" } else { "" }
    ));

    out.push_str(RULE);
    out.push('\n');
    out.push_str(&result.optimized_prompt);
    out.push('\n');
    out.push_str(RULE);
    out.push('\n');

    if let Some(ref stats) = report.stats {
        out.push_str(&format!(
            "Stats:      {} -> {} chars ({:+}), {} -> {} words ({:+}), ratio {:.2}{}\n",
            stats.original_length,
            stats.optimized_length,
            stats.length_change,
            stats.original_words,
            stats.optimized_words,
            stats.words_change,
            stats.improvement_ratio,
            if stats.has_structure { ", structured" } else { "" }
        ));
    }
    if let Some(ref cost) = report.cost {
        out.push_str(&format!(
            "Cost:       ~{} tokens, ~${:.4} {}\n            {}\n",
            cost.estimated_tokens, cost.estimated_cost_usd, cost.currency, cost.note
        ));
    }
    if let Some(ref analysis) = report.analysis {
        let mut lines = Lines::new(false);
        lines.heading("\nAnalysis");
        analysis_fields(&mut lines, analysis);
        out.push_str(&lines.finish());
    }

    out
}

pub fn render_markdown(report: &Report<'_>) -> String {
    let result = report.result;
    let meta = &result.metadata;
    let mut out = Lines::new(true);

    out.heading("Routed prompt");
    out.field(
        "Target",
        format!("{} ({:.2} confidence)", result.target_provider, meta.confidence),
    );
    if !meta.provider_available {
        out.field("Warning", "no API key configured for this provider");
    }
    out.field("Template", &result.template_used);
    out.field(
        "Complexity",
        format!("{} ({:.2})", meta.complexity.name(), meta.complexity_score),
    );
    out.field(
        "Language",
        meta.detected_language.map(|l| l.as_str()).unwrap_or("unknown"),
    );
    out.field(
        "Size",
        format!("{} words, {} chars", meta.word_count, meta.char_count),
    );
    out.push(format!("\n```text\n{}\n```", result.optimized_prompt));

    if let Some(ref stats) = report.stats {
        out.field(
            "Stats",
            format!(
                "{} -> {} chars, {} -> {} words, ratio {:.2}",
                stats.original_length,
                stats.optimized_length,
                stats.original_words,
                stats.optimized_words,
                stats.improvement_ratio
            ),
        );
    }
    if let Some(ref cost) = report.cost {
        out.field(
            "Cost",
            format!(
                "~{} tokens, ~${:.4} {}",
                cost.estimated_tokens, cost.estimated_cost_usd, cost.currency
            ),
        );
    }
    if let Some(ref analysis) = report.analysis {
        out.heading("Analysis");
        analysis_fields(&mut out, analysis);
    }
    out.finish()
}

pub fn render_comparison(
    comparison: &PromptComparison,
    format: OutputFormat,
) -> serde_json::Result<String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(comparison);
    }
    let mut out = Lines::new(format == OutputFormat::Markdown);
    out.heading("Prompt comparison");
    out.field(
        "Winner",
        match comparison.winner {
            Winner::PromptA => "prompt A",
            Winner::PromptB => "prompt B",
            Winner::Tie => "tie",
        },
    );
    out.field("Advice", &comparison.recommendation);
    for (metric, change) in &comparison.improvements {
        out.field(metric, format!("{change:+.1}%"));
    }
    out.heading("Prompt A");
    analysis_fields(&mut out, &comparison.prompt_a);
    out.heading("Prompt B");
    analysis_fields(&mut out, &comparison.prompt_b);
    Ok(out.finish())
}

pub fn render_batch(report: &BatchReport, format: OutputFormat) -> serde_json::Result<String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(report);
    }
    let mut out = Lines::new(format == OutputFormat::Markdown);
    out.heading(&format!("Batch {}", report.batch_id));
    out.field("Items", report.total_items.to_string());
    out.field("Succeeded", report.successful_items.to_string());
    out.field("Failed", report.failed_items.to_string());
    out.field(
        "Time",
        format!(
            "{:.3}s total, {:.3}s per item",
            report.total_time_seconds, report.average_time_per_item
        ),
    );
    for result in &report.results {
        let outcome = match (result.provider, &result.error_message) {
            (Some(provider), _) => format!("-> {provider}"),
            (None, Some(error)) => format!("failed: {error}"),
            (None, None) => "failed".to_string(),
        };
        out.field(&result.item_id, outcome);
    }
    Ok(out.finish())
}

pub fn render_cache_stats(stats: &CacheStats, format: OutputFormat) -> serde_json::Result<String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(stats);
    }
    let mut out = Lines::new(format == OutputFormat::Markdown);
    out.heading("Cache");
    out.field("Entries", stats.entries.to_string());
    out.field("Stored hits", stats.total_hits.to_string());
    let stamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    out.field("Oldest", stamp(stats.oldest_entry));
    out.field("Newest", stamp(stats.newest_entry));
    if let Some(ref path) = stats.path {
        out.field("File", path.display().to_string());
    }
    Ok(out.finish())
}

fn analysis_fields(out: &mut Lines, a: &PromptAnalysis) {
    out.field(
        "Size",
        format!(
            "{} words, {} sentences, {} paragraphs",
            a.word_count, a.sentence_count, a.paragraph_count
        ),
    );
    out.field(
        "Language",
        a.language.map(|l| l.as_str()).unwrap_or("unknown"),
    );
    out.field("Structure", format!("{:?}", a.structure_type).to_lowercase());
    out.field(
        "Scores",
        format!(
            "complexity {:.2}, readability {:.2}, clarity {:.2}, specificity {:.2}, completeness {:.2}",
            a.complexity_score,
            a.readability_score,
            a.clarity_score,
            a.specificity_score,
            a.completeness_score
        ),
    );
    out.field("Potential", format!("{:.2}", a.optimization_potential));
    for suggestion in &a.suggestions {
        out.field("Suggestion", suggestion);
    }
}

/// Line builder shared by the text and markdown renderers.
struct Lines {
    markdown: bool,
    out: String,
}

impl Lines {
    fn new(markdown: bool) -> Self {
        Self {
            markdown,
            out: String::new(),
        }
    }

    fn heading(&mut self, title: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        if self.markdown {
            self.out.push_str(&format!("## {title}\n\n"));
        } else {
            self.out.push_str(&format!("{title}\n{RULE}\n"));
        }
    }

    fn field(&mut self, label: &str, value: impl AsRef<str>) {
        let value = value.as_ref();
        if self.markdown {
            self.out.push_str(&format!("- **{label}:** {value}\n"));
        } else {
            self.out.push_str(&format!("{:<12}{value}\n", format!("{label}:")));
        }
    }

    fn push(&mut self, text: String) {
        self.out.push_str(&text);
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompt_router_core::config::Settings;
    use prompt_router_core::llm::estimate_cost;
    use prompt_router_core::{LlmRouter, ProviderId, ProviderRegistry, RouteTarget, TemplateStore};

    fn route(prompt: &str) -> RoutingResult {
        let registry = ProviderRegistry::load(&Settings::default(), |k| {
            (k == "CURSOR_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        LlmRouter::new(registry, TemplateStore::builtin().unwrap())
            .route(prompt, RouteTarget::Auto)
            .unwrap()
    }

    #[test]
    fn test_text_report_lists_route_and_prompt() {
        let result = route("Write a Python function to parse dates");
        let text = render_text(&Report::new(&result));
        assert!(text.contains("Target:     cursor (auto, code"));
        assert!(text.contains("Template:   cursor_template"));
        assert!(text.contains("Language:   python"));
        assert!(text.contains("Write a Python function to parse dates"));
        assert!(!text.contains("Cost:"));
    }

    #[test]
    fn test_json_report_is_flat() {
        let result = route("Tell me about tea");
        let mut report = Report::new(&result);
        report.cost = Some(estimate_cost(&result.optimized_prompt, ProviderId::Universal));

        let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(json["target_provider"], "universal");
        assert_eq!(json["template_used"], "universal_template");
        assert_eq!(json["metadata"]["selection"], "auto");
        assert!(json["cost"]["estimated_tokens"].as_u64().unwrap() > 0);
        assert!(json.get("stats").is_none());
    }

    #[test]
    fn test_markdown_report_fences_prompt() {
        let result = route("Tell me about tea");
        let md = render(&Report::new(&result), OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("## Routed prompt"));
        assert!(md.contains("- **Target:** universal"));
        assert!(md.contains("```text\n**Prompt:**\nTell me about tea"));
    }

    #[test]
    fn test_text_report_appends_analysis() {
        let result = route("Tell me about tea");
        let mut report = Report::new(&result);
        report.analysis = Some(
            prompt_router_core::PromptAnalyzer::new().analyze("Tell me about tea", ProviderId::Universal),
        );
        let text = render(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("\nAnalysis\n"));
        assert!(text.contains("Suggestion: Add more detail"));
    }

    #[test]
    fn test_comparison_rendering() {
        let comparison = prompt_router_core::PromptAnalyzer::new().compare(
            "Explain tides",
            "Explain tides",
            ProviderId::Universal,
        );
        let text = render_comparison(&comparison, OutputFormat::Text).unwrap();
        assert!(text.contains("Winner:     tie"));
        assert!(text.contains("Prompt B"));

        let json: serde_json::Value =
            serde_json::from_str(&render_comparison(&comparison, OutputFormat::Json).unwrap())
                .unwrap();
        assert_eq!(json["winner"], "tie");
    }
}
