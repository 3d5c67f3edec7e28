//! Batch routing: load prompts from CSV or JSON, run each through the
//! pipeline in order and collect a report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analyzer::{PromptAnalysis, PromptAnalyzer};
use crate::error::{Result, RouterError};
use crate::llm::provider::ProviderId;
use crate::pipeline::{PipelineOptions, PromptPipeline};
use crate::router::RouteTarget;

const PROMPT_COLUMN: &str = "prompt";
const ID_COLUMN: &str = "id";
const TARGET_COLUMNS: &[&str] = &["target_llm", "target"];

/// One prompt to route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    pub prompt: String,
    /// Overrides the batch's default target. Parsed when the item runs, so
    /// a bad value fails only this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub item_id: String,
    pub original_prompt: String,
    pub routed_prompt: Option<String>,
    pub requested_target: RouteTarget,
    pub provider: Option<ProviderId>,
    pub template_used: Option<String>,
    pub processing_time_ms: f64,
    pub success: bool,
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PromptAnalysis>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// `batch_YYYYMMDD_HHMMSS` of the start time.
    pub batch_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total_items: usize,
    pub successful_items: usize,
    pub failed_items: usize,
    pub total_time_seconds: f64,
    pub average_time_per_item: f64,
    pub results: Vec<BatchResult>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Target for items that do not name one.
    pub default_target: RouteTarget,
    pub pipeline: PipelineOptions,
    /// Attach a [`PromptAnalysis`] to every successful result.
    pub analyze: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            default_target: RouteTarget::Auto,
            pipeline: PipelineOptions::default(),
            analyze: false,
        }
    }
}

/// Runs items one after another through a [`PromptPipeline`].
pub struct BatchProcessor<'a> {
    pipeline: &'a PromptPipeline,
    analyzer: PromptAnalyzer,
    options: BatchOptions,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(pipeline: &'a PromptPipeline, options: BatchOptions) -> Self {
        Self {
            pipeline,
            analyzer: PromptAnalyzer::new(),
            options,
        }
    }

    /// Process every item. Item failures are recorded in the report and do
    /// not stop the batch.
    pub fn process(&self, items: &[BatchItem]) -> BatchReport {
        let started_at = Utc::now();
        let batch_id = started_at.format("batch_%Y%m%d_%H%M%S").to_string();
        let clock = Instant::now();
        tracing::info!("Starting {} with {} items", batch_id, items.len());

        let mut results = Vec::with_capacity(items.len());
        let mut errors = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let result = self.process_item(item);
            if let Some(ref message) = result.error_message {
                tracing::warn!("Batch item {} failed: {}", item.id, message);
                errors.push(format!("{}: {}", item.id, message));
            } else {
                tracing::debug!("Batch item {}/{} done", i + 1, items.len());
            }
            results.push(result);
        }

        let total_time_seconds = clock.elapsed().as_secs_f64();
        let successful_items = results.iter().filter(|r| r.success).count();
        let report = BatchReport {
            batch_id,
            started_at,
            completed_at: Utc::now(),
            total_items: items.len(),
            successful_items,
            failed_items: items.len() - successful_items,
            total_time_seconds,
            average_time_per_item: if items.is_empty() {
                0.0
            } else {
                total_time_seconds / items.len() as f64
            },
            results,
            errors,
        };

        tracing::info!(
            "Finished {}: {} succeeded, {} failed",
            report.batch_id,
            report.successful_items,
            report.failed_items
        );
        report
    }

    fn process_item(&self, item: &BatchItem) -> BatchResult {
        let start = Instant::now();
        let target = match item.target.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(self.options.default_target),
        };

        let mut result = BatchResult {
            item_id: item.id.clone(),
            original_prompt: item.prompt.clone(),
            routed_prompt: None,
            requested_target: target.as_ref().copied().unwrap_or(self.options.default_target),
            provider: None,
            template_used: None,
            processing_time_ms: 0.0,
            success: false,
            error_message: None,
            analysis: None,
            metadata: item.metadata.clone(),
        };

        match target.and_then(|t| self.pipeline.run(&item.prompt, t, &self.options.pipeline)) {
            Ok(routed) => {
                if self.options.analyze {
                    result.analysis = Some(self.analyzer.analyze(&item.prompt, routed.target_provider));
                }
                result.provider = Some(routed.target_provider);
                result.template_used = Some(routed.template_used);
                result.routed_prompt = Some(routed.optimized_prompt);
                result.success = true;
            }
            Err(e) => result.error_message = Some(e.to_string()),
        }

        result.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        result
    }
}

impl BatchReport {
    /// Write the report as `<reports_dir>/<batch_id>_report.json`.
    pub fn save_json(&self, reports_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(reports_dir)?;
        let path = reports_dir.join(format!("{}_report.json", self.batch_id));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// One row per item. Analysis columns stay empty when analysis was off.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "item_id",
            "original_prompt",
            "routed_prompt",
            "requested_target",
            "provider",
            "template_used",
            "processing_time_ms",
            "success",
            "error_message",
            "word_count",
            "complexity_score",
            "clarity_score",
        ])?;

        for r in &self.results {
            let analysis = r.analysis.as_ref();
            writer.write_record([
                r.item_id.clone(),
                r.original_prompt.clone(),
                r.routed_prompt.clone().unwrap_or_default(),
                r.requested_target.to_string(),
                r.provider.map(|p| p.to_string()).unwrap_or_default(),
                r.template_used.clone().unwrap_or_default(),
                format!("{:.3}", r.processing_time_ms),
                r.success.to_string(),
                r.error_message.clone().unwrap_or_default(),
                r.original_prompt.split_whitespace().count().to_string(),
                analysis.map(|a| a.complexity_score.to_string()).unwrap_or_default(),
                analysis.map(|a| a.clarity_score.to_string()).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Read items from a CSV file with a header row. See [`parse_csv`].
pub fn load_csv(path: &Path) -> Result<Vec<BatchItem>> {
    parse_csv(std::fs::File::open(path)?)
}

/// The header must contain `prompt`. Optional `id` and `target_llm` (or
/// `target`) columns are used when present; any other column is kept as
/// item metadata. Rows with an empty prompt are skipped.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<BatchItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    let prompt_col = headers
        .iter()
        .position(|h| h == PROMPT_COLUMN)
        .ok_or_else(|| RouterError::Batch("CSV has no 'prompt' column".into()))?;
    let id_col = headers.iter().position(|h| h == ID_COLUMN);
    let target_col = headers
        .iter()
        .position(|h| TARGET_COLUMNS.contains(&h.as_str()));

    let mut items = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let prompt = record.get(prompt_col).unwrap_or_default();
        if prompt.is_empty() {
            tracing::warn!("Skipping CSV row {}: empty prompt", row + 1);
            continue;
        }

        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let metadata = headers
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != prompt_col && Some(*c) != id_col && Some(*c) != target_col)
            .filter_map(|(c, h)| {
                record
                    .get(c)
                    .filter(|v| !v.is_empty())
                    .map(|v| (h.clone(), v.to_string()))
            })
            .collect();

        items.push(BatchItem {
            id: field(id_col).unwrap_or_else(|| format!("csv_row_{row}")),
            prompt: prompt.to_string(),
            target: field(target_col),
            metadata,
        });
    }

    tracing::info!("Loaded {} prompts from CSV", items.len());
    Ok(items)
}

pub fn load_json(path: &Path) -> Result<Vec<BatchItem>> {
    parse_json(&std::fs::read_to_string(path)?)
}

/// Accepts a list of prompt objects or plain strings, an object with a
/// `prompts` list, or a single prompt object.
pub fn parse_json(text: &str) -> Result<Vec<BatchItem>> {
    let value: Value = serde_json::from_str(text)?;
    let list = match value {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove("prompts") {
            Some(Value::Array(list)) => list,
            Some(_) => return Err(RouterError::Batch("'prompts' must be a list".into())),
            None => vec![Value::Object(map)],
        },
        _ => {
            return Err(RouterError::Batch(
                "expected a list of prompts or an object".into(),
            ))
        }
    };

    let mut items = Vec::with_capacity(list.len());
    for (i, entry) in list.into_iter().enumerate() {
        match json_item(i, entry) {
            Some(item) => items.push(item),
            None => tracing::warn!("Skipping JSON item {}: no prompt", i),
        }
    }
    tracing::info!("Loaded {} prompts from JSON", items.len());
    Ok(items)
}

fn json_item(index: usize, entry: Value) -> Option<BatchItem> {
    let default_id = format!("json_item_{index}");
    match entry {
        Value::String(prompt) if !prompt.trim().is_empty() => Some(BatchItem {
            id: default_id,
            prompt: prompt.trim().to_string(),
            target: None,
            metadata: BTreeMap::new(),
        }),
        Value::Object(mut map) => {
            let prompt = match map.remove(PROMPT_COLUMN) {
                Some(Value::String(p)) if !p.trim().is_empty() => p.trim().to_string(),
                _ => return None,
            };
            let id = map.remove(ID_COLUMN).map(scalar).unwrap_or(default_id);
            let target = TARGET_COLUMNS
                .iter()
                .find_map(|key| map.remove(*key))
                .map(scalar);
            let metadata = map.into_iter().map(|(k, v)| (k, scalar(v))).collect();
            Some(BatchItem {
                id,
                prompt,
                target,
                metadata,
            })
        }
        _ => None,
    }
}

fn scalar(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_columns_and_metadata() {
        let csv = "id,prompt,target_llm,owner\n\
                   a1,Fix this Rust function,cursor,ana\n\
                   ,Write a poem,,\n\
                   a3,,claude,bo\n";
        let items = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a1");
        assert_eq!(items[0].target.as_deref(), Some("cursor"));
        assert_eq!(items[0].metadata.get("owner").map(String::as_str), Some("ana"));
        assert_eq!(items[1].id, "csv_row_1");
        assert!(items[1].target.is_none());
        assert!(items[1].metadata.is_empty());
    }

    #[test]
    fn test_parse_csv_requires_prompt_column() {
        let err = parse_csv("text,target\nhello,claude\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RouterError::Batch(_)));
    }

    #[test]
    fn test_parse_json_shapes() {
        let list = parse_json(r#"["Explain tides", {"prompt": "Sum", "target": "openai", "tag": 3}]"#)
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "json_item_0");
        assert_eq!(list[1].target.as_deref(), Some("openai"));
        assert_eq!(list[1].metadata.get("tag").map(String::as_str), Some("3"));

        let wrapped = parse_json(r#"{"prompts": [{"id": "x", "prompt": "Hi"}, {"note": "no prompt"}]}"#)
            .unwrap();
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].id, "x");

        let single = parse_json(r#"{"prompt": "Only one", "target_llm": "claude"}"#).unwrap();
        assert_eq!(single[0].target.as_deref(), Some("claude"));

        assert!(parse_json("42").is_err());
    }
}
