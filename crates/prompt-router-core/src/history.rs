use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

use crate::constants::defaults;
use crate::error::Result;
use crate::llm::provider::ProviderId;
use crate::router::{RouteTarget, RoutingResult};

/// One routed prompt, as kept by an interactive session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub prompt: String,
    pub requested: RouteTarget,
    pub provider: ProviderId,
    pub template_used: String,
    pub optimized: bool,
    pub output: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_result(
        prompt: impl Into<String>,
        requested: RouteTarget,
        optimized: bool,
        result: &RoutingResult,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            requested,
            provider: result.target_provider,
            template_used: result.template_used.clone(),
            optimized,
            output: result.optimized_prompt.clone(),
            timestamp: result.metadata.timestamp,
        }
    }
}

/// Bounded, in-memory prompt history. Oldest entries drop first.
pub struct PromptHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl Default for PromptHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptHistory {
    pub fn new() -> Self {
        Self::with_max_entries(defaults::HISTORY_LIMIT)
    }

    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max.max(1),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write all entries to `path` as pretty JSON.
    pub fn export_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let entries: Vec<&HistoryEntry> = self.entries.iter().collect();
        let contents = serde_json::to_string_pretty(&entries)?;
        std::fs::write(path, contents)?;
        tracing::info!("Exported {} history entries to {}", entries.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(prompt: &str) -> HistoryEntry {
        HistoryEntry {
            prompt: prompt.to_string(),
            requested: RouteTarget::Auto,
            provider: ProviderId::Universal,
            template_used: "universal_template".to_string(),
            optimized: false,
            output: format!("**Prompt:**\n{prompt}"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = PromptHistory::with_max_entries(2);
        history.push(entry("first"));
        history.push(entry("second"));
        history.push(entry("third"));

        assert_eq!(history.len(), 2);
        let prompts: Vec<&str> = history.entries().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["second", "third"]);
        assert_eq!(history.last().unwrap().prompt, "third");
    }

    #[test]
    fn test_export_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("history.json");

        let mut history = PromptHistory::new();
        history.push(entry("hello"));
        history.export_json(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].prompt, "hello");
        assert_eq!(parsed[0].requested, RouteTarget::Auto);
        assert!(raw.contains("\"provider\": \"universal\""));
    }
}
