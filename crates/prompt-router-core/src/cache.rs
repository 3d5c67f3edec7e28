//! Routing result cache with TTL and LRU eviction, persisted as JSON.
//!
//! Keys are a SHA-256 hash of the prompt, the requested target and the
//! pipeline options, so the same prompt routed with different settings is
//! cached separately.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::config::CacheSettings;
use crate::error::Result;
use crate::pipeline::PipelineOptions;
use crate::router::{Clock, RouteTarget, RoutingResult, SystemClock};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    result: RoutingResult,
    created_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    hit_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    /// Hits recorded on the stored entries, across runs.
    pub total_hits: u64,
    /// Lookups made through this instance.
    pub session_hits: u64,
    pub session_misses: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.session_hits + self.session_misses;
        if lookups == 0 {
            0.0
        } else {
            self.session_hits as f64 / lookups as f64
        }
    }
}

pub struct PromptCache {
    /// `None` keeps the cache in memory only.
    path: Option<PathBuf>,
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    clock: Box<dyn Clock>,
}

impl PromptCache {
    pub fn in_memory(ttl_hours: i64, max_entries: usize) -> Self {
        Self {
            path: None,
            ttl: Duration::hours(ttl_hours),
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            clock: Box::new(SystemClock::new()),
        }
    }

    /// Open the cache file named by the settings. A missing file starts an
    /// empty cache; an unreadable one is replaced on the next save.
    pub fn open(settings: &CacheSettings) -> Self {
        Self::open_at(&settings.file_path(), settings.ttl_hours, settings.max_entries)
    }

    pub fn open_at(path: &Path, ttl_hours: i64, max_entries: usize) -> Self {
        let mut cache = Self::in_memory(ttl_hours, max_entries);
        cache.path = Some(path.to_path_buf());

        if path.exists() {
            match read_entries(path) {
                Ok(entries) => {
                    tracing::debug!(
                        "Loaded {} cached results from {}",
                        entries.len(),
                        path.display()
                    );
                    cache.entries = Mutex::new(entries);
                }
                Err(e) => tracing::warn!("Ignoring cache file {}: {}", path.display(), e),
            }
        }
        cache
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Deterministic key for a pipeline call.
    pub fn key(prompt: &str, target: RouteTarget, options: &PipelineOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hasher.update(b"|");
        hasher.update(target.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update([u8::from(options.optimize)]);
        hasher.update(b"|");
        if let Some(ref context) = options.context {
            hasher.update(context.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<RoutingResult> {
        let now = self.clock.now();
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = guard.get_mut(key) {
            if now - entry.created_at < self.ttl {
                entry.last_accessed = now;
                entry.hit_count += 1;
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(hits = entry.hit_count, "prompt cache hit");
                return Some(entry.result.clone());
            }
            guard.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: String, result: RoutingResult) {
        let now = self.clock.now();
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        guard.retain(|_, entry| now - entry.created_at < self.ttl);
        while guard.len() >= self.max_entries {
            let oldest_key = guard
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| k.clone());
            match oldest_key {
                Some(k) => {
                    guard.remove(&k);
                }
                None => break,
            }
        }

        guard.insert(
            key,
            CacheEntry {
                result,
                created_at: now,
                last_accessed: now,
                hit_count: 0,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        CacheStats {
            entries: guard.len(),
            total_hits: guard.values().map(|e| e.hit_count).sum(),
            session_hits: self.hits.load(Ordering::Relaxed),
            session_misses: self.misses.load(Ordering::Relaxed),
            oldest_entry: guard.values().map(|e| e.created_at).min(),
            newest_entry: guard.values().map(|e| e.created_at).max(),
            path: self.path.clone(),
        }
    }

    /// Drop every entry and persist the empty cache. Returns how many
    /// entries were removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = {
            let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            let removed = guard.len();
            guard.clear();
            removed
        };
        self.save()?;
        tracing::info!("Cleared {} cached results", removed);
        Ok(removed)
    }

    /// Write the cache to its file. No-op for in-memory caches.
    pub fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = {
            let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            serde_json::to_string(&*guard)?
        };
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<HashMap<String, CacheEntry>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ProviderId;
    use crate::router::{Complexity, RoutingMetadata, SelectionMode};

    struct StepClock(Mutex<DateTime<Utc>>);

    impl StepClock {
        fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for std::sync::Arc<StepClock> {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn result(prompt: &str) -> RoutingResult {
        RoutingResult {
            optimized_prompt: prompt.to_string(),
            target_provider: ProviderId::OpenAI,
            template_used: "openai".to_string(),
            metadata: RoutingMetadata {
                complexity: Complexity::Simple,
                complexity_score: 0.1,
                detected_language: None,
                selection: SelectionMode::Explicit,
                category: None,
                provider_available: true,
                confidence: 0.3,
                word_count: 2,
                char_count: prompt.len(),
                has_code: false,
                timestamp: Utc::now(),
            },
        }
    }

    #[test]
    fn test_key_depends_on_options() {
        let plain = PipelineOptions::default();
        let optimized = PipelineOptions {
            optimize: true,
            context: None,
        };
        let target = RouteTarget::Auto;
        assert_eq!(
            PromptCache::key("hi", target, &plain),
            PromptCache::key("hi", target, &plain)
        );
        assert_ne!(
            PromptCache::key("hi", target, &plain),
            PromptCache::key("hi", target, &optimized)
        );
        assert_ne!(
            PromptCache::key("hi", target, &plain),
            PromptCache::key("hi", RouteTarget::Provider(ProviderId::Claude), &plain)
        );
        assert_eq!(PromptCache::key("hi", target, &plain).len(), 64);
    }

    #[test]
    fn test_hit_and_miss_counts() {
        let cache = PromptCache::in_memory(24, 10);
        assert!(cache.get("k").is_none());
        cache.insert("k".into(), result("hello"));
        assert_eq!(cache.get("k").unwrap().optimized_prompt, "hello");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.session_hits, 1);
        assert_eq!(stats.session_misses, 1);
        assert_eq!(stats.total_hits, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let clock = std::sync::Arc::new(StepClock(Mutex::new(Utc::now())));
        let cache = PromptCache::in_memory(1, 10).with_clock(Box::new(clock.clone()));
        cache.insert("k".into(), result("hello"));

        clock.advance(Duration::minutes(59));
        assert!(cache.get("k").is_some());
        clock.advance(Duration::minutes(2));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted() {
        let clock = std::sync::Arc::new(StepClock(Mutex::new(Utc::now())));
        let cache = PromptCache::in_memory(24, 2).with_clock(Box::new(clock.clone()));
        cache.insert("a".into(), result("a"));
        clock.advance(Duration::seconds(1));
        cache.insert("b".into(), result("b"));
        clock.advance(Duration::seconds(1));
        cache.get("a");
        clock.advance(Duration::seconds(1));
        cache.insert("c".into(), result("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_save_reload_and_clear() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache").join("prompt_cache.json");

        let cache = PromptCache::open_at(&path, 24, 10);
        cache.insert("k".into(), result("persisted"));
        cache.save().unwrap();

        let reopened = PromptCache::open_at(&path, 24, 10);
        assert_eq!(reopened.get("k").unwrap().optimized_prompt, "persisted");
        assert_eq!(reopened.clear().unwrap(), 1);
        assert!(PromptCache::open_at(&path, 24, 10).is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("prompt_cache.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(PromptCache::open_at(&path, 24, 10).is_empty());
    }
}
