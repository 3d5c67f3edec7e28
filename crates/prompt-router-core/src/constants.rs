//! Prompt Router: centralized constants.
//! Env names, default models, limits and file names live here.

// ─── Environment ──────────────────────────────────────────────────────────────

pub mod env {
    pub const CLAUDE_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const CURSOR_API_KEY: &str = "CURSOR_API_KEY";

    pub const CLAUDE_MODEL: &str = "CLAUDE_MODEL";
    pub const CLAUDE_MAX_TOKENS: &str = "CLAUDE_MAX_TOKENS";
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    pub const OPENAI_MAX_TOKENS: &str = "OPENAI_MAX_TOKENS";
    pub const CURSOR_MODEL: &str = "CURSOR_MODEL";
    pub const CURSOR_MAX_TOKENS: &str = "CURSOR_MAX_TOKENS";
    pub const CURSOR_ENDPOINT: &str = "CURSOR_ENDPOINT";

    pub const DEFAULT_TEMPERATURE: &str = "DEFAULT_TEMPERATURE";
    pub const TEMPLATES_DIR: &str = "PROMPT_ROUTER_TEMPLATES_DIR";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
    pub const DEFAULT_CURSOR_MODEL: &str = "cursor-default";
    pub const UNIVERSAL_MODEL: &str = "any";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const CLAUDE_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
    pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const CURSOR_ENDPOINT: &str = "localhost:8080";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const MAX_TOKENS: u32 = 4000;
    pub const TEMPERATURE: f32 = 0.7;
    pub const LOG_LEVEL: &str = "info";
    pub const HISTORY_LIMIT: usize = 50;
    pub const CACHE_TTL_HOURS: i64 = 24;
    pub const CACHE_MAX_ENTRIES: usize = 1000;
}

// ─── Pricing ──────────────────────────────────────────────────────────────────

/// Rough USD cost per 1k tokens, used only for estimates.
pub mod pricing {
    pub const CLAUDE_PER_1K: f64 = 0.015;
    pub const OPENAI_PER_1K: f64 = 0.030;
    pub const CURSOR_PER_1K: f64 = 0.0;
    pub const UNIVERSAL_PER_1K: f64 = 0.020;
}

// ─── Paths ────────────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "prompt-router";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const LOGS_DIR: &str = "logs";
    pub const LOG_FILE_PREFIX: &str = "prompt_router_";
    pub const CACHE_DIR: &str = "cache";
    pub const CACHE_FILE: &str = "prompt_cache.json";
    pub const REPORTS_DIR: &str = "batch_reports";
}
