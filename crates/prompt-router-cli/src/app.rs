use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use prompt_router_core::batch::{self, BatchItem};
use prompt_router_core::llm::{ApiClient, ApiResponse};
use prompt_router_core::{LlmRouter, PipelineOptions, RouteTarget, RoutingResult};

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "prompt-router")]
#[command(about = "Prompt Router - optimize prompts and route them to the right LLM")]
#[command(version)]
pub struct Cli {
    /// Prompt text to route
    #[arg(
        short,
        long,
        conflicts_with = "interactive",
        required_unless_present_any = [
            "interactive", "compare", "batch_csv", "batch_json",
            "cache_stats", "clear_cache", "init_config",
        ]
    )]
    pub input: Option<String>,

    /// Target provider (claude, openai, cursor, universal, auto)
    #[arg(short, long, default_value = "auto", value_parser = parse_target)]
    pub target: RouteTarget,

    /// Apply provider-specific optimization before routing
    #[arg(short, long)]
    pub optimize: bool,

    /// Send the routed prompt to the provider
    #[arg(short, long)]
    pub send: bool,

    /// Text for the template's context slot
    #[arg(short, long)]
    pub context: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long)]
    pub json: bool,

    /// Write the output to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Include optimization statistics
    #[arg(long)]
    pub stats: bool,

    /// Include a rough cost estimate
    #[arg(long)]
    pub estimate_cost: bool,

    /// Include a prompt analysis (quality scores and suggestions)
    #[arg(long)]
    pub analyze: bool,

    /// Compare two prompts (text or file paths)
    #[arg(long, num_args = 2, value_names = ["A", "B"])]
    pub compare: Option<Vec<String>>,

    /// Route every prompt in a CSV file (needs a `prompt` column)
    #[arg(long)]
    pub batch_csv: Option<PathBuf>,

    /// Route every prompt in a JSON file
    #[arg(long)]
    pub batch_json: Option<PathBuf>,

    /// Also export batch results as CSV
    #[arg(long, value_name = "CSV")]
    pub batch_export: Option<PathBuf>,

    /// Reuse routing results from the on-disk cache
    #[arg(long)]
    pub enable_cache: bool,

    /// Show cache statistics
    #[arg(long)]
    pub cache_stats: bool,

    /// Remove all cached results
    #[arg(long)]
    pub clear_cache: bool,

    /// Read prompts line by line with slash commands
    #[arg(long)]
    pub interactive: bool,

    /// Directory with template overrides
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,

    /// Write a default config file if none exists
    #[arg(long)]
    pub init_config: bool,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    pub fn has_batch(&self) -> bool {
        self.batch_csv.is_some() || self.batch_json.is_some()
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            optimize: self.optimize,
            context: self.context.clone(),
        }
    }
}

fn parse_target(s: &str) -> std::result::Result<RouteTarget, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Send a routed prompt through `client`. A provider without an API key is
/// rejected before the client is called.
pub async fn send_routed(
    router: &LlmRouter,
    result: &RoutingResult,
    client: &dyn ApiClient,
) -> prompt_router_core::error::Result<ApiResponse> {
    router.require_available(result.target_provider)?;
    client
        .send(&result.optimized_prompt, result.target_provider)
        .await
}

/// A `--compare` argument is read as a file when one exists at that path,
/// otherwise it is the prompt text itself.
pub fn prompt_from_arg(arg: &str) -> Result<String> {
    let path = Path::new(arg);
    if path.is_file() {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    } else {
        Ok(arg.to_string())
    }
}

/// Items from `--batch-csv` and `--batch-json`, CSV first.
pub fn load_batch_items(csv: Option<&Path>, json: Option<&Path>) -> Result<Vec<BatchItem>> {
    let mut items = Vec::new();
    if let Some(path) = csv {
        items.extend(
            batch::load_csv(path).with_context(|| format!("loading {}", path.display()))?,
        );
    }
    if let Some(path) = json {
        items.extend(
            batch::load_json(path).with_context(|| format!("loading {}", path.display()))?,
        );
    }
    Ok(items)
}

/// Print `text`, or write it to `output` when given.
pub fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Output written to {}", path.display());
            println!("Output written to {}", path.display());
        }
        None => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
