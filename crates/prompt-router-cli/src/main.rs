use anyhow::{bail, Context, Result};
use clap::Parser;

use prompt_router_core::llm::{estimate_cost, PlaceholderClient};
use prompt_router_core::{
    BatchOptions, BatchProcessor, PromptAnalyzer, PromptCache, PromptPipeline, ProviderId,
    RouteTarget, Settings,
};

mod app;
mod commands;
mod interactive;
mod logging;
mod output;

use app::Cli;
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut settings, config_issue) = Settings::load().context("failed to load settings")?;
    if let Some(ref dir) = cli.templates_dir {
        settings.templates_dir = Some(dir.clone());
    }
    if cli.enable_cache {
        settings.cache.enabled = true;
    }

    logging::init(&settings.log)?;
    if let Some(issue) = config_issue {
        tracing::warn!("Using default settings: {issue}");
    }
    tracing::info!("Prompt Router v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli, &settings).await {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let format = cli.output_format();
    let out_path = cli.output.as_deref();

    if cli.init_config {
        let path = Settings::config_path();
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        let path = Settings::default().save()?;
        println!("Wrote default settings to {}", path.display());
        return Ok(());
    }

    if cli.cache_stats || cli.clear_cache {
        let cache = PromptCache::open(&settings.cache);
        if cli.clear_cache {
            println!("Cleared {} cached results", cache.clear()?);
        }
        if cli.cache_stats {
            app::emit(&output::render_cache_stats(&cache.stats(), format)?, out_path)?;
        }
        if cli.input.is_none() && cli.compare.is_none() && !cli.has_batch() && !cli.interactive {
            return Ok(());
        }
    }

    if let Some([a, b]) = cli.compare.as_deref() {
        let target = match cli.target {
            RouteTarget::Provider(id) => id,
            RouteTarget::Auto => ProviderId::Universal,
        };
        let comparison = PromptAnalyzer::new().compare(
            &app::prompt_from_arg(a)?,
            &app::prompt_from_arg(b)?,
            target,
        );
        app::emit(&output::render_comparison(&comparison, format)?, out_path)?;
        return Ok(());
    }

    let pipeline = PromptPipeline::from_settings(settings)?;
    let outcome = dispatch(cli, settings, &pipeline, format).await;

    if let Some(cache) = pipeline.cache() {
        cache.save().context("failed to save the result cache")?;
    }
    outcome
}

async fn dispatch(
    cli: &Cli,
    settings: &Settings,
    pipeline: &PromptPipeline,
    format: OutputFormat,
) -> Result<()> {
    let out_path = cli.output.as_deref();

    if cli.interactive {
        let mut session = interactive::Session::new(cli.target, cli.optimize, cli.context.clone());
        let stdin = std::io::stdin();
        return interactive::run(pipeline, &mut session, stdin.lock(), std::io::stdout());
    }

    if cli.has_batch() {
        let items = app::load_batch_items(cli.batch_csv.as_deref(), cli.batch_json.as_deref())?;
        let options = BatchOptions {
            default_target: cli.target,
            pipeline: cli.pipeline_options(),
            analyze: cli.analyze,
        };
        let report = BatchProcessor::new(pipeline, options).process(&items);

        let saved = report.save_json(&settings.batch.reports_dir())?;
        tracing::info!("Batch report saved to {}", saved.display());
        if let Some(ref path) = cli.batch_export {
            report.export_csv(path)?;
            tracing::info!("Batch results exported to {}", path.display());
        }
        return app::emit(&output::render_batch(&report, format)?, out_path);
    }

    let input = cli
        .input
        .as_deref()
        .context("--input is required for a single prompt")?;

    let result = pipeline.run(input, cli.target, &cli.pipeline_options())?;

    let mut report = output::Report::new(&result);
    if cli.stats {
        report.stats = Some(pipeline.optimizer().stats(input, &result.optimized_prompt));
    }
    if cli.estimate_cost {
        report.cost = Some(estimate_cost(&result.optimized_prompt, result.target_provider));
    }
    if cli.analyze {
        report.analysis = Some(PromptAnalyzer::new().analyze(input, result.target_provider));
    }
    app::emit(&output::render(&report, format)?, out_path)?;

    if cli.send {
        let client = PlaceholderClient::new();
        let response = app::send_routed(pipeline.router(), &result, &client).await?;
        println!("{}", response.content);
    }

    tracing::info!(
        "Completed: {} via {}",
        result.target_provider,
        result.template_used
    );
    Ok(())
}
