use anyhow::Result;
use std::io::{BufRead, Write};

use prompt_router_core::{HistoryEntry, PipelineOptions, PromptHistory, PromptPipeline, RouteTarget};

use crate::commands::{handle_command, CommandResult};
use crate::output::{render_text, Report};

/// What the loop should do after a line.
#[derive(Debug, PartialEq)]
pub enum LineOutcome {
    Print(String),
    Skip,
    Quit,
}

/// State carried between lines of an interactive session.
pub struct Session {
    pub target: RouteTarget,
    pub optimize: bool,
    pub context: Option<String>,
    history: PromptHistory,
}

impl Session {
    pub fn new(target: RouteTarget, optimize: bool, context: Option<String>) -> Self {
        Self {
            target,
            optimize,
            context,
            history: PromptHistory::new(),
        }
    }

    pub fn history(&self) -> &PromptHistory {
        &self.history
    }

    pub fn handle_line(&mut self, pipeline: &PromptPipeline, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Skip;
        }

        match handle_command(line) {
            CommandResult::NotACommand => self.route(pipeline, line),
            CommandResult::Quit => LineOutcome::Quit,
            CommandResult::Message(msg) => LineOutcome::Print(msg),
            CommandResult::SetTarget(target) => {
                self.target = target;
                LineOutcome::Print(format!("Target set to {target}"))
            }
            CommandResult::SetOptimize(value) => {
                self.optimize = value.unwrap_or(!self.optimize);
                LineOutcome::Print(format!(
                    "Optimization {}",
                    if self.optimize { "on" } else { "off" }
                ))
            }
            CommandResult::SetContext(context) => {
                self.context = Some(context);
                LineOutcome::Print("Context set".into())
            }
            CommandResult::ClearContext => {
                self.context = None;
                LineOutcome::Print("Context cleared".into())
            }
            CommandResult::ShowHistory => LineOutcome::Print(self.history_listing()),
            CommandResult::ExportHistory(path) => match self.history.export_json(&path) {
                Ok(()) => LineOutcome::Print(format!(
                    "Exported {} entries to {}",
                    self.history.len(),
                    path.display()
                )),
                Err(e) => LineOutcome::Print(format!("Error: {e}")),
            },
            CommandResult::ClearHistory => {
                let cleared = self.history.len();
                self.history.clear();
                LineOutcome::Print(format!("Cleared {cleared} history entries"))
            }
            CommandResult::ListTemplates => LineOutcome::Print(format!(
                "Templates: {}",
                pipeline.router().available_templates().join(", ")
            )),
            CommandResult::ShowStatus => LineOutcome::Print(self.status(pipeline)),
        }
    }

    fn route(&mut self, pipeline: &PromptPipeline, prompt: &str) -> LineOutcome {
        let options = PipelineOptions {
            optimize: self.optimize,
            context: self.context.clone(),
        };
        match pipeline.run(prompt, self.target, &options) {
            Ok(result) => {
                let text = render_text(&Report::new(&result));
                self.history.push(HistoryEntry::from_result(
                    prompt,
                    self.target,
                    self.optimize,
                    &result,
                ));
                LineOutcome::Print(text)
            }
            Err(e) => {
                tracing::warn!("Routing failed: {e}");
                LineOutcome::Print(format!("Error: {e}"))
            }
        }
    }

    fn history_listing(&self) -> String {
        if self.history.is_empty() {
            return "No prompts routed yet.".into();
        }
        self.history
            .entries()
            .enumerate()
            .map(|(i, entry)| {
                let preview: String = entry.prompt.chars().take(60).collect();
                let route = if entry.requested.is_auto() {
                    format!("{} (auto)", entry.provider)
                } else {
                    entry.provider.to_string()
                };
                format!(
                    "{:>3}. [{}] {} -> {}",
                    i + 1,
                    entry.timestamp.format("%H:%M:%S"),
                    preview,
                    route
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn status(&self, pipeline: &PromptPipeline) -> String {
        let providers = pipeline
            .router()
            .registry()
            .all_providers()
            .iter()
            .map(|p| {
                format!(
                    "  {:<10} {:<24} {}",
                    p.id.as_str(),
                    p.model,
                    if p.available { "available" } else { "no API key" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Target:       {}\nOptimization: {}\nContext:      {}\nHistory:      {} entries\nProviders:\n{}",
            self.target,
            if self.optimize { "on" } else { "off" },
            self.context.as_deref().unwrap_or("(none)"),
            self.history.len(),
            providers
        )
    }
}

/// Read lines from `input` until EOF or `/quit`.
pub fn run<R: BufRead, W: Write>(
    pipeline: &PromptPipeline,
    session: &mut Session,
    input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "Prompt Router interactive mode. Type /help for commands.")?;
    write!(output, "> ")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        match session.handle_line(pipeline, &line) {
            LineOutcome::Quit => break,
            LineOutcome::Print(text) => writeln!(output, "{text}")?,
            LineOutcome::Skip => {}
        }
        write!(output, "> ")?;
        output.flush()?;
    }

    tracing::info!(
        "Interactive session ended after {} prompts",
        session.history().len()
    );
    Ok(())
}
