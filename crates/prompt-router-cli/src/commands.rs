use prompt_router_core::RouteTarget;
use std::path::PathBuf;

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the session.
    Quit,
    /// Route following prompts to this target.
    SetTarget(RouteTarget),
    /// Turn optimization on or off; `None` toggles.
    SetOptimize(Option<bool>),
    /// Fill the template context slot for following prompts.
    SetContext(String),
    ClearContext,
    /// List prompts routed so far.
    ShowHistory,
    /// Write the history to a JSON file.
    ExportHistory(PathBuf),
    ClearHistory,
    ListTemplates,
    /// Show target, optimization, context and provider availability.
    ShowStatus,
    /// Not a command - treat as a prompt.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        "/target" | "/t" => {
            if arg.is_empty() {
                CommandResult::Message(
                    "Targets: auto, claude, openai, cursor, universal\nUsage: /target <name>".into(),
                )
            } else {
                match arg.parse::<RouteTarget>() {
                    Ok(target) => CommandResult::SetTarget(target),
                    Err(e) => CommandResult::Message(format!("{e}")),
                }
            }
        }
        "/optimize" | "/o" => match arg.to_lowercase().as_str() {
            "" => CommandResult::SetOptimize(None),
            "on" | "true" | "yes" => CommandResult::SetOptimize(Some(true)),
            "off" | "false" | "no" => CommandResult::SetOptimize(Some(false)),
            _ => CommandResult::Message("Usage: /optimize [on|off]".into()),
        },
        "/context" => {
            if arg.is_empty() {
                CommandResult::ClearContext
            } else {
                CommandResult::SetContext(arg.to_string())
            }
        }

        "/history" => CommandResult::ShowHistory,
        "/clear" => CommandResult::ClearHistory,
        "/export" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /export <path.json>".into())
            } else {
                CommandResult::ExportHistory(PathBuf::from(arg))
            }
        }
        "/templates" => CommandResult::ListTemplates,
        "/status" => CommandResult::ShowStatus,
        "/version" => CommandResult::Message(format!(
            "Prompt Router v{}",
            env!("CARGO_PKG_VERSION")
        )),

        _ => CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands.")),
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ Prompt Router Commands ───────────────────────────────────────╮

  ROUTING
    /target <name>, /t        Set target (auto, claude, openai, cursor, universal)
    /optimize [on|off], /o    Toggle or set provider-specific optimization
    /context <text>           Fill the template context slot
    /context                  Clear the context

  SESSION
    /history                  List prompts routed this session
    /export <path>            Write the history to a JSON file
    /clear                    Forget the prompts routed so far
    /templates                List loaded templates
    /status                   Show target, optimization and providers

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit

  Any other line is routed with the current settings.

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
