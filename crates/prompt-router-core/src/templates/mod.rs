use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use crate::error::{Result, RouterError};
use crate::llm::provider::ProviderId;

const BUILTIN_CLAUDE: &str = include_str!("../../templates/claude_template.txt");
const BUILTIN_OPENAI: &str = include_str!("../../templates/openai_template.txt");
const BUILTIN_CURSOR: &str = include_str!("../../templates/cursor_template.txt");
const BUILTIN_UNIVERSAL: &str = include_str!("../../templates/universal_template.txt");

/// A placeholder a template can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `{prompt}`: the prompt body. Required.
    Body,
    /// `{context}`: optional role/context text.
    Context,
}

impl Slot {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim() {
            "prompt" => Some(Self::Body),
            "context" => Some(Self::Context),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    /// A slot alone on its line owns the line break that follows it
    /// (`\n` or `\r\n`), so an empty value removes the whole line.
    Slot {
        slot: Slot,
        line_end: Option<&'static str>,
    },
}

/// A provider template parsed into literal text and typed slots.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template source. `{{` and `}}` are literal braces.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '{' => {
                    let marker = read_marker(&mut chars)
                        .ok_or_else(|| RouterError::template(&name, "unclosed '{' marker"))?;
                    let slot = Slot::from_marker(&marker).ok_or_else(|| {
                        RouterError::template(&name, format!("unknown placeholder '{{{marker}}}'"))
                    })?;

                    let line_start = if text.is_empty() {
                        matches!(
                            segments.last(),
                            None | Some(Segment::Slot { line_end: Some(_), .. })
                        )
                    } else {
                        text.ends_with('\n')
                    };
                    let line_end = match chars.peek().copied() {
                        Some('\n') if line_start => Some("\n"),
                        Some('\r') if line_start && chars.clone().nth(1) == Some('\n') => {
                            Some("\r\n")
                        }
                        _ => None,
                    };
                    for _ in 0..line_end.map_or(0, str::len) {
                        chars.next();
                    }

                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Slot { slot, line_end });
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err(RouterError::template(&name, "unmatched '}'")),
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        let template = Self { name, segments };
        if !template.has_slot(Slot::Body) {
            return Err(RouterError::template(
                &template.name,
                "missing required {prompt} placeholder",
            ));
        }
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_slot(&self, wanted: Slot) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot { slot, .. } if *slot == wanted))
    }

    /// Merge `body` and optional `context` into the template.
    pub fn render(&self, body: &str, context: Option<&str>) -> String {
        let context = context.map(str::trim).filter(|c| !c.is_empty());
        let mut out = String::with_capacity(body.len() + 256);

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot { slot, line_end } => {
                    let value = match slot {
                        Slot::Body => Some(body),
                        Slot::Context => context,
                    };
                    if let Some(value) = value {
                        out.push_str(value);
                        if let Some(line_end) = line_end {
                            out.push_str(line_end);
                        }
                    }
                }
            }
        }
        out
    }
}

fn read_marker(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut marker = String::new();
    for c in chars.by_ref() {
        match c {
            '}' => return Some(marker),
            '{' | '\n' => return None,
            _ => marker.push(c),
        }
    }
    None
}

/// One parsed template per provider, loaded once at startup.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: Vec<Template>,
}

impl TemplateStore {
    /// The templates compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::load(None)
    }

    /// Load templates, letting `<dir>/<template_name>.txt` override a
    /// built-in one. A missing directory falls back to the built-ins; a
    /// malformed override is an error.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(d) if d.is_dir() => Some(d),
            Some(d) => {
                tracing::warn!(
                    "Templates directory {} not found, using built-in templates",
                    d.display()
                );
                None
            }
            None => None,
        };

        let mut templates = Vec::with_capacity(ProviderId::all().len());
        for id in ProviderId::all() {
            let name = id.template_name();
            let override_path = dir.map(|d| d.join(format!("{name}.txt")));

            let template = match override_path {
                Some(path) if path.is_file() => {
                    let source = std::fs::read_to_string(&path)?;
                    tracing::debug!("Template {} loaded from {}", name, path.display());
                    Template::parse(name, &source)?
                }
                _ => Template::parse(name, builtin_source(*id))?,
            };
            templates.push(template);
        }

        Ok(Self { templates })
    }

    pub fn get(&self, id: ProviderId) -> &Template {
        &self.templates[id.index()]
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names
    }
}

fn builtin_source(id: ProviderId) -> &'static str {
    match id {
        ProviderId::Claude => BUILTIN_CLAUDE,
        ProviderId::OpenAI => BUILTIN_OPENAI,
        ProviderId::Cursor => BUILTIN_CURSOR,
        ProviderId::Universal => BUILTIN_UNIVERSAL,
    }
}
