use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Invalid target '{0}'. Expected one of: claude, openai, cursor, universal")]
    InvalidTarget(String),

    #[error("Prompt is empty after normalization")]
    EmptyPrompt,

    #[error("No provider available: {0}")]
    NoProviderAvailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {template}: {message}")]
    TemplateFormat { template: String, message: String },

    #[error("Not implemented yet: {0}")]
    NotImplemented(String),

    #[error("Batch error: {0}")]
    Batch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RouterError {
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateFormat {
            template: template.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
