use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems. Surfaced at startup, never converted into
/// fallback text.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key not configured: set {env_var} or pass --api-key")]
    MissingApiKey { env_var: &'static str },

    #[error("Template directory {} is not readable: {source}", .path.display())]
    TemplateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template `{name}` is invalid: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Template `{name}` does not embed the user question")]
    TemplateMissingQuestion { name: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("Still waiting for the previous reply")]
    ReplyPending,
}
