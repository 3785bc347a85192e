//! Error types for redline

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for redline operations
#[derive(Debug, Error, Diagnostic)]
pub enum RedlineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Failures surfaced by the overlay loader and the pin store.
///
/// The `Display` output of each variant is what ends up in the view's error
/// banner, so keep it readable.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum FetchError {
    /// Keyword search with nothing to search for. Never reaches the wire.
    #[error("Please enter a keyword")]
    #[diagnostic(code(redline::fetch::empty_keyword))]
    EmptyKeyword,

    /// HTTP 404 with a structured `{message}` body.
    #[error("Bad request: {message}")]
    #[diagnostic(code(redline::fetch::not_found))]
    NotFound { message: String },

    /// 200 response whose envelope says `response_type: "error"`.
    #[error("server error: {message}")]
    #[diagnostic(code(redline::fetch::server))]
    ServerError { message: String },

    /// Transport failure or a non-2xx status other than 404.
    #[error("request failed: {cause}")]
    #[diagnostic(code(redline::fetch::failed))]
    FetchFailed { cause: String },

    /// Body did not have the expected shape.
    #[error("malformed response: {message}")]
    #[diagnostic(
        code(redline::fetch::malformed),
        help("the remote service returned JSON that doesn't match the expected schema")
    )]
    MalformedResponse { message: String },
}

impl FetchError {
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        Self::FetchFailed {
            cause: cause.to_string(),
        }
    }

    pub fn malformed(message: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            message: message.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing required environment variable: {var}")]
    #[diagnostic(
        code(config::missing_env),
        help("Set the {var} environment variable or add it to your .env file")
    )]
    MissingEnv { var: &'static str },

    #[error("invalid configuration value for {field}: {message}")]
    #[diagnostic(code(config::invalid))]
    Invalid { field: &'static str, message: String },

    #[error("failed to parse URL: {url}")]
    #[diagnostic(code(config::url_parse))]
    UrlParse { url: String, message: String },

    #[error("failed to read config file {path}")]
    #[diagnostic(code(config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RedlineError>;
