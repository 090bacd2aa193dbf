use std::path::PathBuf;
use thiserror::Error;


#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication Error: {0}")]
    Authentication(String),

    #[error("Rate Limit Error: {0}")]
    RateLimited(String),

    #[error("HTTP Request Error: {0}")]
    Network(String),

    #[error("LLM Service Error: {0}")]
    Remote(String),

    #[error("JSON Serialization/Deserialization Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM Response Parsing Error: {0}")]
    ResponseParsing(String),

    #[error("Unsafe Path Error: refusing to write '{0}'")]
    UnsafePath(PathBuf),

    #[error("Entry file '{0}' is not present in the working directory.")]
    MissingEntryFile(PathBuf),

    #[error("Unsupported Language Error: no toolchain registered for extension '{0}'")]
    UnsupportedLanguage(String),
}
