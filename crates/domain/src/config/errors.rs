use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    FileRead { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Unknown service discovery resolver type: {0}")]
    UnknownResolverKind(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}
