//! Error types for the relay.

use thiserror::Error;

/// Top-level relay error.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors raised while registering types or loading a single configuration entry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No type set")]
    NoType,

    #[error("{kind} type '{name}' is already registered")]
    DuplicateType { kind: &'static str, name: String },

    #[error("Missing required field '{field}' for type '{type_name}'")]
    MissingField { field: String, type_name: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("No argument provider registered for {argument}")]
    MissingArgument { argument: &'static str },

    #[error("Duplicate Endpoint name '{name}'")]
    DuplicateEndpoint { name: String },

    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Instantiation panicked: {message}")]
    Panicked { message: String },
}

/// Runtime failures inside a filter.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Message has no value for '{key}'")]
    MissingValue { key: String },

    #[error("Regex evaluation failed: {message}")]
    Regex { message: String },

    #[error("{filter} filter used before it was loaded")]
    Unloaded { filter: &'static str },
}

/// Failures raised by endpoint hooks.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Delivery failed: {message}")]
    Delivery { message: String },

    #[error("Endpoint hook panicked: {message}")]
    Panicked { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
