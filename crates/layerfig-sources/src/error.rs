/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

use layerfig::ConfigError;
use layerfig_value::ValueError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Unsupported configuration format '{extension}': {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid INI in {}: {source}", path.display())]
    Ini {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },

    #[error("Unsupported value in {}: {source}", path.display())]
    Value {
        path: PathBuf,
        #[source]
        source: ValueError,
    },

    #[error("Top level of {} must be a mapping, found {kind}", path.display())]
    NotAMapping { path: PathBuf, kind: &'static str },
}

/// Errors raised while building or using a [`Metaconf`](crate::Metaconf).
#[derive(Debug, Error)]
pub enum MetaconfError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Invalid meta-configuration {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("No evaluator registered as '{identifier}'")]
    UnknownEvaluator { identifier: String },

    #[error("Invalid parameters for evaluator '{identifier}': {source}")]
    EvaluatorParams {
        identifier: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, MetaconfError>;
