//! Error taxonomy for the acquisition and reconciliation pipeline.
//!
//! Adapter failures ([`PipelineError::SourceUnavailable`],
//! [`PipelineError::ParseError`]) and [`PipelineError::NoOverlap`] are fatal:
//! the dashboard is never rendered from partial data.
//! [`PipelineError::UnmappedIdentifier`] is recoverable per row and is only
//! ever logged.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Network failure, timeout, or non-success HTTP status.
    SourceUnavailable { source_name: String, reason: String },
    /// The expected table, column, or payload structure was not found.
    ParseError { source_name: String, reason: String },
    /// A source reported an identifier with no canonical country.
    UnmappedIdentifier { source_name: String, identifier: String },
    /// The join produced zero rows.
    NoOverlap { sources: Vec<String> },
    /// Invalid or unreadable configuration.
    Config(String),
    /// Writing an output artifact failed.
    Output { path: String, reason: String },
}

impl PipelineError {
    pub fn unavailable(source_name: &str, reason: impl fmt::Display) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(source_name: &str, reason: impl fmt::Display) -> Self {
        Self::ParseError {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Name of the source that caused the failure, if any.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::SourceUnavailable { source_name, .. }
            | Self::ParseError { source_name, .. }
            | Self::UnmappedIdentifier { source_name, .. } => Some(source_name),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable {
                source_name,
                reason,
            } => write!(f, "source '{source_name}' unavailable: {reason}"),
            Self::ParseError {
                source_name,
                reason,
            } => write!(f, "source '{source_name}': parse error: {reason}"),
            Self::UnmappedIdentifier {
                source_name,
                identifier,
            } => write!(
                f,
                "source '{source_name}': identifier '{identifier}' has no canonical country"
            ),
            Self::NoOverlap { sources } => write!(
                f,
                "no country is present in every source ({}); check the name mappings",
                sources.join(", ")
            ),
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::Output { path, reason } => write!(f, "failed to write '{path}': {reason}"),
        }
    }
}

impl std::error::Error for PipelineError {}
