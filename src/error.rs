//! Typed configuration errors.

use thiserror::Error;

/// Programmer errors raised while generating parsers or assembling a
/// command tree. Always surfaced, never recovered internally.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A task type was bound to the command line without a usable command
    /// name or description.
    #[error("task `{task}` must declare a non-empty command name and description")]
    MissingCommandMetadata { task: &'static str },

    /// A grouping node was declared without a usable label or description.
    #[error("group node `{label}` must have a non-empty label and description")]
    MissingGroupMetadata { label: String },
}
