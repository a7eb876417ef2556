use thiserror::Error;

/// Errors that can occur when creating or mutating filters
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown filter: '{0}'")]
    UnknownFilter(String),

    #[error("Unknown group: '{0}'")]
    UnknownGroup(String),

    #[error("Unknown project: '{0}'")]
    UnknownProject(String),

    #[error("Duplicate project name: '{0}'")]
    DuplicateProject(String),

    #[error("Invalid target '{0}'. Expected 'group:<id>' or 'filter:<id>'")]
    InvalidTarget(String),
}
