//! Domain error types.

/// Top-level error type for swingbook.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TrackerError> for std::process::ExitCode {
    fn from(err: &TrackerError) -> Self {
        let code: u8 = match err {
            TrackerError::Io(_) => 1,
            TrackerError::ConfigParse { .. }
            | TrackerError::ConfigMissing { .. }
            | TrackerError::ConfigInvalid { .. } => 2,
            TrackerError::Database { .. } | TrackerError::DatabaseQuery { .. } => 3,
            TrackerError::Validation { .. } | TrackerError::Conflict { .. } => 4,
            TrackerError::NotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
