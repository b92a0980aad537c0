//! Domain error types.

use std::fmt;

/// A single catalog or schema violation, keyed by the offending parameter or
/// document path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{parameter_key}: {reason}")]
pub struct ValidationError {
    pub parameter_key: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(parameter_key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            parameter_key: parameter_key.into(),
            reason: reason.into(),
        }
    }

    /// Re-key the violation under a parent path, e.g. `percentage` becomes
    /// `entryBlocks[0].actions[1].percentage`.
    pub fn nested(self, prefix: &str) -> Self {
        Self {
            parameter_key: format!("{prefix}.{}", self.parameter_key),
            reason: self.reason,
        }
    }
}

/// Collected violations, rendered one per line.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {err}")?;
        }
        Ok(())
    }
}

/// Top-level error type for kumo.
#[derive(Debug, thiserror::Error)]
pub enum KumoError {
    #[error("strategy {id} not found")]
    NotFound { id: u64 },

    #[error("unknown {kind} '{key}'")]
    CatalogNotFound { kind: &'static str, key: String },

    #[error("unresolved variable reference '{name}'")]
    UnresolvedVariable { name: String },

    #[error("storage read error: {reason}")]
    StorageRead { reason: String },

    #[error("storage write error: {reason}")]
    StorageWrite { reason: String },

    #[error("import error: {reason}")]
    Import { reason: String },

    #[error("export error: {reason}")]
    Export { reason: String },

    #[error("validation failed:\n{0}")]
    Validation(ValidationErrors),

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

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<Vec<ValidationError>> for KumoError {
    fn from(errors: Vec<ValidationError>) -> Self {
        KumoError::Validation(ValidationErrors(errors))
    }
}

impl From<&KumoError> for std::process::ExitCode {
    fn from(err: &KumoError) -> Self {
        let code: u8 = match err {
            KumoError::Io(_) => 1,
            KumoError::ConfigParse { .. }
            | KumoError::ConfigMissing { .. }
            | KumoError::ConfigInvalid { .. } => 2,
            KumoError::StorageRead { .. }
            | KumoError::StorageWrite { .. }
            | KumoError::Database { .. } => 3,
            KumoError::Validation(_) | KumoError::UnresolvedVariable { .. } => 4,
            KumoError::NotFound { .. } | KumoError::CatalogNotFound { .. } => 5,
            KumoError::Import { .. } | KumoError::Export { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
