//! CLI error types and exit codes

use joinscope_core::SourceError;
use joinscope_reconciliation::ReconciliationError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication or permission failure at a source
/// - 3: Source unreachable or unavailable
/// - 4: Validation error
/// - 5: Diagnostic checks failed (`doctor`)
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("No device snapshot available. Run 'joinscope refresh' first.")]
    NoSnapshot,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("Reconciliation failed: {0}")]
    Reconciliation(ReconciliationError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("{0}")]
    ChecksFailed(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Source(e) => source_exit_code(e),
            CliError::Validation(_) => 4,
            CliError::ChecksFailed(_) => 5,
            CliError::NoSnapshot
            | CliError::Config(_)
            | CliError::Reconciliation(_)
            | CliError::Io(_)
            | CliError::Export(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {suggestion}");
            } else {
                eprintln!("\nSuggestion: {suggestion}");
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::NoSnapshot => Some("Run 'joinscope refresh' to fetch and reconcile all three sources."),
            CliError::Source(e) if e.is_transient() => {
                Some("The source may be busy or unreachable. Try again in a few moments.")
            }
            CliError::Source(SourceError::AuthenticationFailed { .. }) => {
                Some("Check the bind account or app registration credentials.")
            }
            CliError::Source(SourceError::PermissionDenied { .. }) => Some(
                "Grant Device.Read.All and DeviceManagementManagedDevices.Read.All to the app registration.",
            ),
            CliError::Config(_) => Some("Run 'joinscope doctor' to check the configuration."),
            _ => None,
        }
    }
}

fn source_exit_code(error: &SourceError) -> i32 {
    match error {
        SourceError::AuthenticationFailed { .. } | SourceError::PermissionDenied { .. } => 2,
        SourceError::ConnectionFailed { .. } | SourceError::Unavailable { .. } => 3,
        SourceError::InvalidConfiguration { .. } => 4,
        SourceError::InvalidData { .. } | SourceError::FetchFailed { .. } => 1,
    }
}

impl From<ReconciliationError> for CliError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::NotRefreshed => CliError::NoSnapshot,
            ReconciliationError::Source(source) => CliError::Source(source),
            ReconciliationError::UnknownName { .. } => CliError::Validation(e.to_string()),
            other => CliError::Reconciliation(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Config(format!("JSON error: {e}"))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Config(format!("YAML error: {e}"))
    }
}

impl From<csv::Error> for CliError {
    fn from(e: csv::Error) -> Self {
        CliError::Export(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinscope_core::DeviceSource;

    #[test]
    fn test_not_refreshed_becomes_no_snapshot() {
        let err: CliError = ReconciliationError::NotRefreshed.into();
        assert!(matches!(err, CliError::NoSnapshot));
        assert!(err.to_string().contains("Run 'joinscope refresh' first"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_authentication() {
        let err: CliError = ReconciliationError::Source(SourceError::AuthenticationFailed {
            source_kind: DeviceSource::IdentityService,
            message: "invalid_client".to_string(),
        })
        .into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_unavailable() {
        let err = CliError::Source(SourceError::Unavailable {
            source_kind: DeviceSource::DeviceManagement,
            message: "throttled".to_string(),
        });
        assert_eq!(err.exit_code(), 3);
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_exit_code_validation() {
        let err: CliError = ReconciliationError::UnknownName {
            kind: "category",
            value: "nope".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_exit_code_checks_failed() {
        assert_eq!(CliError::ChecksFailed("2 checks failed".to_string()).exit_code(), 5);
    }
}
