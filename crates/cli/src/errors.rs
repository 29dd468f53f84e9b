//! CLI error types reported through miette

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error types with enhanced diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Invalid value for '{argument}': {message}")]
    #[diagnostic(
        code(cubx::cli::invalid_argument),
        help("Pass a JSON array literal or a path to a file containing one")
    )]
    InvalidArgument { argument: String, message: String },

    #[error("'{argument}' is not valid JSON")]
    #[diagnostic(
        code(cubx::cli::invalid_json),
        help("Pass a JSON array literal or a path to a file containing one")
    )]
    InvalidJson {
        argument: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {}", path.display())]
    #[diagnostic(
        code(cubx::cli::file_error),
        help("Check file permissions and ensure the path exists")
    )]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tracing initialization failed: {message}")]
    #[diagnostic(
        code(cubx::cli::tracing_error),
        help("Check the RUST_LOG environment variable")
    )]
    TracingError { message: String },

    #[error("Failed to render output")]
    #[diagnostic(code(cubx::cli::output_error))]
    OutputError {
        #[from]
        source: serde_json::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolution(#[from] cubx_resolver::Error),
}

impl CliError {
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub fn tracing(message: impl Into<String>) -> Self {
        Self::TracingError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn test_invalid_argument_display() {
        let error = CliError::invalid_argument("rootDependencies", "expected a JSON array");
        assert_eq!(
            error.to_string(),
            "Invalid value for 'rootDependencies': expected a JSON array"
        );
        assert_eq!(
            error.code().map(|c| c.to_string()),
            Some("cubx::cli::invalid_argument".to_string())
        );
    }

    #[test]
    fn test_resolution_error_is_transparent() {
        let error = CliError::from(cubx_resolver::Error::ArtifactNotFound {
            webpackage_id: "package1@1.0.0".to_string(),
            artifact_id: "util9".to_string(),
        });
        assert!(error.to_string().contains("util9"));
        assert_eq!(
            error.code().map(|c| c.to_string()),
            Some("cubx::resolver::artifact_not_found".to_string())
        );
    }
}
