use crate::resolver::ResolveReasonCode;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, emitted in JSON output.
pub mod codes {
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const PACKAGE_JSON_READ_FAILED: &str = "PACKAGE_JSON_READ_FAILED";
    pub const PACKAGE_JSON_INVALID: &str = "PACKAGE_JSON_INVALID";
    pub const DEPENDENCY_NAME_INVALID: &str = "DEPENDENCY_NAME_INVALID";
    pub const RESOLVE_FAILED: &str = "RESOLVE_FAILED";
    pub const COPY_FAILED: &str = "COPY_FAILED";
    pub const OTHER: &str = "OTHER";
}

/// Core error type for extcopy operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read package.json at {path}: {source}")]
    PackageJsonRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse package.json at {path}: {source}")]
    PackageJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid dependency name '{name}' declared in {declared_in}")]
    DependencyNameInvalid { name: String, declared_in: PathBuf },

    #[error("Cannot resolve '{specifier}' from {base_dir}: {reason}")]
    Resolve {
        specifier: String,
        base_dir: PathBuf,
        reason: ResolveReasonCode,
    },

    #[error("Failed to copy '{name}' from {from} to {to}: {source}")]
    Copy {
        name: String,
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// SCREAMING_SNAKE_CASE code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => codes::IO_ERROR,
            Self::PackageJsonRead { .. } => codes::PACKAGE_JSON_READ_FAILED,
            Self::PackageJsonParse { .. } => codes::PACKAGE_JSON_INVALID,
            Self::DependencyNameInvalid { .. } => codes::DEPENDENCY_NAME_INVALID,
            Self::Resolve { .. } => codes::RESOLVE_FAILED,
            Self::Copy { .. } => codes::COPY_FAILED,
            Self::Other(_) => codes::OTHER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_message() {
        let err = Error::Resolve {
            specifier: "left-pad".to_string(),
            base_dir: PathBuf::from("/app"),
            reason: ResolveReasonCode::NodeModulesNotFound,
        };
        let msg = err.to_string();
        assert!(msg.contains("left-pad"));
        assert!(msg.contains("NODE_MODULES_NOT_FOUND"));
        assert_eq!(err.code(), codes::RESOLVE_FAILED);
    }

    #[test]
    fn test_error_codes_uppercase() {
        let all_codes = [
            codes::IO_ERROR,
            codes::PACKAGE_JSON_READ_FAILED,
            codes::PACKAGE_JSON_INVALID,
            codes::DEPENDENCY_NAME_INVALID,
            codes::RESOLVE_FAILED,
            codes::COPY_FAILED,
            codes::OTHER,
        ];

        for code in all_codes {
            assert!(
                code.chars().all(|c| c.is_uppercase() || c == '_'),
                "Error code '{code}' should be SCREAMING_SNAKE_CASE"
            );
        }
    }
}
