//! # Design
//!
//! - Classify remote failures by typed HTTP status so absence (404) is a branch, not a string match.
//! - Keep messages short while carrying operation context in fields.
//! - Preserve source errors for the caller's error chain.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for management operations.
pub type EdgeResult<T> = Result<T, EdgeError>;

/// Errors produced while talking to the management API or packaging bundles.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// The management API answered with a non-success status.
    #[error("management request {operation} returned status {status}: {body}")]
    Status {
        /// Operation that issued the request.
        operation: &'static str,
        /// HTTP status returned by the server.
        status: StatusCode,
        /// Response body, kept verbatim for diagnostics.
        body: String,
    },
    /// The request could not be sent or the connection failed.
    #[error("management request failed")]
    Transport {
        /// Operation that issued the request.
        operation: &'static str,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The response body could not be decoded.
    #[error("management response could not be decoded")]
    Decode {
        /// Operation whose response failed to decode.
        operation: &'static str,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// A configured URL failed to parse.
    #[error("invalid URL")]
    InvalidUrl {
        /// Offending value.
        value: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// A configured URL cannot carry path segments.
    #[error("URL cannot be used as a base")]
    UrlNotBase {
        /// Offending value.
        value: String,
    },
    /// Authentication could not be established.
    #[error("authentication failed")]
    Authentication {
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// Proxy bundle source was unusable.
    #[error("invalid proxy bundle")]
    Bundle {
        /// Path involved in the failure.
        path: PathBuf,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// IO failures while packaging a bundle.
    #[error("proxy bundle io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Directory traversal failures while packaging a bundle.
    #[error("proxy bundle walkdir failure")]
    Walkdir {
        /// Path involved in the traversal failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Zip archive failures while packaging a bundle.
    #[error("proxy bundle zip failure")]
    Zip {
        /// Operation that triggered the archive failure.
        operation: &'static str,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// A developer app carried no credential pair.
    #[error("developer app has no credentials")]
    MissingCredentials {
        /// App name.
        app: String,
    },
    /// A proxy reported no deployable revision.
    #[error("proxy has no revisions")]
    NoRevision {
        /// Proxy name.
        proxy: String,
    },
    /// A key expiry string could not be parsed.
    #[error("invalid key expiry")]
    InvalidExpiry {
        /// Offending value.
        value: String,
    },
}

impl EdgeError {
    /// Build a status error.
    #[must_use]
    pub fn status(operation: &'static str, status: StatusCode, body: impl Into<String>) -> Self {
        Self::Status {
            operation,
            status,
            body: body.into(),
        }
    }

    pub(crate) const fn transport(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { operation, source }
    }

    pub(crate) const fn decode(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Decode { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn bundle(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        Self::Bundle {
            path: path.into(),
            reason,
        }
    }

    /// HTTP status carried by the error, if the server answered.
    #[must_use]
    pub const fn http_status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported the resource as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(StatusCode::NOT_FOUND)
    }

    /// Operation identifier recorded on request-level failures.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Status { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Io { operation, .. }
            | Self::Zip { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn not_found_is_classified_by_status_not_body() {
        let absent = EdgeError::status("products.list", StatusCode::NOT_FOUND, "");
        assert!(absent.is_not_found());

        let misleading = EdgeError::status(
            "products.list",
            StatusCode::INTERNAL_SERVER_ERROR,
            "bad status: 404",
        );
        assert!(!misleading.is_not_found());
        assert_eq!(
            misleading.http_status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn non_status_errors_have_no_http_status() {
        let err = EdgeError::bundle("/tmp/missing", "no apiproxy directory found");
        assert!(!err.is_not_found());
        assert!(err.http_status().is_none());
        assert!(err.operation().is_none());
    }

    #[test]
    fn io_helper_preserves_source_and_operation() {
        let err = EdgeError::io("bundle.read", "apiproxy/a.xml", io::Error::other("io"));
        assert!(err.source().is_some());
        assert_eq!(err.operation(), Some("bundle.read"));
    }

    #[test]
    fn status_message_includes_operation_code_and_body() {
        let err = EdgeError::status("apis.get", StatusCode::FORBIDDEN, "denied");
        assert_eq!(
            err.to_string(),
            "management request apis.get returned status 403 Forbidden: denied"
        );
    }
}
