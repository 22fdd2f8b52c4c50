//! Shared CLI error type and the context handed to command handlers.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use quota_edge::ManagementApi;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::demo::DemoConfig;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub enum CliError {
    /// Missing or malformed input; exits with status 2.
    Validation(String),
    /// A remote or local operation failed; exits with status 3.
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    /// Message printed after `error: `, including the full cause chain.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Everything a provision or reset run needs.
#[derive(Clone)]
pub struct AppContext {
    /// Authenticated management session.
    pub api: Arc<dyn ManagementApi>,
    /// Plain client for runtime calls such as the token exchange.
    pub http: Client,
    /// Resolved demo configuration.
    pub config: DemoConfig,
}

/// Build the client used for runtime calls, tagging every request with `trace_id`.
pub(crate) fn runtime_client(timeout: Option<Duration>, trace_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
        CliError::failure(anyhow!("trace identifier contains invalid characters"))
    })?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    let mut builder = Client::builder().default_headers(default_headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}
