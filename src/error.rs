use std::path::PathBuf;

use crate::request::OperationKind;

/// Errors returned by [`ImageConverterClient`](crate::ImageConverterClient).
///
/// Call-scoped variants carry the operation that failed, and I/O variants the
/// path involved, so a failure can be diagnosed without re-running it.
#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    #[error("API key is missing. Please provide it or set the RAPIDAPI_KEY environment variable.")]
    MissingApiKey,
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("Credentials cannot be sent as a header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("URL parsing failed: {0}")]
    UrlParseFailed(#[from] url::ParseError),
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request failed local validation; nothing was read or sent.
    #[error("{operation}: invalid request: {reason}")]
    InvalidRequest {
        operation: OperationKind,
        reason: String,
    },
    /// The HTTP exchange could not complete (DNS, connect, reset, timeout).
    #[error("{operation}: network request failed: {source}")]
    Transport {
        operation: OperationKind,
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-2xx status or `success != true`.
    #[error("{operation}: API request failed{}: {message}", status_suffix(.status))]
    Remote {
        operation: OperationKind,
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },
    #[error("{operation}: failed to parse API response: {source}")]
    MalformedResponse {
        operation: OperationKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{operation}: API reported success but the response has no {field}")]
    IncompleteResponse {
        operation: OperationKind,
        field: &'static str,
    },
    #[error("{operation}: image payload is not valid base64: {source}")]
    Decode {
        operation: OperationKind,
        #[source]
        source: base64::DecodeError,
    },
    /// Reading the source or writing the destination failed.
    #[error("{operation}: file I/O error on {}: {source}", .path.display())]
    LocalIo {
        operation: OperationKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation}: cancelled before completion")]
    Cancelled { operation: OperationKind },
}

impl ConverterError {
    /// The operation this error belongs to, if it was raised by a call.
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Self::InvalidRequest { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Remote { operation, .. }
            | Self::MalformedResponse { operation, .. }
            | Self::IncompleteResponse { operation, .. }
            | Self::Decode { operation, .. }
            | Self::LocalIo { operation, .. }
            | Self::Cancelled { operation } => Some(*operation),
            _ => None,
        }
    }

    /// `true` when the network call timed out rather than failing outright.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    pub(crate) fn invalid(operation: OperationKind, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn local_io(
        operation: OperationKind,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::LocalIo {
            operation,
            path: path.into(),
            source,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}
