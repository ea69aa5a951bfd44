//! # Design
//!
//! - Constant messages; the failing endpoint travels as a field so callers can
//!   name it to the user.

use thiserror::Error;

/// Result alias for inpainting server calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors produced while talking to the inpainting server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or its body could not be read.
    #[error("inpainting server request failed")]
    Transport {
        /// Endpoint that was called.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("inpainting server returned an error status")]
    Status {
        /// Endpoint that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },
    /// The base URL could not be built or joined.
    #[error("invalid inpainting server url")]
    InvalidUrl {
        /// Offending URL text.
        value: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build http client")]
    Build {
        /// Underlying builder error.
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Endpoint named by the failure, when the failure concerns a request.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Transport { endpoint, .. } | Self::Status { endpoint, .. } => Some(endpoint),
            Self::InvalidUrl { .. } | Self::Build { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn status_errors_name_their_endpoint() {
        let err = ClientError::Status {
            endpoint: "http://localhost:7458/api/v1/inpaint".to_string(),
            status: 500,
        };
        assert_eq!(err.to_string(), "inpainting server returned an error status");
        assert_eq!(err.endpoint(), Some("http://localhost:7458/api/v1/inpaint"));
        assert!(err.source().is_none());
    }

    #[test]
    fn url_errors_keep_their_source() {
        let source = match url::Url::parse("not a url") {
            Err(source) => source,
            Ok(_) => url::ParseError::EmptyHost,
        };
        let err = ClientError::InvalidUrl {
            value: "not a url".to_string(),
            source,
        };
        assert!(err.source().is_some());
        assert_eq!(err.endpoint(), None);
    }
}
