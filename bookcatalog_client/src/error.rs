use reqwest::StatusCode;

/// Outcome of a failed call to the book-catalog service
#[derive(thiserror::Error, Debug)]
pub enum BookCatalogError {
    /// The server answered, but with a status the operation does not accept
    #[error("Http request to {target} failed with status code {status}")]
    Status { target: String, status: u16 },

    /// The request could not be completed (connection, timeout, body read)
    #[error("Http request to {target} could not be completed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    /// The server answered with a body that is not the expected JSON
    #[error("Failed to decode response from {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BookCatalogError {
    pub(crate) fn status(target: &str, status: StatusCode) -> Self {
        Self::Status {
            target: target.to_string(),
            status: status.as_u16(),
        }
    }

    pub(crate) fn transport(target: &str, source: impl Into<reqwest_middleware::Error>) -> Self {
        Self::Transport {
            target: target.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn decode(target: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            target: target.to_string(),
            source,
        }
    }

    /// Request target the failure relates to
    pub fn target(&self) -> &str {
        match self {
            Self::Status { target, .. }
            | Self::Transport { target, .. }
            | Self::Decode { target, .. } => target,
        }
    }

    /// Status code for status failures, None otherwise
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Only 503 Service Unavailable is worth reissuing the same request for
    pub fn is_transient(&self) -> bool {
        self.status_code() == Some(StatusCode::SERVICE_UNAVAILABLE.as_u16())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                source: reqwest_middleware::Error::Reqwest(err),
                ..
            } if err.is_timeout()
        )
    }
}
