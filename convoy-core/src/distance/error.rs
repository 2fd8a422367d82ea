use thiserror::Error;

/// Errors raised while building a distance matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistanceMatrixError {
    /// No coordinates were provided.
    #[error("at least one coordinate is required")]
    EmptyInput,

    /// A single origin row would already exceed the per-call element limit.
    #[error(
        "{locations} locations cannot be batched under a limit of {max_elements} elements per call"
    )]
    ElementLimitExceeded {
        /// Number of coordinates in the request.
        locations: usize,
        /// Provider limit on origins times destinations.
        max_elements: usize,
    },

    /// A network error occurred while contacting the provider.
    #[error("network error contacting {url}: {message}")]
    NetworkError {
        /// The request URL, with credentials removed.
        url: String,
        /// Description of the underlying error.
        message: String,
    },

    /// The provider did not respond in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// The request URL, with credentials removed.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The provider returned a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// The request URL, with credentials removed.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Description of the failure.
        message: String,
    },

    /// The provider answered but reported a failure status.
    #[error("distance service error {code}: {message}")]
    ServiceError {
        /// Status code reported by the service.
        code: String,
        /// Message reported by the service, if any.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to parse distance response: {message}")]
    ParseError {
        /// Description of the decoding failure.
        message: String,
    },

    /// The response decoded but its shape or contents were wrong.
    #[error("malformed distance response: {message}")]
    MalformedResponse {
        /// What was wrong with the response.
        message: String,
    },
}

impl DistanceMatrixError {
    /// Whether the response arrived but did not describe a usable matrix.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::ParseError { .. } | Self::MalformedResponse { .. })
    }

    /// Whether the provider call itself failed.
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. }
                | Self::Timeout { .. }
                | Self::HttpError { .. }
                | Self::ServiceError { .. }
        )
    }
}
