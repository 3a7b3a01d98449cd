use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("completion backend unreachable: {0}")]
    BackendUnavailable(#[source] reqwest::Error),

    #[error("completion backend timed out: {0}")]
    BackendTimeout(#[source] reqwest::Error),

    #[error("completion backend protocol error: {0}")]
    BackendProtocolError(String),
}

impl GatewayError {
    /// Maps a transport-level failure onto the gateway taxonomy. Status and
    /// body problems are classified where the response is inspected.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GatewayError::BackendTimeout(error)
        } else if error.is_connect() {
            GatewayError::BackendUnavailable(error)
        } else {
            GatewayError::BackendProtocolError(error.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog connection failed: {0}")]
    Connection(String),

    #[error("collection read failed for {collection}: {details}")]
    CollectionRead { collection: String, details: String },

    #[error("catalog worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("classification failed: {0}")]
    Classification(#[source] GatewayError),

    #[error("catalog fetch failed: {0}")]
    Store(#[from] StoreError),

    #[error("answer synthesis failed: {0}")]
    Synthesis(#[source] GatewayError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("http client setup failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
