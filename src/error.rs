use thiserror::Error;

#[derive(Debug, Error)]
pub enum DebateError {
    /// Malformed topic or round count; reported before any frame is written.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The peer went away mid-stream. Never reported to the client.
    #[error("client disconnected")]
    ClientDisconnected,

    #[error("failed to encode event: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DebateError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
