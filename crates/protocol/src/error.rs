use thiserror::Error;

/// Failures encoding or decoding packets and packet bodies.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body bytes could not be decoded into the requested message.
    #[error("invalid packet body for {command}: {source}")]
    InvalidBody {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode packet: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode packet: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A typed metadata lookup did not find what it expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    #[error("missing metadata: {0}")]
    Missing(String),

    #[error("invalid metadata {key}: expected {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}
