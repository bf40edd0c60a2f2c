use thiserror::Error;

use imgate_protocol::{MetaError, ProtocolError};

#[derive(Debug, Error)]
pub enum RouteError {
    /// The sender's session could not be derived from packet metadata.
    /// Nothing about the packet can be trusted after this.
    #[error("cannot resolve session: {0}")]
    Session(#[from] MetaError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// At least one gateway group could not be delivered. `gateway` and
    /// `source` describe the last failure seen; every group was attempted.
    #[error("push to gateway {gateway} failed ({failed} of {attempted} gateways failed): {source}")]
    Delivery {
        gateway: String,
        failed: usize,
        attempted: usize,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, RouteError>;
