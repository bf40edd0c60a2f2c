//! Logical packet model shared by gateways and logic nodes.
//!
//! A [`LogicPkt`] is what the routing core sees after the transport has
//! decoded and unmasked a [`frame::Frame`]: a [`Header`] carrying the command,
//! correlation sequence, flag, status and ordered metadata, followed by an
//! opaque body that is only decoded on demand.

pub mod error;
pub mod frame;
pub mod header;
pub mod packet;

pub use {
    error::{MetaError, ProtocolError},
    header::{Flag, Header, Meta, MetaValue, Status},
    packet::{ErrorResp, LogicPkt},
};

/// Metadata key naming the gateway node that owns the sender's channel.
pub const META_DEST_SERVER: &str = "dest.server";

/// Tag attached to sessions derived from packet metadata rather than supplied
/// by the connection layer.
pub const TAG_AUTO_GENERATED: &str = "AutoGenerated";
