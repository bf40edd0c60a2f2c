//! Transport frame contract.
//!
//! The byte-level reader/writer lives with the transport. What the routing
//! core relies on is only this: client frames arrive masked with a 4-byte key
//! and are unmasked before their payload is parsed, server frames go out
//! unmasked.

use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x0 => Self::Continuation,
            0x1 => Self::Text,
            0x2 => Self::Binary,
            0x8 => Self::Close,
            0x9 => Self::Ping,
            0xA => Self::Pong,
            other => return Err(other),
        })
    }
}

/// A single transport frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    op_code: OpCode,
    mask: Option<[u8; 4]>,
    payload: Bytes,
}

impl Frame {
    /// A frame read from a client, still masked with `mask`.
    pub fn client(op_code: OpCode, mask: [u8; 4], payload: impl Into<Bytes>) -> Self {
        Self {
            op_code,
            mask: Some(mask),
            payload: payload.into(),
        }
    }

    /// A frame written by the server. Never masked.
    pub fn server(op_code: OpCode, payload: impl Into<Bytes>) -> Self {
        Self {
            op_code,
            mask: None,
            payload: payload.into(),
        }
    }

    pub fn op_code(&self) -> OpCode {
        self.op_code
    }

    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// The payload with any client mask removed.
    pub fn into_payload(self) -> Bytes {
        match self.mask {
            Some(mask) => Bytes::from(apply_mask(&self.payload, mask)),
            None => self.payload,
        }
    }
}

/// XOR `data` with the rotating 4-byte `mask`. Masking and unmasking are the
/// same operation.
pub fn apply_mask(data: &[u8], mask: [u8; 4]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, b)| b ^ mask[i % 4])
        .collect()
}
