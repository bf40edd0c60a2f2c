use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MetaError;

/// Direction of a packet relative to the request that caused it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    #[default]
    Request,
    Response,
    Push,
}

/// Response status code.
///
/// Stored as a bare code on the wire so codes this build does not know about
/// survive a round trip through a gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(pub u32);

impl Status {
    pub const INVALID_COMMAND: Self = Self(103);
    pub const INVALID_PACKET_BODY: Self = Self(101);
    pub const NOT_IMPLEMENTED: Self = Self(301);
    pub const NO_DESTINATION: Self = Self(100);
    pub const SESSION_NOT_FOUND: Self = Self(404);
    pub const SUCCESS: Self = Self(0);
    pub const SYSTEM_EXCEPTION: Self = Self(300);
    pub const UNAUTHORIZED: Self = Self(105);

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "Success",
            Self::NO_DESTINATION => "NoDestination",
            Self::INVALID_PACKET_BODY => "InvalidPacketBody",
            Self::INVALID_COMMAND => "InvalidCommand",
            Self::UNAUTHORIZED => "Unauthorized",
            Self::SYSTEM_EXCEPTION => "SystemException",
            Self::NOT_IMPLEMENTED => "NotImplemented",
            Self::SESSION_NOT_FOUND => "SessionNotFound",
            _ => return None,
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}({})", self.0),
            None => write!(f, "Status({})", self.0),
        }
    }
}

/// A metadata value. Only the shapes carried by real packets are modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl MetaValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// One metadata entry. Entries keep insertion order and keys may repeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub key: String,
    pub value: MetaValue,
}

/// Packet header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub command: String,
    /// Channel the packet originated from.
    pub channel_id: String,
    /// Correlation id linking a response back to its request.
    pub sequence: u32,
    pub flag: Flag,
    pub status: Status,
    pub dest: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<Meta>,
}

impl Header {
    /// First metadata value stored under `key`.
    pub fn get_meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.iter().find(|m| m.key == key).map(|m| &m.value)
    }

    /// First metadata value under `key`, which must be a string.
    pub fn meta_str(&self, key: &str) -> Result<&str, MetaError> {
        match self.get_meta(key) {
            Some(MetaValue::Str(s)) => Ok(s),
            Some(other) => Err(MetaError::WrongType {
                key: key.to_string(),
                expected: "string",
                found: other.kind(),
            }),
            None => Err(MetaError::Missing(key.to_string())),
        }
    }

    pub fn add_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.push(Meta {
            key: key.into(),
            value: value.into(),
        });
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "command:{} channel:{} seq:{} flag:{:?} status:{}",
            self.command, self.channel_id, self.sequence, self.flag, self.status
        )
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn meta_str_returns_first_match() {
        let mut header = Header::default();
        header.add_meta("dest.server", "g1");
        header.add_meta("dest.server", "g2");
        assert_eq!(header.meta_str("dest.server"), Ok("g1"));
    }

    #[test]
    fn meta_str_missing_key() {
        let header = Header::default();
        assert_eq!(
            header.meta_str("dest.server"),
            Err(MetaError::Missing("dest.server".into()))
        );
    }

    #[rstest]
    #[case(MetaValue::Int(7))]
    #[case(MetaValue::Float(1.5))]
    fn meta_str_rejects_non_string(#[case] value: MetaValue) {
        let mut header = Header::default();
        header.add_meta("dest.server", value);
        assert!(matches!(
            header.meta_str("dest.server"),
            Err(MetaError::WrongType { expected: "string", .. })
        ));
    }

    #[rstest]
    #[case(Status::SUCCESS, "Success(0)")]
    #[case(Status::NOT_IMPLEMENTED, "NotImplemented(301)")]
    #[case(Status(999), "Status(999)")]
    fn status_display(#[case] status: Status, #[case] expected: &str) {
        assert_eq!(status.to_string(), expected);
    }

    #[test]
    fn header_display_is_one_line() {
        let header = Header {
            command: "chat.talk".into(),
            channel_id: "c1".into(),
            sequence: 9,
            flag: Flag::Push,
            ..Header::default()
        };
        assert_eq!(
            header.to_string(),
            "command:chat.talk channel:c1 seq:9 flag:Push status:Success(0)"
        );
    }

    #[test]
    fn unknown_status_survives_json() {
        let json = serde_json::to_string(&Status(777)).unwrap();
        assert_eq!(json, "777");
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Status(777));
    }
}
