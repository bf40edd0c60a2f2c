use std::fmt;

use serde::{Deserialize, Serialize};

use imgate_protocol::TAG_AUTO_GENERATED;

/// Exactly where one recipient's connection terminates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub gate_id: String,
    pub channel_id: String,
}

impl Location {
    pub fn new(gate_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            gate_id: gate_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.gate_id, self.channel_id)
    }
}

/// A connected client.
///
/// `channel_id` + `gate_id` identify one live connection. Tags are advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub channel_id: String,
    pub gate_id: String,
    pub account: String,
    pub zone: String,
    pub isp: String,
    pub remote_ip: String,
    pub device: String,
    pub app: String,
    pub tags: Vec<String>,
}

impl Session {
    pub fn new(
        account: impl Into<String>,
        gate_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            gate_id: gate_id.into(),
            account: account.into(),
            ..Self::default()
        }
    }

    /// A session reconstructed from packet metadata rather than supplied by
    /// the connection layer.
    pub fn derived(gate_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            gate_id: gate_id.into(),
            tags: vec![TAG_AUTO_GENERATED.to_string()],
            ..Self::default()
        }
    }

    pub fn location(&self) -> Location {
        Location::new(&self.gate_id, &self.channel_id)
    }

    pub fn is_auto_generated(&self) -> bool {
        self.tags.iter().any(|t| t == TAG_AUTO_GENERATED)
    }
}
