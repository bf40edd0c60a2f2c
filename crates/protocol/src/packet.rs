use {
    bytes::Bytes,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
};

use crate::{
    error::ProtocolError,
    header::{Flag, Header, Status},
};

/// A logical packet: header plus an opaque, lazily decoded body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicPkt {
    pub header: Header,
    #[serde(default)]
    pub body: Bytes,
}

/// Generic body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResp {
    pub message: String,
}

impl LogicPkt {
    /// A fresh request for `command`.
    pub fn request(command: impl Into<String>) -> Self {
        Self {
            header: Header {
                command: command.into(),
                ..Header::default()
            },
            body: Bytes::new(),
        }
    }

    /// A packet answering `header`: keeps command, channel, sequence, dest and
    /// metadata, leaves status and flag at their defaults and the body empty.
    pub fn new_from(header: &Header) -> Self {
        Self {
            header: Header {
                command: header.command.clone(),
                channel_id: header.channel_id.clone(),
                sequence: header.sequence,
                flag: Flag::default(),
                status: Status::default(),
                dest: header.dest.clone(),
                meta: header.meta.clone(),
            },
            body: Bytes::new(),
        }
    }

    pub fn command(&self) -> &str {
        &self.header.command
    }

    pub fn sequence(&self) -> u32 {
        self.header.sequence
    }

    pub fn status(&self) -> Status {
        self.header.status
    }

    pub fn flag(&self) -> Flag {
        self.header.flag
    }

    pub fn set_status(&mut self, status: Status) {
        self.header.status = status;
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.header.flag = flag;
    }

    /// Serialize `body` into the packet, replacing any previous body.
    pub fn write_body<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<(), ProtocolError> {
        let raw = serde_json::to_vec(body).map_err(ProtocolError::Encode)?;
        self.body = Bytes::from(raw);
        Ok(())
    }

    /// Decode the body as `T`.
    pub fn read_body<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_slice(&self.body).map_err(|source| ProtocolError::InvalidBody {
            command: self.header.command.clone(),
            source,
        })
    }

    /// Serialized form handed to cross-node dispatchers.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(ProtocolError::Encode)
    }

    pub fn decode(raw: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(raw).map_err(ProtocolError::Decode)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Echo {
        text: String,
    }

    #[test]
    fn new_from_keeps_correlation() {
        let mut req = LogicPkt::request("chat.talk");
        req.header.sequence = 42;
        req.header.channel_id = "c1".into();
        req.header.flag = Flag::Request;
        req.header.add_meta(crate::META_DEST_SERVER, "g1");

        let resp = LogicPkt::new_from(&req.header);
        assert_eq!(resp.command(), "chat.talk");
        assert_eq!(resp.sequence(), 42);
        assert_eq!(resp.header.channel_id, "c1");
        assert_eq!(resp.header.meta, req.header.meta);
        assert_eq!(resp.status(), Status::SUCCESS);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn body_is_decoded_on_demand() {
        let mut pkt = LogicPkt::request("echo");
        pkt.write_body(&Echo {
            text: "hi".into(),
        })
        .unwrap();
        let echo: Echo = pkt.read_body().unwrap();
        assert_eq!(echo.text, "hi");
    }

    #[test]
    fn undecodable_body_names_the_command() {
        let mut pkt = LogicPkt::request("echo");
        pkt.body = Bytes::from_static(b"not json");
        let err = pkt.read_body::<Echo>().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidBody { ref command, .. } if command == "echo"));
    }

    #[test]
    fn encoded_packet_decodes_back() {
        let mut pkt = LogicPkt::request("echo");
        pkt.header.sequence = 9;
        pkt.set_flag(Flag::Push);
        pkt.write_body(&ErrorResp {
            message: "boom".into(),
        })
        .unwrap();

        let decoded = LogicPkt::decode(&pkt.encode().unwrap()).unwrap();
        assert_eq!(decoded, pkt);
        let body: ErrorResp = decoded.read_body().unwrap();
        assert_eq!(body.message, "boom");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            LogicPkt::decode(b"{"),
            Err(ProtocolError::Decode(_))
        ));
    }
}
