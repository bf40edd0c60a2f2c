use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// What a gateway node publishes about itself.
pub trait ServiceRegistration: Send + Sync {
    fn service_id(&self) -> &str;
    fn service_name(&self) -> &str;
    fn public_address(&self) -> &str;
    fn public_port(&self) -> u16;
    fn protocol(&self) -> &str;
    fn namespace(&self) -> &str;
    fn tags(&self) -> &[String];
    fn meta(&self) -> &HashMap<String, String>;

    /// Endpoint peers dial: `addr:port` for plain tcp, `proto://addr:port`
    /// otherwise.
    fn dial_url(&self) -> String {
        if self.protocol() == "tcp" {
            format!("{}:{}", self.public_address(), self.public_port())
        } else {
            format!(
                "{}://{}:{}",
                self.protocol(),
                self.public_address(),
                self.public_port()
            )
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultService {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub protocol: String,
    pub namespace: String,
    pub tags: Vec<String>,
    pub meta: HashMap<String, String>,
}

impl DefaultService {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        protocol: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            port,
            protocol: protocol.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_tags(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|t| self.tags.contains(t))
    }
}

impl ServiceRegistration for DefaultService {
    fn service_id(&self) -> &str {
        &self.id
    }

    fn service_name(&self) -> &str {
        &self.name
    }

    fn public_address(&self) -> &str {
        &self.address
    }

    fn public_port(&self) -> u16 {
        self.port
    }

    fn protocol(&self) -> &str {
        &self.protocol
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }
}

impl fmt::Display for DefaultService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id:{} name:{} address:{}:{} ns:{} tags:{:?}",
            self.id, self.name, self.address, self.port, self.namespace, self.tags
        )
    }
}
