use std::time::Duration;

use serde::{Deserialize, Serialize};

use imgate_naming::DefaultService;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImgateConfig {
    pub gateway: GatewayConfig,
    pub routing: RoutingConfig,
}

/// How this gateway node identifies and publishes itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway id other nodes route to. Defaults to the host name.
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    /// `ws`, `tcp`, ...
    pub protocol: String,
    pub namespace: String,
    pub tags: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let id = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "gateway".into());
        Self {
            id,
            name: "gateway".into(),
            address: "127.0.0.1".into(),
            port: 8000,
            protocol: "ws".into(),
            namespace: "default".into(),
            tags: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// The registration this node publishes for service discovery.
    pub fn to_service(&self) -> DefaultService {
        DefaultService::new(
            &self.id,
            &self.name,
            &self.protocol,
            &self.address,
            self.port,
        )
        .with_namespace(&self.namespace)
        .with_tags(self.tags.iter().cloned())
    }
}

/// Routing core tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Upper bound on one cross-gateway push.
    pub push_timeout_ms: u64,
    /// Idle contexts kept for reuse.
    pub context_pool_size: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            push_timeout_ms: 3_000,
            context_pool_size: 128,
        }
    }
}

impl RoutingConfig {
    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg: ImgateConfig = toml::from_str(
            r#"
            [gateway]
            id = "g1"

            [routing]
            push_timeout_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.gateway.id, "g1");
        assert_eq!(cfg.gateway.protocol, "ws");
        assert_eq!(cfg.routing.push_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.routing.context_pool_size, 128);
    }

    #[test]
    fn service_registration_mirrors_gateway() {
        let gateway = GatewayConfig {
            id: "g1".into(),
            tags: vec!["zone-a".into()],
            ..GatewayConfig::default()
        };
        let svc = gateway.to_service();
        assert_eq!(svc.id, "g1");
        assert_eq!(svc.namespace, "default");
        assert_eq!(svc.tags, vec!["zone-a"]);
        assert_eq!(svc.port, 8000);
    }
}
