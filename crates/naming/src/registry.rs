use std::collections::HashMap;

use {
    thiserror::Error,
    tokio::sync::RwLock,
    tracing::{debug, info},
};

use crate::service::DefaultService;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("service not found: {0}")]
    NotFound(String),
}

/// In-process service registry keyed by service id.
#[derive(Default)]
pub struct MemoryNaming {
    services: RwLock<HashMap<String, DefaultService>>,
}

impl MemoryNaming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service`, replacing any entry with the same id.
    pub async fn register(&self, service: DefaultService) {
        info!(%service, "service registered");
        self.services
            .write()
            .await
            .insert(service.id.clone(), service);
    }

    pub async fn deregister(&self, service_id: &str) -> Result<DefaultService, NamingError> {
        let removed = self
            .services
            .write()
            .await
            .remove(service_id)
            .ok_or_else(|| NamingError::NotFound(service_id.to_string()))?;
        debug!(service_id, "service deregistered");
        Ok(removed)
    }

    pub async fn get(&self, service_id: &str) -> Result<DefaultService, NamingError> {
        self.services
            .read()
            .await
            .get(service_id)
            .cloned()
            .ok_or_else(|| NamingError::NotFound(service_id.to_string()))
    }

    /// Services named `name` carrying every tag in `tags`, ordered by id.
    pub async fn find(&self, name: &str, tags: &[String]) -> Vec<DefaultService> {
        let mut found: Vec<_> = self
            .services
            .read()
            .await
            .values()
            .filter(|s| s.name == name && s.has_tags(tags))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(id: &str, tags: &[&str]) -> DefaultService {
        DefaultService::new(id, "gateway", "ws", "127.0.0.1", 8000).with_tags(tags.iter().copied())
    }

    #[tokio::test]
    async fn find_filters_by_name_and_tags() {
        let naming = MemoryNaming::new();
        naming.register(gateway("g2", &["zone-a"])).await;
        naming.register(gateway("g1", &["zone-a", "ws"])).await;
        naming.register(gateway("g3", &["zone-b"])).await;
        naming
            .register(DefaultService::new("l1", "logic", "tcp", "127.0.0.1", 9000))
            .await;

        let ids: Vec<_> = naming
            .find("gateway", &["zone-a".into()])
            .await
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["g1", "g2"]);
        assert_eq!(naming.find("gateway", &[]).await.len(), 3);
    }

    #[tokio::test]
    async fn deregister_removes_entry() {
        let naming = MemoryNaming::new();
        naming.register(gateway("g1", &[])).await;

        assert_eq!(naming.deregister("g1").await.unwrap().id, "g1");
        assert_eq!(
            naming.get("g1").await,
            Err(NamingError::NotFound("g1".into()))
        );
        assert!(naming.deregister("g1").await.is_err());
    }
}
