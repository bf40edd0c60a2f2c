use std::collections::HashMap;

use {async_trait::async_trait, tokio::sync::RwLock, tracing::debug};

use crate::{
    session::{Location, Session},
    storage::{Result, SessionStorage, StorageError},
};

#[derive(Default)]
struct Index {
    /// channel_id → Session
    by_channel: HashMap<String, Session>,
    /// account → channel_ids (reverse lookup for fan-out)
    by_account: HashMap<String, Vec<String>>,
}

impl Index {
    fn unlink(&mut self, account: &str, channel_id: &str) {
        if let Some(channels) = self.by_account.get_mut(account) {
            channels.retain(|c| c != channel_id);
            if channels.is_empty() {
                self.by_account.remove(account);
            }
        }
    }
}

/// Process-local [`SessionStorage`].
#[derive(Default)]
pub struct MemoryStorage {
    index: RwLock<Index>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.index.read().await.by_channel.len()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn add(&self, session: Session) -> Result<()> {
        let mut index = self.index.write().await;
        if let Some(previous) = index.by_channel.remove(&session.channel_id) {
            index.unlink(&previous.account, &previous.channel_id);
        }
        index
            .by_account
            .entry(session.account.clone())
            .or_default()
            .push(session.channel_id.clone());
        debug!(account = %session.account, location = %session.location(), "session added");
        index.by_channel.insert(session.channel_id.clone(), session);
        Ok(())
    }

    async fn remove(&self, account: &str, channel_id: &str) -> Result<()> {
        let mut index = self.index.write().await;
        match index.by_channel.get(channel_id) {
            Some(s) if s.account == account => {},
            _ => return Err(StorageError::NotFound(channel_id.to_string())),
        }
        index.by_channel.remove(channel_id);
        index.unlink(account, channel_id);
        debug!(account, channel_id, "session removed");
        Ok(())
    }

    async fn get(&self, channel_id: &str) -> Result<Session> {
        self.index
            .read()
            .await
            .by_channel
            .get(channel_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(channel_id.to_string()))
    }

    async fn get_locations(&self, accounts: &[String]) -> Result<Vec<Location>> {
        let index = self.index.read().await;
        let locations: Vec<Location> = accounts
            .iter()
            .filter_map(|a| index.by_account.get(a))
            .flatten()
            .filter_map(|c| index.by_channel.get(c))
            .map(Session::location)
            .collect();
        if locations.is_empty() {
            return Err(StorageError::NotFound(accounts.join(",")));
        }
        Ok(locations)
    }

    async fn get_location(&self, account: &str, device: &str) -> Result<Location> {
        let index = self.index.read().await;
        index
            .by_account
            .get(account)
            .into_iter()
            .flatten()
            .filter_map(|c| index.by_channel.get(c))
            .find(|s| s.device == device)
            .map(Session::location)
            .ok_or_else(|| StorageError::NotFound(format!("{account}@{device}")))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn session(account: &str, gate: &str, channel: &str, device: &str) -> Session {
        Session {
            device: device.into(),
            ..Session::new(account, gate, channel)
        }
    }

    #[tokio::test]
    async fn add_and_get() {
        let store = MemoryStorage::new();
        store.add(session("alice", "g1", "c1", "ios")).await.unwrap();

        let got = store.get("c1").await.unwrap();
        assert_eq!(got.account, "alice");
        assert_eq!(store.count().await, 1);
        assert_eq!(
            store.get("c9").await,
            Err(StorageError::NotFound("c9".into()))
        );
    }

    #[tokio::test]
    async fn locations_span_gateways_and_accounts() {
        let store = MemoryStorage::new();
        store.add(session("alice", "g1", "c1", "ios")).await.unwrap();
        store.add(session("alice", "g2", "c2", "web")).await.unwrap();
        store.add(session("bob", "g1", "c3", "ios")).await.unwrap();

        let mut locs = store
            .get_locations(&["alice".into(), "bob".into(), "carol".into()])
            .await
            .unwrap();
        locs.sort();
        assert_eq!(locs, vec![
            Location::new("g1", "c1"),
            Location::new("g1", "c3"),
            Location::new("g2", "c2"),
        ]);

        assert!(store.get_locations(&["carol".into()]).await.is_err());
    }

    #[tokio::test]
    async fn location_by_device() {
        let store = MemoryStorage::new();
        store.add(session("alice", "g1", "c1", "ios")).await.unwrap();
        store.add(session("alice", "g2", "c2", "web")).await.unwrap();

        assert_eq!(
            store.get_location("alice", "web").await.unwrap(),
            Location::new("g2", "c2")
        );
        assert!(store.get_location("alice", "android").await.is_err());
    }

    #[tokio::test]
    async fn remove_unlinks_account() {
        let store = MemoryStorage::new();
        store.add(session("alice", "g1", "c1", "ios")).await.unwrap();

        assert!(store.remove("bob", "c1").await.is_err());
        store.remove("alice", "c1").await.unwrap();
        assert!(store.get("c1").await.is_err());
        assert!(store.get_locations(&["alice".into()]).await.is_err());
    }

    #[tokio::test]
    async fn re_adding_a_channel_moves_it() {
        let store = MemoryStorage::new();
        store.add(session("alice", "g1", "c1", "ios")).await.unwrap();
        store.add(session("bob", "g1", "c1", "ios")).await.unwrap();

        assert!(store.get_locations(&["alice".into()]).await.is_err());
        assert_eq!(store.get("c1").await.unwrap().account, "bob");
    }
}
