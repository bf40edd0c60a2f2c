use {async_trait::async_trait, thiserror::Error};

use crate::session::{Location, Session};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("session not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Session-to-location records keyed by account and channel id.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Record a live session, replacing any previous one on the same channel.
    async fn add(&self, session: Session) -> Result<()>;

    async fn remove(&self, account: &str, channel_id: &str) -> Result<()>;

    async fn get(&self, channel_id: &str) -> Result<Session>;

    /// Locations of every live connection belonging to `accounts`. Accounts
    /// with no live connection contribute nothing; fails only when none of
    /// them has one.
    async fn get_locations(&self, accounts: &[String]) -> Result<Vec<Location>>;

    /// Location of `account` on `device`.
    async fn get_location(&self, account: &str, device: &str) -> Result<Location>;
}
