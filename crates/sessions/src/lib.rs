//! Client sessions and where their connections live.
//!
//! A [`Session`] describes one connected client; its [`Location`] is the
//! (gateway, channel) pair the routing layer pushes to. [`SessionStorage`]
//! is the lookup contract used by connection management and business logic
//! to turn accounts into locations.

pub mod memory;
pub mod session;
pub mod storage;

pub use {
    memory::MemoryStorage,
    session::{Location, Session},
    storage::{SessionStorage, StorageError},
};
