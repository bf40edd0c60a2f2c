//! Gateway service registration.
//!
//! Every gateway node publishes a [`ServiceRegistration`] so peers can turn
//! a gateway id into a reachable endpoint. The discovery backend is external;
//! [`MemoryNaming`] is the in-process registry used by single-node setups
//! and tests.

pub mod registry;
pub mod service;

pub use {
    registry::{MemoryNaming, NamingError},
    service::{DefaultService, ServiceRegistration},
};
