//! Infrastructure adapters for the entitlement engine's external collaborators.
//!
//! The production membership table and override store live in a remote
//! database; this crate ships the in-memory implementations used by tests,
//! local development and the CLI, plus the JSON seed format they load from.

pub mod membership_store;
pub mod override_store;
pub mod seed;

pub use membership_store::InMemoryMembershipDirectory;
pub use override_store::InMemoryOverrideStore;
pub use seed::{SeedError, SeedFile};
