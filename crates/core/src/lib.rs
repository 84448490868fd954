//! `campusgate-core`: identifiers and error primitives shared by every crate.
//!
//! This crate has no knowledge of plans, roles or storage.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
