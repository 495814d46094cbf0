//! social-relay domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `policy`: Scope and draft checks
//! - `text`: Message body normalization
//! - `usecases`: Credential lifecycle

pub mod model;
pub mod policy;
pub mod ports;
pub mod text;
pub mod usecases;

pub use model::*;
pub use ports::*;
