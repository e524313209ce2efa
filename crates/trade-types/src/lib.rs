//! Common types module for the trade lifecycle system.
//!
//! This module defines the domain records, status enumerations and wire types
//! shared by every crate in the workspace. Keeping them in one place means the
//! storage layer, the lifecycle core and the HTTP API all agree on the exact
//! status strings that stored data and dashboards depend on.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Entity records and their append-only timelines.
pub mod entity;
/// Domain error type shared by validation and transition code.
pub mod errors;
/// Event types published after lifecycle changes.
pub mod events;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Status enumerations per entity kind and actor roles.
pub mod status;
/// Storage namespaces for persisted entities.
pub mod storage;
/// Small formatting helpers.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use api::*;
pub use entity::*;
pub use errors::*;
pub use events::*;
pub use registry::*;
pub use status::*;
pub use storage::*;
pub use utils::truncate_id;
pub use validation::*;
