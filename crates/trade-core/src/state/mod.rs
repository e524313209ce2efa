//! Store-backed entity state.
//!
//! This module persists entities and serializes lifecycle changes per entity,
//! so concurrent callers see either their transition applied atomically or a
//! conflict they can retry.

pub mod entity;

pub use entity::{Dashboard, EntityStateMachine, StateError, TransitionCommand};
