//! Registry trait for self-registering implementations.
//!
//! Pluggable backends (currently storage) declare the name they are selected
//! by in configuration together with the factory that builds them.

/// Base trait for implementation registries.
///
/// Each backend module provides a `Registry` struct implementing this trait,
/// so the service can build a name-to-factory map without hard-coding the
/// list of backends.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"memory"` for `[storage.implementations.memory]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
