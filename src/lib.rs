//! RPC console library.
//!
//! Declarative calls against node RPC services: a catalogue of call
//! descriptors and their console bindings, a dispatcher that serializes,
//! sends and renders them, and a recovery controller that starts a stopped
//! dependency once.

// Call model
pub mod binding;
pub mod catalogue;
pub mod registry;

// Runtime
pub mod console;
pub mod dispatch;
pub mod fields;
pub mod transform;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use config::ConsoleConfig;
pub use dispatch::Dispatcher;
pub use fields::{FieldStore, MemoryFieldStore};
