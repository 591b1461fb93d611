//! Console field subsystem.
//!
//! # Data Flow
//! ```text
//! Persisted values (JSON file, optional)
//!     → store.rs (MemoryFieldStore, declared layout defaults)
//!     → shared as Arc<dyn FieldStore> with extractor, dispatcher, handlers
//!     → progress.rs (in-flight indicator written into a field)
//! ```
//!
//! # Design Decisions
//! - Fields are an injected store, never global state
//! - Reading a field that was never declared is an error for the caller
//! - Writing creates the field; last write wins

pub mod progress;
pub mod store;

pub use progress::ProgressIndicator;
pub use store::{FieldStore, MemoryFieldStore};
