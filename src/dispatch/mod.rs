//! Call dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Console action (CLI command or activated interaction)
//!     → dispatcher.rs (binding, arguments, recovery, response handling)
//!     → wire.rs (keyed / positional body, GET or POST)
//!     → transport.rs (Transport trait, reqwest implementation)
//!     → board.rs (interactions bound per surface)
//!     → markup.rs (banners and notices around the rendering)
//! ```
//!
//! # Design Decisions
//! - The transport is a trait object so tests run without a network
//! - Reloadable settings sit behind `ArcSwap`; the catalogue does not reload
//! - Board locks are never held across an await point
//! - Broadcast replies append to their surface; a sole reply replaces it

pub mod board;
pub mod dispatcher;
pub mod markup;
pub mod transport;
pub mod types;
pub mod wire;

pub use board::InteractionBoard;
pub use dispatcher::Dispatcher;
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{Completion, DispatchError, DispatchResult, Handled, InstanceOutcome};
pub use wire::{select_transport, TransportKind, TransportRequest, WireError};
