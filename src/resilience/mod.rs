//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Backend response with `error`:
//!     → recovery.rs (sentinel? attempts left?)
//!     → RecoveryDecision::Bootstrap → Dispatcher issues the bootstrap call
//!                                     and appends its rendering
//!     → RecoveryDecision::Refused  → terminal notice on the surface
//! ```
//!
//! # Design Decisions
//! - Only the configured sentinel triggers recovery; any other backend
//!   error is terminal for the call
//! - Recovery is bounded per call; it never loops
//! - No retry policy for transport errors; they surface to the caller

pub mod recovery;

pub use recovery::{RecoveryController, RecoveryDecision, RecoveryOutcome, RecoveryState};
