//! Dispatch errors and completion reports.

use thiserror::Error;
use uuid::Uuid;

use crate::binding::ArgumentError;
use crate::dispatch::transport::TransportError;
use crate::dispatch::wire::WireError;
use crate::registry::{CallRef, RegistryError};
use crate::resilience::RecoveryOutcome;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed response to {call}: {reason}")]
    MalformedResponse { call: CallRef, reason: String },

    #[error("Service '{0}' is not configured")]
    UnknownService(String),

    #[error("No interaction with id {0}")]
    UnknownInteraction(usize),

    #[error("Response hook for {call} failed: {reason}")]
    Hook { call: CallRef, reason: String },
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result of handling one instance's response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Handled {
    /// The response's `error` field, as text.
    pub backend_error: Option<String>,
    /// Ids of the interactions bound on the surface.
    pub interaction_ids: Vec<usize>,
    pub recovery: Option<RecoveryOutcome>,
}

/// Outcome for one backend instance.
#[derive(Debug)]
pub struct InstanceOutcome {
    pub url: String,
    pub result: DispatchResult<Handled>,
}

/// Report of a finished dispatch.
#[derive(Debug)]
pub struct Completion {
    pub dispatch_id: Uuid,
    pub call: CallRef,
    pub instances: Vec<InstanceOutcome>,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        self.instances.iter().all(|i| i.result.is_ok())
    }

    /// The first instance's handled response, if it succeeded.
    pub fn first(&self) -> Option<&Handled> {
        self.instances.first().and_then(|i| i.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DispatchError)> {
        self.instances
            .iter()
            .filter_map(|i| i.result.as_ref().err().map(|e| (i.url.as_str(), e)))
    }
}
