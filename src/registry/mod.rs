//! Call registry subsystem.
//!
//! # Data Flow
//! ```text
//! Built-in catalogue (catalogue/*.rs)
//!     → descriptor.rs (per-call schema, invariant check)
//!     → CallRegistry (one per backend service, immutable)
//!     → lookup(label) by extractor and dispatcher
//! ```
//!
//! # Design Decisions
//! - One registry per remote service; labels are unique within a registry
//! - Descriptors are checked when the registry is built, not when called
//! - Unknown labels are configuration errors, never silently defaulted

pub mod descriptor;
pub mod types;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use descriptor::{ArgumentType, CallDescriptor};
pub use types::{RegistryError, RegistryResult};

/// Fully qualified reference to a call: service name plus call label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallRef {
    pub service: String,
    pub label: String,
}

impl CallRef {
    pub fn new(service: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            label: label.into(),
        }
    }
}

impl std::fmt::Display for CallRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.service, self.label)
    }
}

/// Immutable catalogue of call descriptors for one backend service.
#[derive(Debug, Clone)]
pub struct CallRegistry {
    name: String,
    calls: BTreeMap<String, CallDescriptor>,
}

impl CallRegistry {
    /// Build a registry, checking every descriptor.
    pub fn new(
        name: impl Into<String>,
        descriptors: impl IntoIterator<Item = CallDescriptor>,
    ) -> RegistryResult<Self> {
        let name = name.into();
        let mut calls = BTreeMap::new();
        for descriptor in descriptors {
            descriptor.check()?;
            let label = descriptor.label.clone();
            if calls.insert(label.clone(), descriptor).is_some() {
                return Err(RegistryError::DuplicateCall {
                    registry: name,
                    label,
                });
            }
        }
        tracing::debug!(registry = %name, calls = calls.len(), "Call registry built");
        Ok(Self { name, calls })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a descriptor by label.
    pub fn lookup(&self, label: &str) -> RegistryResult<&CallDescriptor> {
        self.calls.get(label).ok_or_else(|| RegistryError::UnknownCall {
            registry: self.name.clone(),
            label: label.to_string(),
        })
    }

    /// Backend method for a label, defaulting to the label itself.
    pub fn resolve_backend_method(&self, label: &str) -> RegistryResult<&str> {
        self.lookup(label).map(CallDescriptor::backend_method)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.calls.contains_key(label)
    }

    /// Labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.calls.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
