//! Built-in call catalogue.
//!
//! # Data Flow
//! ```text
//! fabcoin.rs / kanban_go.rs / initialization.rs / kanban_init.rs
//!     → CallRegistry (descriptors) + BindingSet (console wiring)
//!     → Service per backend, keyed by service name
//!     → Dispatcher (immutable for the whole session)
//! ```
//!
//! # Design Decisions
//! - The catalogue is code, not configuration; only endpoints and wire
//!   form come from the config file
//! - Building the catalogue validates every binding and every pattern, so
//!   a bad entry stops startup

pub mod fabcoin;
pub mod ids;
pub mod initialization;
pub mod kanban_go;
pub mod kanban_init;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::binding::BindingSet;
use crate::registry::{CallRegistry, RegistryError};
use crate::transform::PatternError;

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid transformer pattern: {0}")]
    Pattern(#[from] PatternError),
}

pub type CatalogueResult<T> = Result<T, CatalogueError>;

/// Descriptors and bindings of one backend service.
#[derive(Debug, Clone)]
pub struct Service {
    pub registry: CallRegistry,
    pub bindings: BindingSet,
}

impl Service {
    pub fn new(registry: CallRegistry, bindings: BindingSet) -> Self {
        Self { registry, bindings }
    }

    pub fn name(&self) -> &str {
        self.registry.name()
    }
}

/// Every built-in service, keyed by name.
pub fn builtin() -> CatalogueResult<BTreeMap<String, Service>> {
    let services = [
        fabcoin::service()?,
        kanban_go::service()?,
        initialization::service()?,
        kanban_init::service()?,
    ];
    Ok(services
        .into_iter()
        .map(|service| (service.name().to_string(), service))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue_builds() {
        let services = builtin().unwrap();
        let names: Vec<_> = services.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["fabcoin", "initialization", "kanbanGO", "kanbanGOInitialization"]);
        assert!(services["fabcoin"].registry.len() > 20);
    }

    #[test]
    fn test_same_label_in_two_services() {
        let services = builtin().unwrap();
        let fab = services["fabcoin"].registry.resolve_backend_method("testSha3").unwrap();
        let go = services["kanbanGO"].registry.resolve_backend_method("testSha3").unwrap();
        assert_ne!(fab, go);
    }
}
