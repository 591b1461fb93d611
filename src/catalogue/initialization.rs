//! Fabcoin daemon lifecycle: start, stop, pull and build.

use serde_json::json;

use crate::binding::{BindingSet, CallBinding, CallFamily};
use crate::catalogue::ids::{initialization, surface};
use crate::catalogue::{CatalogueResult, Service};
use crate::registry::{CallDescriptor, CallRegistry};
use crate::transform::TransformerTable;

pub const SERVICE: &str = "initialization";

/// Starts the fabcoin daemon; issued by auto-recovery.
pub const BOOTSTRAP: &str = "runFabcoind";

/// Descriptors of the initialization service.
pub fn registry() -> CatalogueResult<CallRegistry> {
    let descriptors = vec![
        CallDescriptor::new(BOOTSTRAP).modifiable_with_default("net", json!("regtest")),
        CallDescriptor::new("killAll").modifiable_with_default("net", json!("regtest")),
        CallDescriptor::new("gitPullNode"),
        CallDescriptor::new("gitPullFabcoin"),
        CallDescriptor::new("makeFabcoin"),
    ];
    Ok(CallRegistry::new(SERVICE, descriptors)?)
}

/// Console wiring of the initialization service.
pub fn service() -> CatalogueResult<Service> {
    let registry = registry()?;
    let family = CallFamily::new(surface::INITIALIZATION, TransformerTable::new());

    let bindings = vec![
        CallBinding::new(BOOTSTRAP, &family).input("net", initialization::NET),
        CallBinding::new("killAll", &family).input("net", initialization::NET),
    ];

    let bindings = BindingSet::new(family, bindings, &registry)?;
    Ok(Service::new(registry, bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_registered() {
        let service = service().unwrap();
        assert!(service.registry.contains(BOOTSTRAP));
        assert_eq!(service.bindings.get_or_default("killAll").surface, surface::INITIALIZATION);
    }
}
