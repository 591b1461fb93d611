//! Kanban node management: start and stop kanban nodes, logs, contracts.
//!
//! Served next to the fabcoin initialization endpoint but keyed by
//! `rpcCall`, so it is a service of its own.

use serde_json::json;

use crate::binding::{BindingSet, CallBinding, CallFamily};
use crate::catalogue::ids::{initialization, surface};
use crate::catalogue::{CatalogueResult, Service};
use crate::registry::{CallDescriptor, CallRegistry};
use crate::transform::TransformerTable;

pub const SERVICE: &str = "kanbanGOInitialization";

pub fn registry() -> CatalogueResult<CallRegistry> {
    let descriptors = vec![
        CallDescriptor::new("runNodesOnFAB")
            .modifiable("numberOfNodes")
            .modifiable("abiJSON")
            .modifiable("contractId")
            .modifiable_with_default("connectKanbansInALine", json!("false"))
            .modifiable_with_default("bridgeChainnet", json!("regtest")),
        CallDescriptor::new("killAllGeth"),
        CallDescriptor::new("getLogFile").single_node(),
        CallDescriptor::new("getRPCLogFile").single_node(),
        CallDescriptor::new("getNodeInformation"),
        CallDescriptor::new("compileSolidity").modifiable("code").single_node(),
        CallDescriptor::new("fetchKanbanContract"),
        CallDescriptor::new("fetchKanbanContractTwo"),
        CallDescriptor::new("fetchKanbanCoinPool"),
        CallDescriptor::new("fetchLocalRegtestNodeConfig"),
        CallDescriptor::new("fetchMyNodesInfo"),
        CallDescriptor::new("executeOverSSH").modifiable("commandSSH").single_node(),
    ];
    Ok(CallRegistry::new(SERVICE, descriptors)?)
}

pub fn service() -> CatalogueResult<Service> {
    let registry = registry()?;
    let family = CallFamily::new(surface::KANBAN_INITIALIZATION, TransformerTable::new());

    let bindings = vec![
        CallBinding::new("runNodesOnFAB", &family)
            .input("numberOfNodes", initialization::NUMBER_OF_NODES)
            .json_input("abiJSON", initialization::ABI_JSON)
            .input("contractId", initialization::CONTRACT_ID)
            .input("connectKanbansInALine", initialization::CONNECT_IN_A_LINE)
            .input("bridgeChainnet", initialization::BRIDGE_CHAINNET),
        CallBinding::new("compileSolidity", &family).input("code", initialization::SOLIDITY_CODE),
        CallBinding::new("executeOverSSH", &family).input("commandSSH", initialization::COMMAND_SSH),
    ];

    let bindings = BindingSet::new(family, bindings, &registry)?;
    Ok(Service::new(registry, bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::initialization;

    #[test]
    fn test_node_calls_live_apart_from_fabcoin_start() {
        let service = service().unwrap();
        assert!(service.registry.contains("runNodesOnFAB"));
        assert!(!service.registry.contains(initialization::BOOTSTRAP));
        assert_eq!(
            service.bindings.get_or_default("getLogFile").surface,
            surface::KANBAN_INITIALIZATION
        );

        let fabcoin_start = initialization::registry().unwrap();
        assert!(!fabcoin_start.contains("runNodesOnFAB"));
        assert!(!fabcoin_start.contains("executeOverSSH"));
    }
}
