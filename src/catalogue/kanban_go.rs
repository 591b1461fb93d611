//! Kanban-go node calls.
//!
//! Positional JSON-RPC 2.0. Backend method names are the Go function name
//! with its first letter lowercased, prefixed by the module (`kanban_`).

use crate::binding::{fields, output_map, BindingSet, CallBinding, CallFamily, ResponseHandler};
use crate::catalogue::ids::{kanban_schnorr, surface};
use crate::catalogue::{CatalogueResult, Service};
use crate::registry::{CallDescriptor, CallRegistry};
use crate::transform::TransformerTable;

pub const SERVICE: &str = "kanbanGO";

/// Descriptors of the kanban-go node.
pub fn registry() -> CatalogueResult<CallRegistry> {
    let descriptors = vec![
        CallDescriptor::new("testSha3")
            .method("kanban_testSha3")
            .modifiable("message")
            .parameters(&["message"]),
        CallDescriptor::new("testPrivateKeyGeneration").method("kanban_testPrivateKeyGeneration"),
        CallDescriptor::new("testPublicKeyFromPrivate")
            .method("kanban_testPublicKeyFromPrivate")
            .modifiable("privateKey")
            .parameters(&["privateKey"]),
        CallDescriptor::new("testSchnorrSignature")
            .method("kanban_testSchnorrSignature")
            .modifiable("privateKey")
            .modifiable("messageBase64")
            .parameters(&["privateKey", "messageBase64"]),
        CallDescriptor::new("testSchnorrVerification")
            .method("kanban_testSchnorrVerification")
            .modifiable("signature")
            .modifiable("publicKey")
            .modifiable("messageBase64")
            .parameters(&["signature", "publicKey", "messageBase64"]),
        CallDescriptor::new("versionGO").method("web3_clientVersion"),
    ];
    Ok(CallRegistry::new(SERVICE, descriptors)?)
}

/// Console wiring of the kanban-go node.
pub fn service() -> CatalogueResult<Service> {
    let registry = registry()?;
    let family = CallFamily::new(surface::KANBAN_GO, TransformerTable::new());

    let bindings = vec![
        CallBinding::new("testSha3", &family).input("message", kanban_schnorr::MESSAGE),
        CallBinding::new("versionGO", &family),
        CallBinding::new("testPrivateKeyGeneration", &family)
            .outputs(output_map([("privateKeyBase58Check", fields(&[kanban_schnorr::PRIVATE_KEY]))])),
        CallBinding::new("testPublicKeyFromPrivate", &family)
            .input("privateKey", kanban_schnorr::PRIVATE_KEY)
            .outputs(output_map([("publicKeyHex", fields(&[kanban_schnorr::PUBLIC_KEY]))])),
        CallBinding::new("testSchnorrSignature", &family)
            .input("privateKey", kanban_schnorr::PRIVATE_KEY)
            .base64_input("messageBase64", kanban_schnorr::MESSAGE)
            .outputs(output_map([("signatureBase58", fields(&[kanban_schnorr::SIGNATURE]))])),
        CallBinding::new("testSchnorrVerification", &family)
            .input("publicKey", kanban_schnorr::PUBLIC_KEY)
            .input("signature", kanban_schnorr::SIGNATURE)
            .base64_input("messageBase64", kanban_schnorr::MESSAGE)
            .handler(ResponseHandler::VerificationBanner),
    ];

    let bindings = BindingSet::new(family, bindings, &registry)?;
    Ok(Service::new(registry, bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        let registry = registry().unwrap();
        assert_eq!(registry.resolve_backend_method("versionGO").unwrap(), "web3_clientVersion");
        assert_eq!(registry.resolve_backend_method("testSha3").unwrap(), "kanban_testSha3");
    }

    #[test]
    fn test_parameters_cover_arguments() {
        let registry = registry().unwrap();
        let d = registry.lookup("testSchnorrVerification").unwrap();
        assert_eq!(d.parameters, vec!["signature", "publicKey", "messageBase64"]);
    }
}
