//! Call bindings: console wiring of descriptors to fields.
//!
//! # Data Flow
//! ```text
//! Catalogue (catalogue/*.rs)
//!     → CallBinding per console function (inputs, outputs, table, handler)
//!     → BindingSet per service, validated against its CallRegistry
//!     → extract.rs reads and coerces arguments at call time
//!     → outputs.rs copies response fields back after the call
//! ```
//!
//! # Design Decisions
//! - Bindings are immutable after startup
//! - Response handling is a tagged variant, not ad hoc field checks
//! - A binding without an explicit call label uses its own label, and that
//!   label must exist in the registry when the set is built

pub mod extract;
pub mod outputs;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::fields::FieldStore;
use crate::registry::{CallRef, CallRegistry, RegistryResult};
use crate::transform::TransformerTable;

pub use extract::{extract_arguments, merge_with_descriptor, ArgumentError};
pub use outputs::propagate_outputs;

/// Where an argument's raw value comes from.
#[derive(Clone)]
pub enum InputSource {
    /// Text of a field.
    Field(String),
    /// JSON held in a field; text that does not parse is sent as a string.
    JsonField(String),
    /// Value computed on demand.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl std::fmt::Debug for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Field(id) => f.debug_tuple("Field").field(id).finish(),
            InputSource::JsonField(id) => f.debug_tuple("JsonField").field(id).finish(),
            InputSource::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Destination of a response path.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Fields(Vec<String>),
    Nested(OutputMap),
}

/// Response key → destination, nested to mirror the response shape.
pub type OutputMap = BTreeMap<String, OutputTarget>;

/// Which parts of a response are copied into fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Outputs {
    #[default]
    None,
    /// The whole response, quotes stripped, into the listed fields.
    Whole(Vec<String>),
    /// Selected paths.
    Paths(OutputMap),
}

/// How signer entries are joined into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinFormat {
    /// `a, b, c`
    CommaSeparated,
    /// `["a","b","c"]`
    JsonArray,
}

/// Collect `signers[*].<key>` into `field`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignerCollection {
    pub key: String,
    pub field: String,
    pub format: JoinFormat,
}

impl SignerCollection {
    pub fn new(key: &str, field: &str, format: JoinFormat) -> Self {
        Self {
            key: key.to_string(),
            field: field.to_string(),
            format,
        }
    }
}

/// Context handed to a custom response hook.
pub struct HookContext<'a> {
    pub call: &'a CallRef,
    pub surface: &'a str,
    pub store: &'a dyn FieldStore,
}

pub type HookResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Replacement for the standard response handling.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, raw: &str, ctx: &HookContext<'_>) -> HookResult;
}

/// Response handling for a binding.
#[derive(Clone, Default)]
pub enum ResponseHandler {
    /// Render, bind interactions, propagate outputs.
    #[default]
    Standard,
    /// Standard, then a Verified/Failed banner from `result`.
    VerificationBanner,
    /// Standard, then collect signer fields.
    CollectSigners(Vec<SignerCollection>),
    /// Replaces the standard handling entirely.
    Custom(Arc<dyn ResponseHook>),
}

impl std::fmt::Debug for ResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseHandler::Standard => f.write_str("Standard"),
            ResponseHandler::VerificationBanner => f.write_str("VerificationBanner"),
            ResponseHandler::CollectSigners(c) => f.debug_tuple("CollectSigners").field(c).finish(),
            ResponseHandler::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Default surface and transformer table shared by a family of calls.
#[derive(Debug, Clone)]
pub struct CallFamily {
    pub surface: String,
    pub transformers: Arc<TransformerTable>,
}

impl CallFamily {
    pub fn new(surface: &str, transformers: TransformerTable) -> Self {
        Self {
            surface: surface.to_string(),
            transformers: Arc::new(transformers),
        }
    }
}

/// Console wiring of one call.
#[derive(Debug, Clone)]
pub struct CallBinding {
    pub label: String,
    /// Descriptor label when it differs from `label`.
    pub call: Option<String>,
    pub inputs: BTreeMap<String, InputSource>,
    pub inputs_base64: BTreeMap<String, String>,
    pub outputs: Outputs,
    pub transformers: Arc<TransformerTable>,
    pub surface: String,
    pub handler: ResponseHandler,
}

impl CallBinding {
    pub fn new(label: &str, family: &CallFamily) -> Self {
        Self {
            label: label.to_string(),
            call: None,
            inputs: BTreeMap::new(),
            inputs_base64: BTreeMap::new(),
            outputs: Outputs::None,
            transformers: family.transformers.clone(),
            surface: family.surface.clone(),
            handler: ResponseHandler::Standard,
        }
    }

    /// Descriptor label this binding dispatches.
    pub fn call_label(&self) -> &str {
        self.call.as_deref().unwrap_or(&self.label)
    }

    pub fn call(mut self, descriptor_label: &str) -> Self {
        self.call = Some(descriptor_label.to_string());
        self
    }

    pub fn input(mut self, argument: &str, field: &str) -> Self {
        self.inputs.insert(argument.to_string(), InputSource::Field(field.to_string()));
        self
    }

    pub fn json_input(mut self, argument: &str, field: &str) -> Self {
        self.inputs.insert(argument.to_string(), InputSource::JsonField(field.to_string()));
        self
    }

    pub fn producer(mut self, argument: &str, producer: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.inputs.insert(argument.to_string(), InputSource::Producer(Arc::new(producer)));
        self
    }

    pub fn base64_input(mut self, argument: &str, field: &str) -> Self {
        self.inputs_base64.insert(argument.to_string(), field.to_string());
        self
    }

    pub fn whole_output(mut self, fields: &[&str]) -> Self {
        self.outputs = Outputs::Whole(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn outputs(mut self, map: OutputMap) -> Self {
        self.outputs = Outputs::Paths(map);
        self
    }

    pub fn transformers(mut self, table: Arc<TransformerTable>) -> Self {
        self.transformers = table;
        self
    }

    pub fn handler(mut self, handler: ResponseHandler) -> Self {
        self.handler = handler;
        self
    }
}

/// Helper for building output maps.
pub fn fields(ids: &[&str]) -> OutputTarget {
    OutputTarget::Fields(ids.iter().map(|f| f.to_string()).collect())
}

/// Build an output map from `(key, target)` pairs.
pub fn output_map<'a>(entries: impl IntoIterator<Item = (&'a str, OutputTarget)>) -> OutputMap {
    entries.into_iter().map(|(k, t)| (k.to_string(), t)).collect()
}

/// All bindings of one service.
#[derive(Debug, Clone)]
pub struct BindingSet {
    family: CallFamily,
    bindings: BTreeMap<String, CallBinding>,
}

impl BindingSet {
    /// Build the set and check every binding against the registry.
    pub fn new(
        family: CallFamily,
        bindings: impl IntoIterator<Item = CallBinding>,
        registry: &CallRegistry,
    ) -> RegistryResult<Self> {
        let bindings: BTreeMap<_, _> = bindings.into_iter().map(|b| (b.label.clone(), b)).collect();
        for binding in bindings.values() {
            registry.lookup(binding.call_label())?;
        }
        Ok(Self { family, bindings })
    }

    pub fn get(&self, label: &str) -> Option<&CallBinding> {
        self.bindings.get(label)
    }

    /// Binding for `label`, or an empty binding on the default surface.
    pub fn get_or_default(&self, label: &str) -> CallBinding {
        self.bindings
            .get(label)
            .cloned()
            .unwrap_or_else(|| CallBinding::new(label, &self.family))
    }

    pub fn family(&self) -> &CallFamily {
        &self.family
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CallDescriptor, RegistryError};

    fn family() -> CallFamily {
        CallFamily::new("outputNode", TransformerTable::new())
    }

    #[test]
    fn test_call_label_defaults_to_binding_label() {
        let b = CallBinding::new("getBlockCount", &family());
        assert_eq!(b.call_label(), "getBlockCount");
        let b = b.call("getBlockCountV2");
        assert_eq!(b.call_label(), "getBlockCountV2");
    }

    #[test]
    fn test_binding_set_fails_fast_on_unknown_call() {
        let registry = CallRegistry::new("node", vec![CallDescriptor::new("getBlockCount")]).unwrap();
        let ok = BindingSet::new(family(), vec![CallBinding::new("getBlockCount", &family())], &registry);
        assert!(ok.is_ok());

        let err = BindingSet::new(family(), vec![CallBinding::new("getBlockCnt", &family())], &registry)
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownCall { label, .. } if label == "getBlockCnt"));
    }

    #[test]
    fn test_default_binding() {
        let registry = CallRegistry::new("node", vec![CallDescriptor::new("killAll")]).unwrap();
        let set = BindingSet::new(family(), Vec::new(), &registry).unwrap();
        let b = set.get_or_default("killAll");
        assert_eq!(b.surface, "outputNode");
        assert!(b.inputs.is_empty());
    }
}
