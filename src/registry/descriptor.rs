//! Call descriptors.
//!
//! A descriptor is the static schema of one remote procedure: the method
//! name the backend expects, which arguments exist, their defaults and how
//! their raw text is coerced before it goes on the wire.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::types::{RegistryError, RegistryResult};

/// Semantic type of an argument, used for coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    Number,
    String,
    Base64,
    Json,
}

/// Static schema for one remote procedure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallDescriptor {
    /// Key used by the console layer.
    pub label: String,

    /// Name the remote service expects. `None` means "same as label".
    pub backend_method: Option<String>,

    /// Always sent unmodified.
    pub fixed_arguments: BTreeMap<String, Value>,

    /// Supplied by the caller; `None` means no default.
    pub modifiable_arguments: BTreeMap<String, Option<Value>>,

    /// Omitted from the request when unset and without default.
    pub optional_arguments: BTreeMap<String, Option<Value>>,

    /// Coercion hints per argument.
    pub argument_types: BTreeMap<String, ArgumentType>,

    /// Positional serialization order.
    pub parameters: Vec<String>,

    /// Route to exactly one backend instance instead of broadcasting.
    pub single_node_only: bool,
}

impl CallDescriptor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.backend_method = Some(method.into());
        self
    }

    pub fn fixed(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fixed_arguments.insert(name.into(), value);
        self
    }

    pub fn modifiable(mut self, name: impl Into<String>) -> Self {
        self.modifiable_arguments.insert(name.into(), None);
        self
    }

    pub fn modifiable_with_default(mut self, name: impl Into<String>, default: Value) -> Self {
        self.modifiable_arguments.insert(name.into(), Some(default));
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.optional_arguments.insert(name.into(), None);
        self
    }

    pub fn typed(mut self, name: impl Into<String>, ty: ArgumentType) -> Self {
        self.argument_types.insert(name.into(), ty);
        self
    }

    pub fn parameters(mut self, names: &[&str]) -> Self {
        self.parameters = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn single_node(mut self) -> Self {
        self.single_node_only = true;
        self
    }

    /// The method name sent to the backend.
    pub fn backend_method(&self) -> &str {
        self.backend_method.as_deref().unwrap_or(&self.label)
    }

    pub fn argument_type(&self, name: &str) -> Option<ArgumentType> {
        self.argument_types.get(name).copied()
    }

    /// True if any of the three maps declares `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.fixed_arguments.contains_key(name)
            || self.modifiable_arguments.contains_key(name)
            || self.optional_arguments.contains_key(name)
    }

    /// Check the structural invariants of the descriptor.
    pub fn check(&self) -> RegistryResult<()> {
        let mut seen = BTreeSet::new();
        let names = self
            .fixed_arguments
            .keys()
            .chain(self.modifiable_arguments.keys())
            .chain(self.optional_arguments.keys());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(RegistryError::ArgumentCollision {
                    label: self.label.clone(),
                    argument: name.clone(),
                });
            }
        }

        if let Some(parameter) = self.parameters.iter().find(|p| !self.declares(p)) {
            return Err(RegistryError::UnknownParameter {
                label: self.label.clone(),
                parameter: parameter.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_method_defaults_to_label() {
        let d = CallDescriptor::new("getBlockCount");
        assert_eq!(d.backend_method(), "getBlockCount");

        let d = CallDescriptor::new("getBlockCount").method("getblockcount");
        assert_eq!(d.backend_method(), "getblockcount");
    }

    #[test]
    fn test_collision_rejected() {
        let d = CallDescriptor::new("x")
            .fixed("verbose", json!(1))
            .modifiable("verbose");
        assert_eq!(
            d.check(),
            Err(RegistryError::ArgumentCollision {
                label: "x".into(),
                argument: "verbose".into()
            })
        );
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let d = CallDescriptor::new("x").modifiable("a").parameters(&["a", "b"]);
        assert!(matches!(d.check(), Err(RegistryError::UnknownParameter { .. })));

        let d = CallDescriptor::new("x").modifiable("a").optional("b").parameters(&["a", "b"]);
        assert!(d.check().is_ok());
    }
}
