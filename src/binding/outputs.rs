//! Response → field propagation.

use serde_json::Value;

use crate::binding::{OutputMap, OutputTarget, Outputs};
use crate::fields::FieldStore;
use crate::transform::interaction::scalar_text;

/// Copy the selected parts of a response into their destination fields.
///
/// Paths absent from the response are skipped.
pub fn propagate_outputs(response: &Value, outputs: &Outputs, store: &dyn FieldStore) {
    match outputs {
        Outputs::None => {}
        Outputs::Whole(fields) => {
            let text = scalar_text(response);
            for field in fields {
                store.set(field, &text);
            }
        }
        Outputs::Paths(map) => propagate_map(response, map, store),
    }
}

fn propagate_map(node: &Value, map: &OutputMap, store: &dyn FieldStore) {
    for (key, target) in map {
        let Some(child) = node.get(key) else {
            tracing::debug!(key = %key, "Output path absent from response");
            continue;
        };
        match target {
            OutputTarget::Fields(fields) => {
                let text = scalar_text(child);
                for field in fields {
                    store.set(field, &text);
                }
            }
            OutputTarget::Nested(nested) => propagate_map(child, nested, store),
        }
    }
}
