//! Transformer behaviours and the interactions they bind.
//!
//! Click-and-fill behaviours are resolved into plain data at render time:
//! a [`BoundInteraction`] lists the field updates a click performs and the
//! call it triggers, so the binding pass needs nothing but a field store.

use serde_json::{json, Map, Value};

use crate::fields::FieldStore;
use crate::registry::CallRef;
use crate::transform::pattern::{path_string, PathSegment};
use crate::transform::shorten::ShortenStyle;

/// Behaviour applied to a matched response field.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformer {
    /// Render the raw value.
    PassThrough,
    /// Render a shortened form; the full value stays in the markup title.
    Shorten(ShortenStyle),
    /// Render a clickable value that fills other fields.
    ClickAndFill(ClickAndFill),
}

impl Transformer {
    /// Click copies the value into `fields`; display is shortened.
    pub fn fill(fields: &[&str]) -> Self {
        Transformer::ClickAndFill(ClickAndFill {
            fill: FillAction::Copy(fields.iter().map(|f| f.to_string()).collect()),
            shorten: Some(ShortenStyle::Standard),
            trigger: None,
            tooltip: None,
        })
    }

    /// Click copies the value into `field` and then runs `trigger`.
    pub fn fill_and_run(field: &str, trigger: CallRef, tooltip: &str) -> Self {
        Transformer::ClickAndFill(ClickAndFill {
            fill: FillAction::Copy(vec![field.to_string()]),
            shorten: Some(ShortenStyle::Standard),
            trigger: Some(trigger),
            tooltip: Some(tooltip.to_string()),
        })
    }
}

/// Click-and-fill behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickAndFill {
    pub fill: FillAction,
    pub shorten: Option<ShortenStyle>,
    pub trigger: Option<CallRef>,
    pub tooltip: Option<String>,
}

/// What a click writes.
#[derive(Debug, Clone, PartialEq)]
pub enum FillAction {
    /// Copy the full value into every listed field.
    Copy(Vec<String>),
    /// Use the clicked transaction output as a spend input.
    ///
    /// The txid comes from the response root, the vout index from the path,
    /// the address from `vout.<n>.scriptPubKey.addresses.0`. With
    /// `with_value` the amount becomes the clicked value minus one. The
    /// tx outputs are then staged from the updated fields.
    SelectTxOutput {
        with_value: bool,
        inputs_field: String,
        address_field: String,
        amount_field: String,
        outputs: TxOutputFields,
    },
}

/// Fields involved in staging the outputs of a new transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TxOutputFields {
    /// JSON object of outputs, `{ "<address>": amount, ... }`.
    pub outputs: String,
    /// Recipient address.
    pub address: String,
    /// JSON array of public keys for an aggregate-signature output.
    pub public_keys: String,
    pub amount: String,
}

/// One field write performed by an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite a field.
    Set { field: String, value: String },
    /// Insert or update `{txid, vout}` in a JSON array of tx inputs.
    MergeTxInput { field: String, txid: String, vout: usize },
    /// Stage `{address: amount}` and the aggregate-signature output from
    /// the current field values.
    MergeTxOutput(TxOutputFields),
}

/// An interactive element emitted by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundInteraction {
    /// Matches the `data-interaction` attribute in the markup.
    pub id: usize,
    pub path: Vec<PathSegment>,
    /// Full, un-shortened value.
    pub value: Value,
    pub updates: Vec<FieldUpdate>,
    pub trigger: Option<CallRef>,
    pub tooltip: Option<String>,
}

impl BoundInteraction {
    pub fn path_string(&self) -> String {
        path_string(&self.path)
    }
}

/// Text form of a scalar: strings raw, everything else as JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FillAction {
    /// Resolve the field updates for a click on `value` at `path`.
    ///
    /// Missing sibling data yields fewer (possibly zero) updates instead of
    /// an error.
    pub fn updates(&self, value: &Value, path: &[PathSegment], root: &Value) -> Vec<FieldUpdate> {
        match self {
            FillAction::Copy(fields) => {
                let text = scalar_text(value);
                fields
                    .iter()
                    .map(|field| FieldUpdate::Set {
                        field: field.clone(),
                        value: text.clone(),
                    })
                    .collect()
            }
            FillAction::SelectTxOutput {
                with_value,
                inputs_field,
                address_field,
                amount_field,
                outputs,
            } => {
                let txid = root.get("txid").and_then(Value::as_str);
                let vout = match path.len().checked_sub(2).map(|i| &path[i]) {
                    Some(PathSegment::Index(index)) => Some(*index),
                    _ => None,
                };
                let (Some(txid), Some(vout)) = (txid, vout) else {
                    tracing::debug!(path = %path_string(path), "Tx output selection lacks txid or vout");
                    return Vec::new();
                };

                let mut updates = vec![FieldUpdate::MergeTxInput {
                    field: inputs_field.clone(),
                    txid: txid.to_string(),
                    vout,
                }];
                let address = root
                    .pointer(&format!("/vout/{vout}/scriptPubKey/addresses/0"))
                    .and_then(Value::as_str);
                if let Some(address) = address {
                    updates.push(FieldUpdate::Set {
                        field: address_field.clone(),
                        value: address.to_string(),
                    });
                }
                let amount = match value.as_f64() {
                    Some(amount) if *with_value => amount - 1.0,
                    _ => 0.0,
                };
                updates.push(FieldUpdate::Set {
                    field: amount_field.clone(),
                    value: amount.to_string(),
                });
                updates.push(FieldUpdate::MergeTxOutput(outputs.clone()));
                updates
            }
        }
    }
}

impl FieldUpdate {
    /// Write the update into the store.
    pub fn apply(&self, store: &dyn FieldStore) {
        match self {
            FieldUpdate::Set { field, value } => store.set(field, value),
            FieldUpdate::MergeTxInput { field, txid, vout } => {
                let raw = store.get(field).unwrap_or_default();
                let mut inputs: Vec<Value> = if raw.trim().is_empty() {
                    Vec::new()
                } else {
                    match serde_json::from_str(&raw) {
                        Ok(inputs) => inputs,
                        Err(e) => {
                            tracing::warn!(field = %field, error = %e, "Cannot parse tx inputs, leaving field unchanged");
                            return;
                        }
                    }
                };
                match inputs
                    .iter_mut()
                    .find(|input| input.get("txid").and_then(Value::as_str) == Some(txid))
                {
                    Some(existing) => existing["vout"] = json!(vout),
                    None => inputs.push(json!({ "txid": txid, "vout": vout })),
                }
                store.set(field, &Value::Array(inputs).to_string());
            }
            FieldUpdate::MergeTxOutput(fields) => fields.stage(store),
        }
    }
}

impl TxOutputFields {
    /// Write the staged outputs. Needs an amount and either an address or
    /// parseable public keys; otherwise the outputs are left alone.
    fn stage(&self, store: &dyn FieldStore) {
        let read = |id: &str| store.get(id).unwrap_or_default().trim().to_string();
        let address = read(&self.address);
        let amount = read(&self.amount);
        let keys_raw = read(&self.public_keys);
        let public_keys = if keys_raw.is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&keys_raw) {
                Ok(keys) => Some(keys),
                Err(e) => {
                    tracing::debug!(field = %self.public_keys, error = %e, "Aggregate public keys do not parse");
                    None
                }
            }
        };
        if amount.is_empty() || (address.is_empty() && public_keys.is_none()) {
            tracing::debug!(field = %self.outputs, "Tx outputs not staged: amount or recipient missing");
            return;
        }

        let raw = read(&self.outputs);
        let mut outputs = if raw.is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(outputs)) => outputs,
                _ => {
                    tracing::warn!(field = %self.outputs, "Cannot parse tx outputs, leaving field unchanged");
                    return;
                }
            }
        };

        let mut amount = match serde_json::from_str::<Value>(&amount) {
            Ok(number @ Value::Number(_)) => number,
            _ => Value::String(amount),
        };
        if !address.is_empty() {
            outputs.insert(address, amount);
            amount = json!(0);
        }
        if let Some(public_keys) = public_keys {
            outputs.insert(
                "aggregateSignature".to_string(),
                json!({ "publicKeys": public_keys, "amount": amount }),
            );
        }
        store.set(&self.outputs, &Value::Object(outputs).to_string());
    }
}
