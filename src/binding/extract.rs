//! Argument extraction.
//!
//! # Responsibilities
//! - Flag every consulted field active, before any value is read
//! - Read raw values from fields or producers
//! - Coerce by the descriptor's argument types
//! - Base64-encode `inputs_base64` values, layered over plain inputs
//! - Merge with fixed arguments and defaults
//!
//! # Design Decisions
//! - A bound field that does not exist is a binding defect (error)
//! - An empty value is passed through; emptiness is the backend's concern
//! - Only `number` coerces; everything else stays text

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::binding::{CallBinding, InputSource};
use crate::fields::FieldStore;
use crate::registry::{ArgumentType, CallDescriptor};

/// Argument extraction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// The binding names a field the console does not have.
    #[error("Argument '{argument}' is bound to missing field '{field}'")]
    MissingField { argument: String, field: String },

    /// A mandatory argument has neither a binding nor a default.
    #[error("Call '{label}': argument '{argument}' has no binding and no default")]
    Unbound { label: String, argument: String },
}

/// Read, coerce and encode the bound arguments of a call.
pub fn extract_arguments(
    binding: &CallBinding,
    descriptor: &CallDescriptor,
    store: &dyn FieldStore,
) -> Result<Map<String, Value>, ArgumentError> {
    for source in binding.inputs.values() {
        if let InputSource::Field(id) | InputSource::JsonField(id) = source {
            store.flag_active(id);
        }
    }
    for id in binding.inputs_base64.values() {
        store.flag_active(id);
    }

    let read = |argument: &str, field: &str| {
        store.get(field).ok_or_else(|| ArgumentError::MissingField {
            argument: argument.to_string(),
            field: field.to_string(),
        })
    };

    let mut arguments = Map::new();
    for (argument, source) in &binding.inputs {
        let value = match source {
            InputSource::Field(field) => Value::String(read(argument, field)?),
            InputSource::JsonField(field) => {
                let raw = read(argument, field)?;
                serde_json::from_str(&raw).unwrap_or(Value::String(raw))
            }
            InputSource::Producer(produce) => produce(),
        };
        let value = match value {
            Value::String(raw) => coerce(&raw, descriptor.argument_type(argument)),
            other => other,
        };
        arguments.insert(argument.clone(), value);
    }

    for (argument, field) in &binding.inputs_base64 {
        let raw = read(argument, field)?;
        arguments.insert(argument.clone(), Value::String(STANDARD.encode(raw.as_bytes())));
    }

    Ok(arguments)
}

/// Coerce raw text by semantic type.
///
/// `number`: empty text is `0`, integers stay integers, anything that does
/// not parse becomes `null`.
pub fn coerce(raw: &str, ty: Option<ArgumentType>) -> Value {
    match ty {
        Some(ArgumentType::Number) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Value::from(0);
            }
            if let Ok(n) = trimmed.parse::<i64>() {
                return Value::from(n);
            }
            if let Ok(n) = trimmed.parse::<u64>() {
                return Value::from(n);
            }
            match trimmed.parse::<f64>() {
                Ok(n) => float_number(n),
                Err(_) => {
                    tracing::warn!(raw = %raw, "Numeric argument does not parse, sending null");
                    Value::Null
                }
            }
        }
        _ => Value::String(raw.to_string()),
    }
}

/// Whole floats in integer range go out as integers (`1e3` is `1000`).
fn float_number(n: f64) -> Value {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;
    if n.is_finite() && n.fract() == 0.0 {
        if (-I64_BOUND..I64_BOUND).contains(&n) {
            return Value::from(n as i64);
        }
        if (0.0..U64_BOUND).contains(&n) {
            return Value::from(n as u64);
        }
    }
    match Number::from_f64(n) {
        Some(n) => Value::Number(n),
        None => {
            tracing::warn!(value = n, "Numeric argument is not finite, sending null");
            Value::Null
        }
    }
}

/// Combine extracted values with the descriptor's fixed arguments and
/// defaults.
pub fn merge_with_descriptor(
    descriptor: &CallDescriptor,
    mut extracted: Map<String, Value>,
) -> Result<Map<String, Value>, ArgumentError> {
    let mut merged = Map::new();

    for (name, default) in &descriptor.modifiable_arguments {
        let value = match (extracted.remove(name), default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(ArgumentError::Unbound {
                    label: descriptor.label.clone(),
                    argument: name.clone(),
                })
            }
        };
        merged.insert(name.clone(), value);
    }

    for (name, default) in &descriptor.optional_arguments {
        if let Some(value) = extracted.remove(name).or_else(|| default.clone()) {
            merged.insert(name.clone(), value);
        }
    }

    for (name, value) in extracted {
        tracing::debug!(call = %descriptor.label, argument = %name, "Sending undeclared argument");
        merged.insert(name, value);
    }

    for (name, value) in &descriptor.fixed_arguments {
        merged.insert(name.clone(), value.clone());
    }

    Ok(merged)
}
