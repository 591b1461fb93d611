//! Request body serialization and transport selection.
//!
//! # Wire forms
//! - keyed: `{ "<method_field>": "<method>", "<arg>": <value>, ... }`
//! - positional: `{ "jsonrpc": "2.0", "id": n, "method": "<method>",
//!   "params": [<value>, ...] }` ordered by the descriptor's parameters
//!
//! # Transport
//! The light transport (GET) carries the body as the `command` query
//! parameter. Bodies longer than the threshold, or any body when POST is
//! forced, go in the heavy transport (POST) request body instead.

use std::time::Duration;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::{ServiceConfig, TransportConfig, WireFormat};
use crate::registry::CallDescriptor;

/// Query parameter carrying the body of a light request.
pub const COMMAND_PARAM: &str = "command";

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Invalid endpoint '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Which transport carries a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// GET with the body in the query string.
    Light,
    /// POST with the body as request body.
    Heavy,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Light => "get",
            TransportKind::Heavy => "post",
        }
    }
}

/// A request ready for a [`Transport`](crate::dispatch::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub kind: TransportKind,
    /// Full URL; for light requests it already carries the body.
    pub url: String,
    /// Request body of a heavy request.
    pub body: Option<String>,
    pub timeout: Duration,
}

impl TransportRequest {
    /// Build a request for `body` against `endpoint` under `settings`.
    pub fn build(endpoint: &str, body: String, settings: &TransportConfig) -> Result<Self, WireError> {
        let kind = select_transport(body.len(), settings);
        let timeout = Duration::from_secs(settings.timeout_secs);
        let mut url = url::Url::parse(endpoint).map_err(|source| WireError::InvalidUrl {
            url: endpoint.to_string(),
            source,
        })?;
        match kind {
            TransportKind::Light => {
                url.query_pairs_mut().append_pair(COMMAND_PARAM, &body);
                Ok(Self {
                    kind,
                    url: url.into(),
                    body: None,
                    timeout,
                })
            }
            TransportKind::Heavy => Ok(Self {
                kind,
                url: url.into(),
                body: Some(body),
                timeout,
            }),
        }
    }

    /// The serialized body, wherever it travels.
    pub fn command(&self) -> Option<String> {
        match &self.body {
            Some(body) => Some(body.clone()),
            None => url::Url::parse(&self.url).ok().and_then(|url| {
                url.query_pairs()
                    .find(|(key, _)| key == COMMAND_PARAM)
                    .map(|(_, value)| value.into_owned())
            }),
        }
    }
}

/// Light unless the body exceeds the threshold or POST is forced.
pub fn select_transport(body_len: usize, settings: &TransportConfig) -> TransportKind {
    if settings.force_post || body_len > settings.post_threshold {
        TransportKind::Heavy
    } else {
        TransportKind::Light
    }
}

/// Serialize a call in the service's wire form.
pub fn encode_body(
    descriptor: &CallDescriptor,
    arguments: Map<String, Value>,
    service: &ServiceConfig,
    request_id: u64,
) -> String {
    let method = descriptor.backend_method();
    match service.wire {
        WireFormat::Keyed => {
            let mut body = arguments;
            if body.contains_key(&service.method_field) {
                tracing::warn!(argument = %service.method_field, "Argument shadowed by the method field");
            }
            body.insert(service.method_field.clone(), Value::String(method.to_string()));
            Value::Object(body).to_string()
        }
        WireFormat::Positional => {
            let mut arguments = arguments;
            let params: Vec<Value> = descriptor
                .parameters
                .iter()
                .map(|name| arguments.remove(name).unwrap_or(Value::Null))
                .collect();
            for name in arguments.keys() {
                tracing::debug!(call = %descriptor.label, argument = %name, "Argument has no position, dropped");
            }
            json!({
                "jsonrpc": "2.0",
                "id": request_id,
                "method": method,
                "params": params,
            })
            .to_string()
        }
    }
}
