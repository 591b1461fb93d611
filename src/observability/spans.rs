//! Dispatch spans.
//!
//! Every dispatch runs inside a span carrying a fresh v4 id, so the events
//! of concurrent calls on the same surface can be told apart.

use tracing::Span;
use uuid::Uuid;

use crate::registry::CallRef;

/// Span for one dispatch of `call`.
pub fn dispatch_span(dispatch_id: Uuid, call: &CallRef) -> Span {
    tracing::info_span!(
        "dispatch",
        id = %dispatch_id,
        service = %call.service,
        call = %call.label,
    )
}
