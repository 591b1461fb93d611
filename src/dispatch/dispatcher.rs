//! The dispatcher: one console action, end to end.
//!
//! # Data Flow
//! ```text
//! invoke(service, label)
//!     → binding + descriptor → arguments (extract, merge)
//!     → body (wire.rs) → TransportRequest per instance
//!     → Transport::submit (concurrent for broadcasts)
//!     → per response: parse → recovery decision → render → surface
//!       → interactions on the board → outputs → signers
//!     → bootstrap call when the recovery controller asks for one
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::binding::{
    extract_arguments, merge_with_descriptor, propagate_outputs, CallBinding, HookContext, JoinFormat,
    ResponseHandler, SignerCollection,
};
use crate::catalogue::{ids, Service};
use crate::config::{ConsoleConfig, ServiceConfig, TransportConfig};
use crate::dispatch::board::InteractionBoard;
use crate::dispatch::markup::{self, SurfacePage};
use crate::dispatch::transport::Transport;
use crate::dispatch::types::{Completion, DispatchError, DispatchResult, Handled, InstanceOutcome};
use crate::dispatch::wire::{encode_body, TransportRequest};
use crate::fields::{FieldStore, ProgressIndicator};
use crate::observability::metrics as obs_metrics;
use crate::observability::spans::dispatch_span;
use crate::registry::{CallDescriptor, CallRef};
use crate::resilience::{RecoveryController, RecoveryDecision, RecoveryOutcome};
use crate::transform::{scalar_text, BoundInteraction, TransformerTable};

/// How one instance's reply lands on its surface.
#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Sole reply: replaces markup and interactions.
    Replace,
    /// One of several broadcast replies: appended to the others.
    Append,
}

/// Shared, cheaply cloned handle to the dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    services: BTreeMap<String, Service>,
    endpoints: ArcSwap<BTreeMap<String, ServiceConfig>>,
    transport_settings: ArcSwap<TransportConfig>,
    store: Arc<dyn FieldStore>,
    transport: Arc<dyn Transport>,
    progress: ProgressIndicator,
    board: Mutex<InteractionBoard>,
    recovery: RecoveryController,
    request_ids: AtomicU64,
}

impl Dispatcher {
    pub fn new(
        services: BTreeMap<String, Service>,
        config: &ConsoleConfig,
        store: Arc<dyn FieldStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        for name in services.keys() {
            if !config.services.contains_key(name) {
                tracing::warn!(service = %name, "Service has no configured endpoint");
            }
        }
        let progress = ProgressIndicator::new(store.clone(), ids::PROGRESS);
        Self {
            inner: Arc::new(Inner {
                services,
                endpoints: ArcSwap::from_pointee(config.services.clone()),
                transport_settings: ArcSwap::from_pointee(config.transport.clone()),
                store,
                transport,
                progress,
                board: Mutex::new(InteractionBoard::new()),
                recovery: RecoveryController::new(config.recovery.clone()),
                request_ids: AtomicU64::new(1),
            }),
        }
    }

    /// Swap in reloaded endpoints, transport and recovery settings.
    /// In-flight dispatches finish with the settings they started with.
    pub fn apply_config(&self, config: &ConsoleConfig) {
        self.inner.endpoints.store(Arc::new(config.services.clone()));
        self.inner.transport_settings.store(Arc::new(config.transport.clone()));
        self.inner.recovery.update(config.recovery.clone());
        tracing::info!(services = config.services.len(), "Dispatcher settings reloaded");
    }

    pub fn services(&self) -> &BTreeMap<String, Service> {
        &self.inner.services
    }

    pub fn service(&self, name: &str) -> DispatchResult<&Service> {
        self.inner
            .services
            .get(name)
            .ok_or_else(|| DispatchError::UnknownService(name.to_string()))
    }

    pub fn store(&self) -> &Arc<dyn FieldStore> {
        &self.inner.store
    }

    pub fn recovery(&self) -> &RecoveryController {
        &self.inner.recovery
    }

    /// Interactions currently bound on `surface`.
    pub fn interactions(&self, surface: &str) -> Vec<BoundInteraction> {
        self.lock_board().interactions(surface).to_vec()
    }

    /// Reset the aggregate-signature form and its surface.
    pub fn clear_aggregate(&self) {
        ids::clear_aggregate(self.inner.store.as_ref());
        self.inner.store.set_markup(ids::surface::FAB_CRYPTO, "");
        self.lock_board().clear(ids::surface::FAB_CRYPTO);
    }

    /// Run `label` of `service` and handle every response.
    ///
    /// Errors raised before any request is sent are returned as `Err`, as
    /// is the failure of a call that went to a single instance. Broadcasts
    /// report per-instance results in the completion.
    pub async fn invoke(&self, service: &str, label: &str) -> DispatchResult<Completion> {
        let call = CallRef::new(service, label);
        let dispatch_id = Uuid::new_v4();
        let span = dispatch_span(dispatch_id, &call);
        self.run(dispatch_id, call).instrument(span).await
    }

    /// Fire a call without waiting for it.
    pub fn spawn_invoke(&self, service: &str, label: &str) -> tokio::task::JoinHandle<DispatchResult<Completion>> {
        let dispatcher = self.clone();
        let (service, label) = (service.to_string(), label.to_string());
        tokio::spawn(async move { dispatcher.invoke(&service, &label).await })
    }

    /// Perform a bound interaction: write its field updates, then run its
    /// trigger call if it has one.
    pub async fn activate(&self, interaction_id: usize) -> DispatchResult<Option<Completion>> {
        let interaction = self
            .lock_board()
            .find(interaction_id)
            .cloned()
            .ok_or(DispatchError::UnknownInteraction(interaction_id))?;

        tracing::debug!(
            id = interaction_id,
            path = %interaction.path_string(),
            updates = interaction.updates.len(),
            "Interaction activated"
        );
        for update in &interaction.updates {
            update.apply(self.inner.store.as_ref());
        }

        match &interaction.trigger {
            Some(trigger) => Ok(Some(self.invoke(&trigger.service, &trigger.label).await?)),
            None => Ok(None),
        }
    }

    async fn run(&self, dispatch_id: Uuid, call: CallRef) -> DispatchResult<Completion> {
        let service = self.service(&call.service)?;
        let binding = service.bindings.get_or_default(&call.label);
        let descriptor = service.registry.lookup(binding.call_label())?;
        let endpoint = self.endpoint(&call.service)?;

        self.inner.store.clear_flags();
        let body = self.encode(&binding, descriptor, &endpoint)?;

        let urls: Vec<&String> = if descriptor.single_node_only {
            endpoint.urls.iter().take(1).collect()
        } else {
            endpoint.urls.iter().collect()
        };
        let settings = self.inner.transport_settings.load_full();
        let family_table = service.bindings.family().transformers.clone();

        obs_metrics::record_call(&call.service, &call.label);
        tracing::debug!(method = %descriptor.backend_method(), instances = urls.len(), "Dispatching");
        self.inner.progress.begin(dispatch_id, &call.label);

        // Broadcast replies share the surface; start it empty and append each.
        let placement = if urls.len() > 1 {
            self.lock_board().clear(&binding.surface);
            self.inner.store.set_markup(&binding.surface, "");
            Placement::Append
        } else {
            Placement::Replace
        };
        let mut instances = join_all(urls.into_iter().map(|url| {
            self.dispatch_to(&call, &binding, &family_table, url, body.clone(), &settings, placement)
        }))
        .await;

        let ok = instances.iter().all(|i| i.result.is_ok());
        self.inner.progress.finish(dispatch_id, ok);

        if let [InstanceOutcome { result: Err(_), .. }] = instances.as_slice() {
            if let Some(InstanceOutcome { result: Err(e), .. }) = instances.pop() {
                return Err(e);
            }
        }
        Ok(Completion {
            dispatch_id,
            call,
            instances,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch_to(
        &self,
        call: &CallRef,
        binding: &CallBinding,
        family_table: &TransformerTable,
        url: &str,
        body: String,
        settings: &TransportConfig,
        placement: Placement,
    ) -> InstanceOutcome {
        let result = self.request(call, url, body, settings).await;
        let result = match result {
            Ok(raw) => {
                self.handle_response(call, binding, family_table, &raw, placement)
                    .await
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Request failed");
                self.place(&binding.surface, &markup::transport_failure(&e.to_string()), placement);
                Err(e)
            }
        };
        InstanceOutcome {
            url: url.to_string(),
            result,
        }
    }

    async fn request(&self, call: &CallRef, url: &str, body: String, settings: &TransportConfig) -> DispatchResult<String> {
        let request = TransportRequest::build(url, body, settings)?;
        obs_metrics::record_transport(request.kind.as_str());
        tracing::trace!(kind = request.kind.as_str(), url = %request.url, "Submitting");

        let start = Instant::now();
        let result = self.inner.transport.submit(request).await;
        obs_metrics::record_duration(&call.service, start);
        Ok(result?)
    }

    async fn handle_response(
        &self,
        call: &CallRef,
        binding: &CallBinding,
        family_table: &TransformerTable,
        raw: &str,
        placement: Placement,
    ) -> DispatchResult<Handled> {
        let store = self.inner.store.as_ref();
        let surface = binding.surface.as_str();

        // Custom hooks own the raw text, JSON or not.
        if let ResponseHandler::Custom(hook) = &binding.handler {
            let ctx = HookContext { call, surface, store };
            hook.on_response(raw, &ctx).map_err(|e| DispatchError::Hook {
                call: call.clone(),
                reason: e.to_string(),
            })?;
            return Ok(Handled::default());
        }

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                obs_metrics::record_malformed_response(&call.service);
                tracing::warn!(error = %e, "Response is not JSON");
                self.place(surface, &markup::malformed(raw, &e.to_string()), placement);
                if let Placement::Replace = placement {
                    self.lock_board().clear(surface);
                }
                return Err(DispatchError::MalformedResponse {
                    call: call.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let backend_error = value.get("error").filter(|e| !e.is_null()).map(scalar_text);
        if let Some(error) = &backend_error {
            obs_metrics::record_backend_error(&call.service);
            tracing::info!(error = %error, "Backend reported an error");
        }

        let decision = self.inner.recovery.assess(call, backend_error.as_deref());
        let notice = match &decision {
            RecoveryDecision::None => None,
            RecoveryDecision::Bootstrap { call: bootstrap, .. } => Some(markup::bootstrap_notice(&bootstrap.label)),
            RecoveryDecision::Refused { attempts } => Some(markup::refusal_notice(*attempts)),
        };

        let verification = match binding.handler {
            ResponseHandler::VerificationBanner => value.get("result").map(is_affirmative),
            _ => None,
        };

        let rendering = match placement {
            Placement::Replace => self.lock_board().publish(surface, &value, &binding.transformers),
            Placement::Append => self.lock_board().append(surface, &value, &binding.transformers),
        };
        let page = SurfacePage {
            verification,
            backend_error: backend_error.as_deref(),
            result_html: value.get("resultHTML").and_then(Value::as_str),
            rendering: &rendering.markup,
            notice,
        };
        self.place(surface, &page.into_string(), placement);

        propagate_outputs(&value, &binding.outputs, store);
        if let ResponseHandler::CollectSigners(collections) = &binding.handler {
            collect_signers(&value, collections, store);
        }

        let recovery = match decision {
            RecoveryDecision::None => None,
            RecoveryDecision::Refused { attempts } => {
                obs_metrics::record_recovery("refused");
                Some(RecoveryOutcome::Refused { attempts })
            }
            RecoveryDecision::Bootstrap { call: bootstrap, attempt } => {
                let outcome = self.bootstrap(&bootstrap, attempt, surface, family_table).await;
                self.inner.recovery.complete(call);
                Some(outcome)
            }
        };

        Ok(Handled {
            backend_error,
            interaction_ids: rendering.interactions.iter().map(|i| i.id).collect(),
            recovery,
        })
    }

    /// Issue the bootstrap call and append its rendering to `surface`.
    async fn bootstrap(
        &self,
        bootstrap: &CallRef,
        attempt: u32,
        surface: &str,
        table: &TransformerTable,
    ) -> RecoveryOutcome {
        let store = self.inner.store.as_ref();
        let parsed = match self.bootstrap_request(bootstrap).await {
            Ok(raw) => serde_json::from_str::<Value>(&raw).map_err(|e| format!("malformed response: {e}")),
            Err(e) => Err(e.to_string()),
        };

        let current = store.markup(surface).unwrap_or_default();
        match parsed {
            Ok(value) => {
                let rendering = self.lock_board().append(surface, &value, table);
                store.set_markup(surface, &format!("{current}<br>{}", rendering.markup));
                obs_metrics::record_recovery("started");
                tracing::info!(bootstrap = %bootstrap, attempt, "Dependency start requested");
                RecoveryOutcome::Bootstrapped { attempt }
            }
            Err(reason) => {
                let notice = markup::bootstrap_failure(&reason).into_string();
                store.set_markup(surface, &format!("{current}{notice}"));
                obs_metrics::record_recovery("failed");
                tracing::warn!(bootstrap = %bootstrap, attempt, reason = %reason, "Dependency start failed");
                RecoveryOutcome::BootstrapFailed { attempt, reason }
            }
        }
    }

    async fn bootstrap_request(&self, bootstrap: &CallRef) -> DispatchResult<String> {
        let service = self.service(&bootstrap.service)?;
        let binding = service.bindings.get_or_default(&bootstrap.label);
        let descriptor = service.registry.lookup(binding.call_label())?;
        let endpoint = self.endpoint(&bootstrap.service)?;
        let body = self.encode(&binding, descriptor, &endpoint)?;
        let url = endpoint
            .urls
            .first()
            .ok_or_else(|| DispatchError::UnknownService(bootstrap.service.clone()))?;
        let settings = self.inner.transport_settings.load_full();
        self.request(bootstrap, url, body, &settings).await
    }

    fn encode(&self, binding: &CallBinding, descriptor: &CallDescriptor, endpoint: &ServiceConfig) -> DispatchResult<String> {
        let extracted = extract_arguments(binding, descriptor, self.inner.store.as_ref())?;
        let arguments = merge_with_descriptor(descriptor, extracted)?;
        let request_id = self.inner.request_ids.fetch_add(1, Ordering::Relaxed);
        Ok(encode_body(descriptor, arguments, endpoint, request_id))
    }

    fn endpoint(&self, service: &str) -> DispatchResult<ServiceConfig> {
        self.inner
            .endpoints
            .load()
            .get(service)
            .filter(|endpoint| !endpoint.urls.is_empty())
            .cloned()
            .ok_or_else(|| DispatchError::UnknownService(service.to_string()))
    }

    fn place(&self, surface: &str, html: &str, placement: Placement) {
        let store = self.inner.store.as_ref();
        match placement {
            Placement::Replace => store.set_markup(surface, html),
            Placement::Append => match store.markup(surface).filter(|current| !current.is_empty()) {
                Some(current) => store.set_markup(surface, &format!("{current}<br>{html}")),
                None => store.set_markup(surface, html),
            },
        }
    }

    fn lock_board(&self) -> MutexGuard<'_, InteractionBoard> {
        match self.inner.board.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("services", &self.inner.services.keys().collect::<Vec<_>>())
            .field("recovery", &self.inner.recovery)
            .finish()
    }
}

fn is_affirmative(result: &Value) -> bool {
    matches!(result, Value::Bool(true)) || result.as_str() == Some("true")
}

/// Join `signers[*].<key>` into each collection's field.
fn collect_signers(value: &Value, collections: &[SignerCollection], store: &dyn FieldStore) {
    let Some(signers) = value.get("signers").and_then(Value::as_array) else {
        tracing::debug!("Response has no signers");
        return;
    };
    for collection in collections {
        let entries: Vec<String> = signers
            .iter()
            .filter_map(|signer| signer.get(&collection.key))
            .map(scalar_text)
            .collect();
        let text = match collection.format {
            JoinFormat::CommaSeparated => entries.join(", "),
            JoinFormat::JsonArray => Value::from(entries).to_string(),
        };
        store.set(&collection.field, &text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{fields, output_map, BindingSet, CallFamily, HookResult, ResponseHook};
    use crate::config::RecoveryConfig;
    use crate::dispatch::transport::TransportError;
    use crate::dispatch::wire::TransportKind;
    use crate::fields::MemoryFieldStore;
    use crate::registry::CallRegistry;
    use crate::resilience::RecoveryState;
    use crate::transform::{FieldUpdate, Transformer};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;

    const SENTINEL: &str = "Fabcoind was never started";

    /// Records requests and answers from a per-URL script.
    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<TransportRequest>>,
        replies: Mutex<BTreeMap<String, VecDeque<Result<String, TransportError>>>>,
    }

    impl RecordingTransport {
        fn reply(&self, url: &str, body: &str) {
            self.replies
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(Ok(body.to_string()));
        }

        fn fail(&self, url: &str) {
            self.replies
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(Err(TransportError::Timeout { url: url.to_string() }));
        }

        fn requests(&self) -> Vec<TransportRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn requests_to(&self, prefix: &str) -> Vec<TransportRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.url.starts_with(prefix))
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn submit(&self, request: TransportRequest) -> Result<String, TransportError> {
            let base = request.url.split('?').next().unwrap_or_default().to_string();
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .get_mut(&base)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(r#"{"result":"ok"}"#.to_string()))
        }
    }

    /// Keeps the raw reply text in the `rawLog` field.
    struct RawLog;

    impl ResponseHook for RawLog {
        fn on_response(&self, raw: &str, ctx: &HookContext<'_>) -> HookResult {
            ctx.store.set("rawLog", raw);
            Ok(())
        }
    }

    const NODE: &str = "http://node-a/rpc";
    const NODE_B: &str = "http://node-b/rpc";
    const INIT: &str = "http://node-a/initialization";

    fn services() -> BTreeMap<String, Service> {
        let family = CallFamily::new("outputNode", TransformerTable::new());
        let registry = CallRegistry::new(
            "node",
            vec![
                CallDescriptor::new("testSha3").modifiable("message"),
                CallDescriptor::new("getBlockCount"),
                CallDescriptor::new("getBestBlockHash").single_node(),
                CallDescriptor::new("getChainTips"),
                CallDescriptor::new("getLogFile"),
                CallDescriptor::new("getBlockByHash")
                    .modifiable("hash")
                    .fixed("verbose", json!(true)),
            ],
        )
        .unwrap();
        let table = Arc::new(
            TransformerTable::from_entries([(
                "result.hash",
                Transformer::fill_and_run("blockHash", CallRef::new("node", "getBlockByHash"), "Get block"),
            )])
            .unwrap(),
        );
        let bindings = BindingSet::new(
            family.clone(),
            vec![
                CallBinding::new("testSha3", &family)
                    .input("message", "message")
                    .outputs(output_map([("result", fields(&["fieldX"]))])),
                CallBinding::new("getBestBlockHash", &family).transformers(table.clone()),
                CallBinding::new("getChainTips", &family).transformers(table),
                CallBinding::new("getLogFile", &family).handler(ResponseHandler::Custom(Arc::new(RawLog))),
                CallBinding::new("getBlockByHash", &family).input("hash", "blockHash"),
            ],
            &registry,
        )
        .unwrap();

        let init_family = CallFamily::new("outputInit", TransformerTable::new());
        let init_registry = CallRegistry::new(
            "initialization",
            vec![CallDescriptor::new("runFabcoind").modifiable_with_default("net", json!("regtest"))],
        )
        .unwrap();
        let init_bindings = BindingSet::new(init_family, Vec::new(), &init_registry).unwrap();

        [
            Service::new(registry, bindings),
            Service::new(init_registry, init_bindings),
        ]
        .into_iter()
        .map(|s| (s.name().to_string(), s))
        .collect()
    }

    fn config(urls: &[&str]) -> ConsoleConfig {
        let mut config = ConsoleConfig::default();
        config.services.clear();
        config.services.insert(
            "node".into(),
            ServiceConfig {
                urls: urls.iter().map(|u| u.to_string()).collect(),
                ..ServiceConfig::keyed(NODE, "rpcCall")
            },
        );
        config
            .services
            .insert("initialization".into(), ServiceConfig::keyed(INIT, "fabcoinInitialization"));
        config.recovery = RecoveryConfig {
            bootstrap_service: "initialization".into(),
            ..RecoveryConfig::default()
        };
        config
    }

    fn setup(urls: &[&str]) -> (Dispatcher, Arc<MemoryFieldStore>, Arc<RecordingTransport>) {
        let store = Arc::new(MemoryFieldStore::new());
        store.declare("message", "hello");
        store.declare("blockHash", "");
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(services(), &config(urls), store.clone(), transport.clone());
        (dispatcher, store, transport)
    }

    #[tokio::test]
    async fn test_output_propagation_end_to_end() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        transport.reply(NODE, r#"{"result":"hello"}"#);

        let completion = dispatcher.invoke("node", "testSha3").await.unwrap();
        assert!(completion.is_success());
        assert_eq!(store.get("fieldX").as_deref(), Some("hello"));
        assert!(store.is_active("message"));
        assert!(store.markup("outputNode").unwrap().contains("hello"));

        let sent = transport.requests();
        assert_eq!(sent[0].kind, TransportKind::Light);
        let body: Value = serde_json::from_str(&sent[0].command().unwrap()).unwrap();
        assert_eq!(body, json!({ "rpcCall": "testSha3", "message": "hello" }));
        assert!(store.get(ids::PROGRESS).unwrap().starts_with("testSha3: done"));
    }

    #[tokio::test]
    async fn test_transport_selection_by_length() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        // {"message":"…","rpcCall":"testSha3"} is 35 bytes plus the message.
        store.set("message", &"a".repeat(1000 - 35));
        dispatcher.invoke("node", "testSha3").await.unwrap();
        store.set("message", &"a".repeat(1001 - 35));
        dispatcher.invoke("node", "testSha3").await.unwrap();

        let kinds: Vec<_> = transport.requests().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![TransportKind::Light, TransportKind::Heavy]);
        assert_eq!(transport.requests()[0].command().unwrap().len(), 1000);
    }

    #[tokio::test]
    async fn test_malformed_response_reported_inline() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        transport.reply(NODE, "<html>502</html>");

        let err = dispatcher.invoke("node", "getBlockCount").await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse { .. }));
        assert!(store.markup("outputNode").unwrap().contains("Malformed response"));
        assert!(store.get(ids::PROGRESS).unwrap().contains("failed"));
    }

    #[tokio::test]
    async fn test_custom_hook_receives_raw_text() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        let log = "2024-05-01 fabcoind started\nlistening on 18332";
        transport.reply(NODE, log);

        let completion = dispatcher.invoke("node", "getLogFile").await.unwrap();
        assert!(completion.is_success());
        assert_eq!(store.get("rawLog").as_deref(), Some(log));
        assert!(!store.markup("outputNode").unwrap_or_default().contains("Malformed response"));
    }

    #[tokio::test]
    async fn test_unbound_argument_sends_nothing() {
        let (dispatcher, _store, transport) = setup(&[NODE]);
        let err = dispatcher.invoke("node", "getBlockByHash").await;
        // blockHash is declared but empty, so the argument is bound.
        assert!(err.is_ok());

        let services = services();
        let store: Arc<MemoryFieldStore> = Arc::new(MemoryFieldStore::new());
        let dispatcher = Dispatcher::new(services, &config(&[NODE]), store, transport.clone());
        let before = transport.requests().len();
        let err = dispatcher.invoke("node", "getBlockByHash").await.unwrap_err();
        assert!(matches!(err, DispatchError::Argument(_)));
        assert_eq!(transport.requests().len(), before);
    }

    #[tokio::test]
    async fn test_broadcast_and_single_node() {
        let (dispatcher, _store, transport) = setup(&[NODE, NODE_B]);
        transport.fail(NODE_B);

        let completion = dispatcher.invoke("node", "getBlockCount").await.unwrap();
        assert_eq!(completion.instances.len(), 2);
        assert!(!completion.is_success());
        let failed: Vec<_> = completion.failures().map(|(url, _)| url).collect();
        assert_eq!(failed, vec![NODE_B]);

        dispatcher.invoke("node", "getBestBlockHash").await.unwrap();
        assert_eq!(transport.requests_to(NODE_B).len(), 1);
        assert_eq!(transport.requests_to(NODE).len(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_keeps_every_reply() {
        let (dispatcher, store, transport) = setup(&[NODE, NODE_B]);
        let hash_a = "aa".repeat(32);
        let hash_b = "bb".repeat(32);
        transport.reply(NODE, &json!({ "result": { "hash": hash_a } }).to_string());
        transport.reply(NODE_B, &json!({ "result": { "hash": hash_b } }).to_string());

        let completion = dispatcher.invoke("node", "getChainTips").await.unwrap();
        assert!(completion.is_success());
        assert_eq!(dispatcher.interactions("outputNode").len(), 2);
        assert!(store.markup("outputNode").unwrap().contains("<br>"));

        let from_b = completion
            .instances
            .iter()
            .find(|i| i.url == NODE_B)
            .and_then(|i| i.result.as_ref().ok())
            .map(|handled| handled.interaction_ids[0])
            .unwrap();
        dispatcher.activate(from_b).await.unwrap().unwrap();
        assert_eq!(store.get("blockHash"), Some(hash_b));

        // The next broadcast starts the surface over.
        dispatcher.invoke("node", "getChainTips").await.unwrap();
        assert!(dispatcher.interactions("outputNode").is_empty());
    }

    #[tokio::test]
    async fn test_single_instance_failure_is_err() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        transport.fail(NODE);
        let err = dispatcher.invoke("node", "getBlockCount").await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(TransportError::Timeout { .. })));
        assert!(store.markup("outputNode").unwrap().contains("Request failed"));
    }

    #[tokio::test]
    async fn test_activate_fills_and_runs_trigger() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        let hash = "6a0f4c2c1b9f0e3f4d4e1c77b5b7c0b9c1d2e3f405162738495a6b7c8d9e0f1a";
        transport.reply(NODE, &json!({ "result": { "hash": hash } }).to_string());

        let completion = dispatcher.invoke("node", "getBestBlockHash").await.unwrap();
        let id = completion.first().unwrap().interaction_ids[0];
        let bound = dispatcher.interactions("outputNode");
        assert_eq!(
            bound[0].updates,
            vec![FieldUpdate::Set {
                field: "blockHash".into(),
                value: hash.into()
            }]
        );

        let triggered = dispatcher.activate(id).await.unwrap().unwrap();
        assert_eq!(triggered.call, CallRef::new("node", "getBlockByHash"));
        assert_eq!(store.get("blockHash").as_deref(), Some(hash));

        let last = transport.requests().pop().unwrap();
        let body: Value = serde_json::from_str(&last.command().unwrap()).unwrap();
        assert_eq!(body["hash"], json!(hash));
        assert_eq!(body["verbose"], json!(true));

        assert!(matches!(
            dispatcher.activate(9999).await,
            Err(DispatchError::UnknownInteraction(9999))
        ));
    }

    #[tokio::test]
    async fn test_sentinel_bootstraps_once() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        let sentinel = json!({ "error": SENTINEL }).to_string();
        transport.reply(NODE, &sentinel);
        transport.reply(INIT, r#"{"started":"fabcoind -regtest"}"#);

        let completion = dispatcher.invoke("node", "getBlockCount").await.unwrap();
        let handled = completion.first().unwrap();
        assert_eq!(handled.backend_error.as_deref(), Some(SENTINEL));
        assert_eq!(handled.recovery, Some(RecoveryOutcome::Bootstrapped { attempt: 1 }));

        let bootstrap = transport.requests_to(INIT);
        assert_eq!(bootstrap.len(), 1);
        let body: Value = serde_json::from_str(&bootstrap[0].command().unwrap()).unwrap();
        assert_eq!(body, json!({ "fabcoinInitialization": "runFabcoind", "net": "regtest" }));

        let call = CallRef::new("node", "getBlockCount");
        assert_eq!(dispatcher.recovery().state(&call), RecoveryState::Normal);

        let page = store.markup("outputNode").unwrap();
        let error_at = page.find(SENTINEL).unwrap();
        let bootstrap_at = page.find("fabcoind -regtest").unwrap();
        assert!(error_at < bootstrap_at);

        // Still down: refused, no second bootstrap.
        transport.reply(NODE, &sentinel);
        let completion = dispatcher.invoke("node", "getBlockCount").await.unwrap();
        assert_eq!(
            completion.first().unwrap().recovery,
            Some(RecoveryOutcome::Refused { attempts: 1 })
        );
        assert_eq!(transport.requests_to(INIT).len(), 1);
        assert!(store.markup("outputNode").unwrap().contains("start it manually"));
    }

    #[tokio::test]
    async fn test_failed_bootstrap_still_returns_to_normal() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        transport.reply(NODE, &json!({ "error": SENTINEL }).to_string());
        transport.fail(INIT);

        let completion = dispatcher.invoke("node", "getBlockCount").await.unwrap();
        assert!(matches!(
            completion.first().unwrap().recovery,
            Some(RecoveryOutcome::BootstrapFailed { attempt: 1, .. })
        ));
        assert!(store.markup("outputNode").unwrap().contains("Automatic start failed"));
        assert_eq!(
            dispatcher.recovery().state(&CallRef::new("node", "getBlockCount")),
            RecoveryState::Normal
        );
    }

    #[tokio::test]
    async fn test_other_backend_error_is_terminal() {
        let (dispatcher, store, transport) = setup(&[NODE]);
        transport.reply(NODE, r#"{"error":"Block not found","resultHTML":"<i>node a</i>"}"#);

        let completion = dispatcher.invoke("node", "getBlockCount").await.unwrap();
        assert_eq!(completion.first().unwrap().recovery, None);
        assert!(transport.requests_to(INIT).is_empty());
        let page = store.markup("outputNode").unwrap();
        assert!(page.contains("Block not found"));
        assert!(page.contains("<i>node a</i>"));
    }

    #[tokio::test]
    async fn test_reload_applies_to_next_call() {
        let (dispatcher, _store, transport) = setup(&[NODE]);
        let mut reloaded = config(&[NODE]);
        reloaded.transport.force_post = true;
        dispatcher.apply_config(&reloaded);

        dispatcher.invoke("node", "getBlockCount").await.unwrap();
        assert_eq!(transport.requests()[0].kind, TransportKind::Heavy);
    }

    #[tokio::test]
    async fn test_spawned_calls_are_independent() {
        let (dispatcher, _store, transport) = setup(&[NODE]);
        let a = dispatcher.spawn_invoke("node", "getBlockCount");
        let b = dispatcher.spawn_invoke("node", "testSha3");
        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        assert_eq!(transport.requests().len(), 2);
        assert!(matches!(
            dispatcher.invoke("nope", "x").await,
            Err(DispatchError::UnknownService(_))
        ));
    }

    #[test]
    fn test_collect_signers() {
        let store = MemoryFieldStore::new();
        let value = json!({ "signers": [
            { "myPublicKey": "02aa", "myNonce": "n1" },
            { "myPublicKey": "02bb", "myNonce": "n2" }
        ]});
        collect_signers(
            &value,
            &[
                SignerCollection::new("myPublicKey", "keys", JoinFormat::CommaSeparated),
                SignerCollection::new("myPublicKey", "keysJson", JoinFormat::JsonArray),
                SignerCollection::new("myNonce", "nonces", JoinFormat::CommaSeparated),
            ],
            &store,
        );
        assert_eq!(store.get("keys").as_deref(), Some("02aa, 02bb"));
        assert_eq!(store.get("keysJson").as_deref(), Some(r#"["02aa","02bb"]"#));
        assert_eq!(store.get("nonces").as_deref(), Some("n1, n2"));
    }
}
