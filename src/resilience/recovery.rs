//! Auto-recovery of a stopped dependency.
//!
//! # States
//! - Normal: responses are handled as they come
//! - RecoveringDependency: a bootstrap call is in flight for this call
//!
//! # State Transitions
//! ```text
//! Normal → RecoveringDependency: sentinel error, attempts < max_attempts
//! RecoveringDependency → Normal: bootstrap completed (either way)
//! Normal → Normal: sentinel error with attempts exhausted (refused)
//! any → Normal, attempts = 0: response without the sentinel
//! ```
//!
//! # Design Decisions
//! - State is tracked per call, so one failing call does not block others
//! - A sentinel seen while a bootstrap is already in flight is refused

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::RecoveryConfig;
use crate::registry::CallRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryState {
    #[default]
    Normal,
    RecoveringDependency,
}

/// What to do with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryDecision {
    /// Not a sentinel response, or recovery disabled.
    None,
    /// Issue `call`; this is attempt number `attempt` (1-based).
    Bootstrap { call: CallRef, attempt: u32 },
    /// Sentinel seen but no attempt left.
    Refused { attempts: u32 },
}

/// How a recovery ended, reported in the completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Bootstrapped { attempt: u32 },
    BootstrapFailed { attempt: u32, reason: String },
    Refused { attempts: u32 },
}

#[derive(Debug, Default)]
struct CallRecovery {
    state: RecoveryState,
    attempts: u32,
}

/// Per-call recovery state machine.
pub struct RecoveryController {
    settings: ArcSwap<RecoveryConfig>,
    calls: DashMap<CallRef, CallRecovery>,
}

impl RecoveryController {
    pub fn new(settings: RecoveryConfig) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            calls: DashMap::new(),
        }
    }

    /// Replace the settings. Attempt counts are kept.
    pub fn update(&self, settings: RecoveryConfig) {
        self.settings.store(Arc::new(settings));
    }

    pub fn settings(&self) -> Arc<RecoveryConfig> {
        self.settings.load_full()
    }

    /// True if `error` is the configured sentinel.
    pub fn is_sentinel(&self, error: &str) -> bool {
        let settings = self.settings.load();
        settings.enabled && error == settings.sentinel
    }

    /// Decide on the `error` field of a response to `call`.
    pub fn assess(&self, call: &CallRef, error: Option<&str>) -> RecoveryDecision {
        let settings = self.settings.load();
        let sentinel = settings.enabled && error == Some(settings.sentinel.as_str());

        let mut entry = self.calls.entry(call.clone()).or_default();
        if !sentinel {
            if entry.attempts > 0 {
                tracing::debug!(call = %call, "Dependency answered, recovery count reset");
            }
            entry.attempts = 0;
            return RecoveryDecision::None;
        }

        if entry.state == RecoveryState::RecoveringDependency || entry.attempts >= settings.max_attempts {
            tracing::warn!(call = %call, attempts = entry.attempts, "Recovery refused");
            return RecoveryDecision::Refused { attempts: entry.attempts };
        }

        entry.attempts += 1;
        entry.state = RecoveryState::RecoveringDependency;
        tracing::info!(call = %call, attempt = entry.attempts, bootstrap = %settings.bootstrap_call, "Starting dependency");
        RecoveryDecision::Bootstrap {
            call: CallRef::new(settings.bootstrap_service.clone(), settings.bootstrap_call.clone()),
            attempt: entry.attempts,
        }
    }

    /// The bootstrap for `call` finished.
    pub fn complete(&self, call: &CallRef) {
        if let Some(mut entry) = self.calls.get_mut(call) {
            entry.state = RecoveryState::Normal;
        }
    }

    pub fn state(&self, call: &CallRef) -> RecoveryState {
        self.calls.get(call).map(|e| e.state).unwrap_or_default()
    }

    pub fn attempts(&self, call: &CallRef) -> u32 {
        self.calls.get(call).map(|e| e.attempts).unwrap_or(0)
    }
}

impl std::fmt::Debug for RecoveryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryController")
            .field("settings", &self.settings.load())
            .field("tracked_calls", &self.calls.len())
            .finish()
    }
}
