//! Session state: the single source of truth for "authenticated or not".
//!
//! [`SessionStore`] holds the current [`Credential`] and the identity label
//! derived from it. Every mutation is published through a
//! [`tokio::sync::watch`] channel so the guard and the presentation layer can
//! observe it.
//!
//! Each credential write bumps a generation counter. Asynchronous
//! continuations capture the generation they were issued under and compare it
//! on completion, so a response that arrives after a logout or a new login
//! cannot act on the wrong session.
//!
//! Nothing is persisted: a fresh process always starts unauthenticated.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::credential::Credential;

/// Snapshot of the session published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current bearer credential.
    pub credential: Option<Credential>,

    /// Display label of the session owner.
    pub identity_label: Option<String>,

    /// Incremented on every credential write.
    pub generation: u64,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}

/// Holds the session credential and identity label.
///
/// No validation of the token shape happens here. Writers fully replace the
/// value, so the last writer wins.
#[derive(Debug)]
pub struct SessionStore {
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create an unauthenticated session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { state }
    }

    /// Replace the credential.
    ///
    /// Setting `None` also drops the identity label: an identity is never
    /// kept without the credential it was derived from.
    pub fn set_credential(&self, credential: Option<Credential>) {
        self.state.send_modify(|state| {
            state.generation += 1;
            if credential.is_none() {
                state.identity_label = None;
            }
            info!(
                generation = state.generation,
                authenticated = credential.is_some(),
                "Session credential updated"
            );
            state.credential = credential;
        });
    }

    /// Current credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().credential.clone()
    }

    /// Current credential together with the generation it belongs to.
    pub fn credential_with_generation(&self) -> Option<(Credential, u64)> {
        let state = self.state.borrow();
        state
            .credential
            .clone()
            .map(|credential| (credential, state.generation))
    }

    /// Set or clear the identity label.
    ///
    /// Ignored while no credential is held.
    pub fn set_identity(&self, label: Option<String>) {
        self.state.send_if_modified(|state| {
            if state.credential.is_none() && label.is_some() {
                debug!("Ignoring identity label for an unauthenticated session");
                return false;
            }
            if state.identity_label == label {
                return false;
            }
            state.identity_label = label;
            true
        });
    }

    /// Current identity label, if any.
    pub fn identity_label(&self) -> Option<String> {
        self.state.borrow().identity_label.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Whether `generation` is still the live, authenticated session.
    pub fn is_current(&self, generation: u64) -> bool {
        let state = self.state.borrow();
        state.credential.is_some() && state.generation == generation
    }

    /// Clear credential and identity.
    ///
    /// Clearing an already empty session is a no-op and publishes nothing.
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            if state.credential.is_none() && state.identity_label.is_none() {
                return false;
            }
            state.generation += 1;
            state.credential = None;
            state.identity_label = None;
            info!(generation = state.generation, "Session cleared");
            true
        });
    }

    /// Clear the session only if it is still the one identified by `generation`.
    ///
    /// Returns `true` when the session was cleared by this call.
    pub fn invalidate(&self, generation: u64) -> bool {
        self.state.send_if_modified(|state| {
            if state.credential.is_none() || state.generation != generation {
                return false;
            }
            state.generation += 1;
            state.credential = None;
            state.identity_label = None;
            info!(generation = state.generation, "Session invalidated");
            true
        })
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
