//! Access guard for protected views.
//!
//! The guard is a two-state machine driven only by credential presence in the
//! [`SessionStore`]. Evaluation is a pure read of the session at call time:
//!
//! - **Authenticated**: protected content may render and resource fetches may start.
//! - **Unauthenticated**: a "disconnected" placeholder renders and a navigation
//!   to the connect view is scheduled after a short delay.
//!
//! The deferred navigation is owned by a [`RedirectHandle`]. Dropping the
//! handle is how the surrounding view unmounts, and it cancels the redirect
//! if it has not fired yet.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::router::{Navigation, Navigator};
use crate::session::SessionStore;

/// Delay before redirecting an unauthenticated view to the connect form.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(200);

/// Guard state derived from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    Authenticated,
}

/// Result of evaluating the guard for one render.
#[derive(Debug)]
pub enum GuardDecision {
    /// Render protected content. `generation` identifies the session the
    /// content belongs to.
    Permit { generation: u64 },

    /// Render the disconnected placeholder; a redirect is scheduled.
    Redirect(RedirectHandle),
}

impl GuardDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, GuardDecision::Permit { .. })
    }
}

/// A scheduled redirect to the connect view.
///
/// Dropping the handle cancels the redirect.
#[derive(Debug)]
pub struct RedirectHandle {
    task: JoinHandle<()>,
}

impl RedirectHandle {
    /// Wait for the redirect to fire.
    pub async fn fired(mut self) -> bool {
        (&mut self.task).await.is_ok()
    }
}

impl Drop for RedirectHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Decides whether a protected view may render.
pub struct AccessGuard {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
}

impl AccessGuard {
    /// Create a guard with the default redirect delay.
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_redirect_delay(session, navigator, DEFAULT_REDIRECT_DELAY)
    }

    /// Create a guard with a custom redirect delay.
    pub fn with_redirect_delay(
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            session,
            navigator,
            redirect_delay,
        }
    }

    pub fn redirect_delay(&self) -> Duration {
        self.redirect_delay
    }

    /// Current state, without side effects.
    pub fn state(&self) -> GuardState {
        if self.session.is_authenticated() {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        }
    }

    /// Evaluate the guard for one render.
    ///
    /// Every unauthenticated evaluation schedules exactly one deferred
    /// redirect. Must be called from within a Tokio runtime.
    pub fn evaluate(&self) -> GuardDecision {
        let snapshot = self.session.snapshot();
        if snapshot.is_authenticated() {
            return GuardDecision::Permit {
                generation: snapshot.generation,
            };
        }

        debug!(
            delay_ms = self.redirect_delay.as_millis() as u64,
            "Not authenticated, scheduling redirect"
        );
        let navigator = self.navigator.clone();
        let delay = self.redirect_delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(Navigation::Connect);
        });
        GuardDecision::Redirect(RedirectHandle { task })
    }
}
