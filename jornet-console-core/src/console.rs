//! The console facade.
//!
//! [`Console`] wires the session store, the acquisition protocols, the access
//! guard and resource sync together and exposes the interface consumed by
//! the presentation layer: the current credential, identity label and
//! leaderboards, plus the acquire / create / reset / logout actions.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jornet_console_core::{Console, ConsoleConfig, Navigation};
//!
//! # async fn example() -> Result<(), jornet_console_core::ConsoleError> {
//! let navigator = Arc::new(|target: Navigation| println!("navigate to {}", target.path()));
//! let console = Console::from_config(&ConsoleConfig::default(), navigator)?;
//!
//! console.acquire_by_identifier("").await?;
//! let mut dashboard = console.mount_dashboard(None);
//! console.load_dashboard(&dashboard).await?;
//! println!("{:?}", console.render_dashboard(&mut dashboard));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AuthAcquisition, Connected, ConnectForm};
use crate::config::ConsoleConfig;
use crate::credential::Credential;
use crate::error::{ConsoleError, SyncError};
use crate::guard::{AccessGuard, GuardDecision, GuardState, RedirectHandle};
use crate::model::{Identity, Leaderboard, LeaderboardId, Score};
use crate::provider::ProviderConfig;
use crate::router::Navigator;
use crate::scores::fetch_scores;
use crate::session::SessionStore;
use crate::sync::ResourceSync;
use crate::transport::{HttpTransport, Transport};

/// A mounted dashboard view.
///
/// Dropping it unmounts the view and cancels any pending redirect.
#[derive(Debug)]
pub struct Dashboard {
    new_account: Option<Uuid>,
    generation: Option<u64>,
    redirects: Vec<RedirectHandle>,
}

impl Dashboard {
    /// Identifier to surface once for a freshly created account.
    pub fn new_account(&self) -> Option<Uuid> {
        self.new_account
    }

    /// Number of redirects scheduled by this view's renders.
    pub fn scheduled_redirects(&self) -> usize {
        self.redirects.len()
    }
}

/// What the dashboard should render.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// No credential; a redirect to the connect form is pending.
    Disconnected,

    /// Authenticated, identity not known yet.
    Loading,

    Ready {
        identity: Identity,
        new_account: Option<Uuid>,
        leaderboards: Vec<Leaderboard>,
        new_leaderboard_name: String,
        can_create: bool,
        /// The last created leaderboard with its one-time access key.
        created: Option<Leaderboard>,
    },
}

/// Session and data-synchronization core of the admin console.
pub struct Console {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    auth: AuthAcquisition,
    guard: AccessGuard,
    sync: ResourceSync,
}

impl Console {
    pub fn new(
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
        provider: ProviderConfig,
        redirect_delay: Duration,
    ) -> Self {
        let session = Arc::new(SessionStore::new());
        let auth = AuthAcquisition::new(
            session.clone(),
            transport.clone(),
            navigator.clone(),
            provider,
        );
        let guard = AccessGuard::with_redirect_delay(session.clone(), navigator, redirect_delay);
        let sync = ResourceSync::new(session.clone(), transport.clone());
        Self {
            session,
            transport,
            auth,
            guard,
            sync,
        }
    }

    /// Build a console talking HTTP to the configured server.
    pub fn from_config(
        config: &ConsoleConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ConsoleError> {
        let transport = HttpTransport::with_user_agent(config.base_url()?, &config.user_agent)?;
        info!(base_url = %transport.base_url(), "Console configured");
        Ok(Self::new(
            Arc::new(transport),
            navigator,
            config.provider()?,
            config.redirect_delay(),
        ))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn auth(&self) -> &AuthAcquisition {
        &self.auth
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    pub fn sync(&self) -> &ResourceSync {
        &self.sync
    }

    pub fn credential(&self) -> Option<Credential> {
        self.session.credential()
    }

    pub fn identity_label(&self) -> Option<String> {
        self.session.identity_label()
    }

    pub fn leaderboards(&self) -> Vec<Leaderboard> {
        self.sync.leaderboards()
    }

    /// Mount the connect form for the current navigation.
    pub fn connect_form(&self, location: Option<&url::Url>) -> ConnectForm {
        ConnectForm::mount(location)
    }

    pub async fn acquire_by_identifier(&self, identifier: &str) -> Result<Connected, ConsoleError> {
        Ok(self.auth.acquire_by_identifier(identifier).await?)
    }

    pub async fn acquire_by_oauth_code(&self, code: &str) -> Result<(), ConsoleError> {
        Ok(self.auth.acquire_by_oauth_code(code).await?)
    }

    pub async fn create_leaderboard(&self, name: &str) -> Result<Leaderboard, ConsoleError> {
        Ok(self.sync.create_leaderboard(name).await?)
    }

    pub async fn reset_leaderboard(&self, id: &LeaderboardId) -> Result<(), ConsoleError> {
        Ok(self.sync.reset_leaderboard(id).await?)
    }

    pub async fn leaderboard_scores(&self, id: &LeaderboardId) -> Result<Vec<Score>, ConsoleError> {
        Ok(fetch_scores(self.transport.as_ref(), id).await?)
    }

    /// End the session and forget mirrored resources.
    pub fn logout(&self) {
        info!("Logging out");
        self.session.clear();
        self.sync.reset_state();
    }

    /// Mount the dashboard for the current session.
    ///
    /// Mounting schedules nothing; redirects are only scheduled by
    /// [`render_dashboard`](Console::render_dashboard).
    pub fn mount_dashboard(&self, new_account: Option<Uuid>) -> Dashboard {
        let snapshot = self.session.snapshot();
        let generation = snapshot.is_authenticated().then_some(snapshot.generation);
        if generation.is_some() {
            self.sync.reset_state();
        }
        Dashboard {
            new_account,
            generation,
            redirects: Vec::new(),
        }
    }

    /// Fetch the dashboard resources.
    ///
    /// Does nothing for a dashboard mounted while unauthenticated; fails with
    /// [`SyncError::Superseded`] if the session it was mounted for is gone.
    pub async fn load_dashboard(&self, dashboard: &Dashboard) -> Result<(), ConsoleError> {
        let Some(generation) = dashboard.generation else {
            debug!("Dashboard mounted without a session, nothing to load");
            return Ok(());
        };
        if !self.session.is_current(generation) {
            return Err(SyncError::Superseded.into());
        }
        Ok(self.sync.refresh().await?)
    }

    /// Evaluate the guard and build the dashboard view.
    pub fn render_dashboard(&self, dashboard: &mut Dashboard) -> DashboardView {
        match self.guard.evaluate() {
            GuardDecision::Redirect(handle) => {
                dashboard.redirects.push(handle);
                DashboardView::Disconnected
            }
            GuardDecision::Permit { .. } => match self.sync.identity() {
                None => DashboardView::Loading,
                Some(identity) => DashboardView::Ready {
                    identity,
                    new_account: dashboard.new_account,
                    leaderboards: self.sync.leaderboards(),
                    new_leaderboard_name: self.sync.new_leaderboard_name(),
                    can_create: self.sync.can_create(),
                    created: self.sync.created_notice(),
                },
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.guard.state() == GuardState::Authenticated
    }
}
