//! Resource synchronization for the authenticated dashboard.
//!
//! [`ResourceSync`] mirrors the server-owned resources of the session owner:
//! the [`Identity`] and the ordered leaderboard collection.
//!
//! # Policy
//!
//! - On entering the authenticated state, the identity and the leaderboard
//!   list are fetched concurrently; neither waits for the other and each
//!   applies its own result when it completes.
//! - Any failed authenticated request, whether the network failed or the
//!   server rejected the credential, invalidates the session. Expired or
//!   revoked credentials are the only failure expected once authenticated,
//!   so no distinction is made.
//! - A continuation only applies its effect if the session it was issued
//!   under is still current. Late responses after a logout or a new login are
//!   dropped.
//! - Created leaderboards are appended in acknowledgement order. Resets are
//!   not mirrored locally; a later [`refresh`](ResourceSync::refresh)
//!   observes them.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::credential::Credential;
use crate::error::{SyncError, TransportError};
use crate::model::{Identity, Leaderboard, LeaderboardId, NewLeaderboard, WhoAmI};
use crate::session::SessionStore;
use crate::transport::{fetch_json, fetch_status, ApiRequest, Transport};

pub const WHOAMI_PATH: &str = "/api/v1/admin/whoami";
pub const LEADERBOARDS_PATH: &str = "/api/v1/leaderboards";
pub const SCORES_PATH: &str = "/api/v1/scores";

#[derive(Debug, Default)]
struct SyncState {
    identity: Option<Identity>,
    leaderboards: Vec<Leaderboard>,
    new_leaderboard_name: String,
    created: Option<Leaderboard>,
}

/// Keeps identity and leaderboards in sync with the server.
pub struct ResourceSync {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    state: Mutex<SyncState>,
}

impl ResourceSync {
    pub fn new(session: Arc<SessionStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            session,
            transport,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Identity of the session owner, once fetched.
    pub fn identity(&self) -> Option<Identity> {
        self.state.lock().identity.clone()
    }

    /// Leaderboards in server acknowledgement order.
    pub fn leaderboards(&self) -> Vec<Leaderboard> {
        self.state.lock().leaderboards.clone()
    }

    /// Current content of the new-leaderboard input.
    pub fn new_leaderboard_name(&self) -> String {
        self.state.lock().new_leaderboard_name.clone()
    }

    pub fn set_new_leaderboard_name(&self, name: impl Into<String>) {
        self.state.lock().new_leaderboard_name = name.into();
    }

    /// Whether the create action is available.
    pub fn can_create(&self) -> bool {
        !self.state.lock().new_leaderboard_name.trim().is_empty()
    }

    /// The last created leaderboard, with its access key, taken once.
    pub fn take_created_notice(&self) -> Option<Leaderboard> {
        self.state.lock().created.take()
    }

    /// Peek at the pending "record this key now" notice.
    pub fn created_notice(&self) -> Option<Leaderboard> {
        self.state.lock().created.clone()
    }

    /// Drop everything mirrored from the server.
    pub fn reset_state(&self) {
        *self.state.lock() = SyncState::default();
    }

    fn authenticated(&self) -> Result<(Credential, u64), SyncError> {
        self.session
            .credential_with_generation()
            .ok_or(SyncError::NotAuthenticated)
    }

    /// Apply a failed authenticated request.
    fn fail(&self, generation: u64, operation: &str, err: TransportError) -> SyncError {
        if !self.session.is_current(generation) {
            debug!(operation, "Ignoring failure for a stale session: {}", err);
            return SyncError::Superseded;
        }
        warn!(
            operation,
            unauthorized = err.is_unauthorized(),
            "Authenticated request failed, invalidating session: {}",
            err
        );
        if self.session.invalidate(generation) {
            self.reset_state();
        }
        SyncError::SessionInvalid {
            message: err.to_string(),
        }
    }

    /// Fetch identity and leaderboards concurrently.
    ///
    /// Both fetches are always awaited; the first error is returned.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        let (credential, generation) = self.authenticated()?;
        let (identity, leaderboards) = tokio::join!(
            self.fetch_identity(credential.clone(), generation),
            self.fetch_leaderboards(credential, generation),
        );
        identity.and(leaderboards).map(|_| ())
    }

    /// Fetch the identity of the session owner.
    pub async fn load_identity(&self) -> Result<Identity, SyncError> {
        let (credential, generation) = self.authenticated()?;
        self.fetch_identity(credential, generation).await
    }

    /// Fetch the leaderboard collection, replacing the local one.
    pub async fn load_leaderboards(&self) -> Result<Vec<Leaderboard>, SyncError> {
        let (credential, generation) = self.authenticated()?;
        self.fetch_leaderboards(credential, generation).await
    }

    async fn fetch_identity(
        &self,
        credential: Credential,
        generation: u64,
    ) -> Result<Identity, SyncError> {
        let request = ApiRequest::get(WHOAMI_PATH).with_bearer(credential);
        let who: WhoAmI = fetch_json(self.transport.as_ref(), request)
            .await
            .map_err(|e| self.fail(generation, "whoami", e))?;
        let identity = Identity::from(who);

        if !self.session.is_current(generation) {
            return Err(SyncError::Superseded);
        }
        self.session.set_identity(Some(identity.label().to_string()));
        self.state.lock().identity = Some(identity.clone());
        debug!(identity = %identity.label(), "Identity loaded");
        Ok(identity)
    }

    async fn fetch_leaderboards(
        &self,
        credential: Credential,
        generation: u64,
    ) -> Result<Vec<Leaderboard>, SyncError> {
        let request = ApiRequest::get(LEADERBOARDS_PATH).with_bearer(credential);
        let leaderboards: Vec<Leaderboard> = fetch_json(self.transport.as_ref(), request)
            .await
            .map_err(|e| self.fail(generation, "list leaderboards", e))?;

        if !self.session.is_current(generation) {
            return Err(SyncError::Superseded);
        }
        self.state.lock().leaderboards = leaderboards.clone();
        debug!(count = leaderboards.len(), "Leaderboards loaded");
        Ok(leaderboards)
    }

    /// Create a leaderboard from the new-leaderboard input.
    ///
    /// The input is cleared as soon as the request is issued.
    pub async fn submit_new_leaderboard(&self) -> Result<Leaderboard, SyncError> {
        let name = self.new_leaderboard_name();
        self.create_leaderboard(&name).await
    }

    /// Create a leaderboard named `name`.
    ///
    /// The new-leaderboard input is cleared before the request resolves. On
    /// success the server's leaderboard, including its one-time access key, is
    /// appended to the collection and kept as the created notice.
    pub async fn create_leaderboard(&self, name: &str) -> Result<Leaderboard, SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::EmptyName);
        }
        let (credential, generation) = self.authenticated()?;
        self.state.lock().new_leaderboard_name.clear();

        let request = ApiRequest::post(LEADERBOARDS_PATH)
            .with_bearer(credential)
            .with_json(&NewLeaderboard { name })
            .map_err(|e| self.fail(generation, "create leaderboard", e))?;
        let leaderboard: Leaderboard = fetch_json(self.transport.as_ref(), request)
            .await
            .map_err(|e| self.fail(generation, "create leaderboard", e))?;

        if !self.session.is_current(generation) {
            return Err(SyncError::Superseded);
        }
        info!(id = %leaderboard.id, name = %leaderboard.name, "Leaderboard created");
        let mut state = self.state.lock();
        state.leaderboards.push(leaderboard.clone());
        state.created = Some(leaderboard.clone());
        Ok(leaderboard)
    }

    /// Delete all scores of a leaderboard.
    ///
    /// The local `score_count` is not updated.
    pub async fn reset_leaderboard(&self, id: &LeaderboardId) -> Result<(), SyncError> {
        let (credential, generation) = self.authenticated()?;
        let request = ApiRequest::delete(SCORES_PATH)
            .with_segment(id.as_str())
            .with_bearer(credential);
        fetch_status(self.transport.as_ref(), request)
            .await
            .map_err(|e| self.fail(generation, "reset leaderboard", e))?;

        if !self.session.is_current(generation) {
            return Err(SyncError::Superseded);
        }
        info!(id = %id, "Leaderboard scores reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ApiResponse;
    use async_trait::async_trait;

    /// Transport that fails every request without a response.
    struct Unreachable {
        requests: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            self.requests.lock().push(request);
            Err(TransportError::Network {
                message: "connection refused".to_string(),
            })
        }
    }

    fn setup() -> (Arc<SessionStore>, Arc<Unreachable>, ResourceSync) {
        let session = Arc::new(SessionStore::new());
        let transport = Arc::new(Unreachable {
            requests: Mutex::new(Vec::new()),
        });
        let sync = ResourceSync::new(session.clone(), transport.clone());
        (session, transport, sync)
    }

    #[tokio::test]
    async fn test_requires_credential() {
        let (_session, transport, sync) = setup();

        assert!(matches!(sync.refresh().await, Err(SyncError::NotAuthenticated)));
        assert!(matches!(
            sync.reset_leaderboard(&LeaderboardId::new("L1")).await,
            Err(SyncError::NotAuthenticated)
        ));
        assert!(transport.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_invalidates_session() {
        let (session, _transport, sync) = setup();
        session.set_credential(Some(Credential::new("t1")));

        let result = sync.refresh().await;
        assert!(matches!(result, Err(SyncError::SessionInvalid { .. })));
        assert!(!session.is_authenticated());
        assert!(session.identity_label().is_none());
    }

    #[tokio::test]
    async fn test_reset_sends_identifier_as_one_segment() {
        let (session, transport, sync) = setup();
        session.set_credential(Some(Credential::new("t1")));

        let _ = sync.reset_leaderboard(&LeaderboardId::new("a/b?c")).await;

        let requests = transport.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, SCORES_PATH);
        assert_eq!(requests[0].segments, vec!["a/b?c".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected_without_request() {
        let (session, transport, sync) = setup();
        session.set_credential(Some(Credential::new("t1")));
        sync.set_new_leaderboard_name("   ");

        assert!(!sync.can_create());
        assert!(matches!(
            sync.submit_new_leaderboard().await,
            Err(SyncError::EmptyName)
        ));
        assert!(transport.requests.lock().is_empty());
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_create_clears_input_even_on_failure() {
        let (session, _transport, sync) = setup();
        session.set_credential(Some(Credential::new("t1")));
        sync.set_new_leaderboard_name("Jam2024");

        let result = sync.submit_new_leaderboard().await;
        assert!(matches!(result, Err(SyncError::SessionInvalid { .. })));
        assert_eq!(sync.new_leaderboard_name(), "");
        assert!(sync.leaderboards().is_empty());
    }
}
