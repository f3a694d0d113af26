//! Credential acquisition.
//!
//! Two independent protocols feed the same [`SessionStore`]:
//!
//! 1. **Direct identifier exchange**: a canonical UUID (or a freshly generated
//!    one when the field is left empty) is posted to `/oauth/by_uuid`.
//! 2. **OAuth callback exchange**: the provider redirects back with a `code`
//!    query parameter, which is exchanged via `GET /oauth/callback`.
//!
//! Both store the returned [`Credential`](crate::credential::Credential) and
//! ask the [`Navigator`] for the dashboard. A failed exchange leaves the
//! session untouched and is reported as a retryable [`AuthError::Exchange`].
//!
//! [`ConnectForm`] holds the state of the acquisition view: the identifier
//! input, the OAuth link availability, the pending callback exchange and the
//! last error.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{AuthError, TransportError};
use crate::model::{IdentifierExchange, OAuthConfig, TokenReply};
use crate::provider::ProviderConfig;
use crate::router::{Navigation, Navigator};
use crate::session::SessionStore;
use crate::transport::{fetch_json, ApiRequest, Transport};

pub const OAUTH_CONFIG_PATH: &str = "/api/config/oauth";
pub const BY_UUID_PATH: &str = "/oauth/by_uuid";
pub const OAUTH_CALLBACK_PATH: &str = "/oauth/callback";

/// Message shown on the form after a failed exchange.
pub const EXCHANGE_FAILED_MESSAGE: &str = "Could not connect, please try again.";

/// Validate an account identifier against the canonical UUID grammar.
///
/// Only the hyphenated `8-4-4-4-12` form is accepted, in either case.
pub fn validate_identifier(input: &str) -> Result<Uuid, AuthError> {
    let invalid = || AuthError::Validation {
        input: input.to_string(),
    };
    // The only 36 character form the parser accepts is the hyphenated one.
    if input.len() != 36 {
        return Err(invalid());
    }
    Uuid::try_parse(input).map_err(|_| invalid())
}

/// Whether the acquisition form may be submitted with this input.
///
/// An empty input is allowed: it creates a new account.
pub fn can_submit(input: &str) -> bool {
    input.is_empty() || validate_identifier(input).is_ok()
}

/// Read the OAuth `code` parameter from a navigation URL.
pub fn callback_code(location: &Url) -> Option<String> {
    location
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

/// Availability of the OAuth connect option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthOption {
    /// The server has no OAuth application configured, or its configuration
    /// could not be loaded. Rendered as a disabled option.
    Disabled,

    /// The provider's authorize link.
    Enabled {
        provider: String,
        authorize_url: Url,
    },
}

/// Outcome of a successful identifier exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    /// The identifier that was exchanged.
    pub identifier: Uuid,

    /// Whether the identifier was generated locally for a new account.
    pub new_account: bool,
}

/// Runs the acquisition protocols against the server.
pub struct AuthAcquisition {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
    provider: ProviderConfig,
}

impl AuthAcquisition {
    pub fn new(
        session: Arc<SessionStore>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            session,
            transport,
            navigator,
            provider,
        }
    }

    /// Fetch the OAuth client identifier and build the connect option.
    pub async fn oauth_option(&self) -> OAuthOption {
        let config: OAuthConfig =
            match fetch_json(self.transport.as_ref(), ApiRequest::get(OAUTH_CONFIG_PATH)).await {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to load OAuth configuration ({}), disabling OAuth", e);
                    return OAuthOption::Disabled;
                }
            };

        let Some(client_id) = config.github_app_id.filter(|id| !id.is_empty()) else {
            debug!("No OAuth application configured");
            return OAuthOption::Disabled;
        };

        match self.provider.authorize_url(&client_id) {
            Ok(authorize_url) => OAuthOption::Enabled {
                provider: self.provider.name.clone(),
                authorize_url,
            },
            Err(e) => {
                warn!("Invalid authorize URL for {} ({}), disabling OAuth", self.provider.id, e);
                OAuthOption::Disabled
            }
        }
    }

    /// Exchange an account identifier for a credential.
    ///
    /// An empty `input` generates a new identifier, which is tagged as a new
    /// account in the dashboard navigation. Malformed input is rejected with
    /// [`AuthError::Validation`] before any request is issued.
    pub async fn acquire_by_identifier(&self, input: &str) -> Result<Connected, AuthError> {
        let (identifier, new_account) = if input.is_empty() {
            (Uuid::new_v4(), true)
        } else {
            (validate_identifier(input)?, false)
        };

        let uuid = identifier.hyphenated().to_string();
        let request = ApiRequest::post(BY_UUID_PATH)
            .with_json(&IdentifierExchange { uuid: &uuid })
            .map_err(AuthError::exchange)?;
        let reply = self.exchange(request).await?;

        info!(new_account, "Connected with account identifier");
        self.session.set_credential(Some(reply.token));
        self.navigator.navigate(Navigation::Dashboard {
            new_account: new_account.then_some(identifier),
        });

        Ok(Connected {
            identifier,
            new_account,
        })
    }

    /// Exchange an OAuth authorization code for a credential.
    pub async fn acquire_by_oauth_code(&self, code: &str) -> Result<(), AuthError> {
        if code.is_empty() {
            return Err(AuthError::Exchange {
                message: "missing authorization code".to_string(),
            });
        }

        let request = ApiRequest::get(OAUTH_CALLBACK_PATH).with_query("code", code);
        let reply = self.exchange(request).await?;

        info!(provider = %self.provider.id, "Connected through OAuth");
        self.session.set_credential(Some(reply.token));
        self.navigator
            .navigate(Navigation::Dashboard { new_account: None });
        Ok(())
    }

    async fn exchange(&self, request: ApiRequest) -> Result<TokenReply, AuthError> {
        let path = request.path.clone();
        fetch_json(self.transport.as_ref(), request)
            .await
            .map_err(|e: TransportError| {
                warn!(path = %path, "Credential exchange failed: {}", e);
                AuthError::exchange(e)
            })
    }
}

/// What the acquisition view should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectView {
    /// An OAuth code is being exchanged; the form is suppressed.
    Exchanging,

    /// The connect form.
    Form {
        identifier: String,
        can_submit: bool,
        oauth: OAuthOption,
        error: Option<String>,
    },
}

/// State of the acquisition view.
#[derive(Debug, Clone)]
pub struct ConnectForm {
    identifier: String,
    oauth: OAuthOption,
    pending_code: Option<String>,
    error: Option<String>,
}

impl ConnectForm {
    /// Mount the form for the current navigation.
    ///
    /// The callback `code` must be captured here, synchronously, before any
    /// later navigation replaces the callback URL.
    pub fn mount(location: Option<&Url>) -> Self {
        let pending_code = location.and_then(callback_code);
        if pending_code.is_some() {
            debug!("Mounted from an OAuth callback, exchange pending");
        }
        Self {
            identifier: String::new(),
            oauth: OAuthOption::Disabled,
            pending_code,
            error: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier(&mut self, value: impl Into<String>) {
        self.identifier = value.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.is_exchanging() && can_submit(&self.identifier)
    }

    /// Whether an OAuth code exchange is pending.
    pub fn is_exchanging(&self) -> bool {
        self.pending_code.is_some()
    }

    pub fn oauth(&self) -> &OAuthOption {
        &self.oauth
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view(&self) -> ConnectView {
        if self.is_exchanging() {
            return ConnectView::Exchanging;
        }
        ConnectView::Form {
            identifier: self.identifier.clone(),
            can_submit: self.can_submit(),
            oauth: self.oauth.clone(),
            error: self.error.clone(),
        }
    }

    /// Load the OAuth option from the server.
    pub async fn load_oauth(&mut self, auth: &AuthAcquisition) {
        self.oauth = auth.oauth_option().await;
    }

    /// Run the pending OAuth exchange, if any.
    ///
    /// On failure the pending state is left so the form is shown again with a
    /// retryable error. Returns `None` when nothing was pending.
    pub async fn complete_oauth_exchange(
        &mut self,
        auth: &AuthAcquisition,
    ) -> Option<Result<(), AuthError>> {
        let code = self.pending_code.take()?;
        let result = auth.acquire_by_oauth_code(&code).await;
        match &result {
            Ok(()) => self.error = None,
            Err(_) => self.error = Some(EXCHANGE_FAILED_MESSAGE.to_string()),
        }
        Some(result)
    }

    /// Submit the identifier input.
    ///
    /// A failed exchange clears the input and records a retryable error.
    pub async fn submit(&mut self, auth: &AuthAcquisition) -> Result<Connected, AuthError> {
        if self.is_exchanging() {
            return Err(AuthError::Exchange {
                message: "an OAuth exchange is in progress".to_string(),
            });
        }
        // Validation errors block submission without touching the input.
        let input = self.identifier.clone();
        if !can_submit(&input) {
            return Err(AuthError::Validation { input });
        }

        match auth.acquire_by_identifier(&input).await {
            Ok(connected) => {
                self.error = None;
                Ok(connected)
            }
            Err(e) => {
                self.identifier.clear();
                self.error = Some(EXCHANGE_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }
}
