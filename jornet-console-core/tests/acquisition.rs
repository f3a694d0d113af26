//! Integration tests for credential acquisition.
//!
//! These tests verify that the console correctly:
//! - Blocks malformed identifiers before any request
//! - Exchanges identifiers (given or generated) for a credential
//! - Exchanges OAuth callback codes for a credential
//! - Leaves the session untouched on exchange failures

use std::sync::Arc;
use std::time::Duration;

use jornet_console_core::{
    auth::{ConnectForm, ConnectView, OAuthOption, EXCHANGE_FAILED_MESSAGE},
    provider::ProviderConfig,
    AuthError, Console, ConsoleError, DashboardView, HttpTransport, Navigation, Navigator,
};
use parking_lot::Mutex;
use url::Url;
use uuid::Uuid;
use wiremock::{
    matchers::{any, body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

#[derive(Default)]
struct RecordingNavigator {
    visits: Mutex<Vec<Navigation>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: Navigation) {
        self.visits.lock().push(target);
    }
}

/// Helper to set up a console against a mock server.
fn setup_console(server: &MockServer) -> (Console, Arc<RecordingNavigator>) {
    let transport = HttpTransport::new(Url::parse(&server.uri()).unwrap());
    let navigator = Arc::new(RecordingNavigator::default());
    let console = Console::new(
        Arc::new(transport),
        navigator.clone(),
        ProviderConfig::github(),
        Duration::from_millis(200),
    );
    (console, navigator)
}

#[tokio::test]
async fn test_malformed_identifier_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    let mut form = ConnectForm::mount(None);
    form.set_identifier("not-a-uuid");
    assert!(!form.can_submit());

    let result = form.submit(console.auth()).await;
    assert!(matches!(result, Err(AuthError::Validation { .. })));
    assert_eq!(form.identifier(), "not-a-uuid");

    let result = console.acquire_by_identifier("not-a-uuid").await;
    assert!(matches!(
        result,
        Err(ConsoleError::Auth(AuthError::Validation { .. }))
    ));

    assert!(console.credential().is_none());
    assert!(navigator.visits.lock().is_empty());
}

#[tokio::test]
async fn test_padded_identifiers_send_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    for input in ["   ", " 67e55044-10b1-426f-9247-bb680e5fe0c8 "] {
        let mut form = ConnectForm::mount(None);
        form.set_identifier(input);
        assert!(!form.can_submit());

        let result = form.submit(console.auth()).await;
        assert!(
            matches!(result, Err(AuthError::Validation { .. })),
            "{input:?} should be rejected"
        );
        assert_eq!(form.identifier(), input);
    }

    assert!(mock_server.received_requests().await.unwrap().is_empty());
    assert!(console.credential().is_none());
    assert!(navigator.visits.lock().is_empty());
}

#[tokio::test]
async fn test_identifier_exchange_stores_credential() {
    let mock_server = MockServer::start().await;
    let identifier = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    Mock::given(method("POST"))
        .and(path("/oauth/by_uuid"))
        .and(body_json(serde_json::json!({ "uuid": identifier })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "t-existing"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    let connected = console.acquire_by_identifier(identifier).await.unwrap();
    assert!(!connected.new_account);
    assert_eq!(connected.identifier.to_string(), identifier);

    assert_eq!(console.credential().unwrap(), "t-existing");
    assert_eq!(
        *navigator.visits.lock(),
        vec![Navigation::Dashboard { new_account: None }]
    );
}

#[tokio::test]
async fn test_empty_identifier_creates_new_account() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/by_uuid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "t-new"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    let mut form = ConnectForm::mount(None);
    assert!(form.can_submit());
    let connected = form.submit(console.auth()).await.unwrap();
    assert!(connected.new_account);

    // The generated identifier is the one that went over the wire
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let sent = Uuid::parse_str(body["uuid"].as_str().unwrap()).unwrap();
    assert_eq!(sent, connected.identifier);

    assert_eq!(console.credential().unwrap(), "t-new");
    assert_eq!(
        *navigator.visits.lock(),
        vec![Navigation::Dashboard {
            new_account: Some(sent)
        }]
    );
}

#[tokio::test]
async fn test_new_account_notice_shows_generated_identifier() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/by_uuid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "t-new"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/whoami"))
        .and(header("Authorization", "Bearer t-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "admin": { "id": "a-1" }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/leaderboards"))
        .and(header("Authorization", "Bearer t-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    let mut form = ConnectForm::mount(None);
    form.submit(console.auth()).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let sent = Uuid::parse_str(body["uuid"].as_str().unwrap()).unwrap();

    // Follow the navigation the exchange asked for
    let target = navigator.visits.lock()[0].clone();
    let Navigation::Dashboard { new_account } = target else {
        panic!("expected a dashboard navigation, got {target:?}");
    };
    let mut dashboard = console.mount_dashboard(new_account);
    console.load_dashboard(&dashboard).await.unwrap();

    match console.render_dashboard(&mut dashboard) {
        DashboardView::Ready {
            new_account,
            identity,
            ..
        } => {
            assert_eq!(new_account, Some(sent));
            assert_eq!(identity.label(), "a-1");
        }
        other => panic!("expected a ready dashboard, got {other:?}"),
    }
    assert_eq!(dashboard.scheduled_redirects(), 0);
}

#[tokio::test]
async fn test_identifier_exchange_failure_is_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/by_uuid"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    let mut form = ConnectForm::mount(None);
    form.set_identifier("67e55044-10b1-426f-9247-bb680e5fe0c8");
    let result = form.submit(console.auth()).await;

    assert!(matches!(result, Err(AuthError::Exchange { .. })));
    assert_eq!(form.identifier(), "");
    assert_eq!(form.error(), Some(EXCHANGE_FAILED_MESSAGE));
    assert!(console.credential().is_none());
    assert!(navigator.visits.lock().is_empty());
}

#[tokio::test]
async fn test_oauth_callback_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/callback"))
        .and(query_param("code", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "t1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    let location = Url::parse("http://console.local/connect?code=abc123").unwrap();
    let mut form = console.connect_form(Some(&location));
    assert_eq!(form.view(), ConnectView::Exchanging);

    let result = form.complete_oauth_exchange(console.auth()).await;
    assert!(matches!(result, Some(Ok(()))));
    assert!(!form.is_exchanging());

    assert_eq!(console.credential().unwrap(), "t1");
    assert_eq!(
        *navigator.visits.lock(),
        vec![Navigation::Dashboard { new_account: None }]
    );
}

#[tokio::test]
async fn test_oauth_callback_failure_shows_form_again() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/callback"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let (console, navigator) = setup_console(&mock_server);

    let location = Url::parse("http://console.local/connect?code=bad").unwrap();
    let mut form = ConnectForm::mount(Some(&location));
    let result = form.complete_oauth_exchange(console.auth()).await;

    assert!(matches!(result, Some(Err(AuthError::Exchange { .. }))));
    match form.view() {
        ConnectView::Form { error, .. } => {
            assert_eq!(error.as_deref(), Some(EXCHANGE_FAILED_MESSAGE));
        }
        ConnectView::Exchanging => panic!("form should be shown again"),
    }
    assert!(console.credential().is_none());
    assert!(navigator.visits.lock().is_empty());

    // Nothing left to exchange
    assert!(form.complete_oauth_exchange(console.auth()).await.is_none());
}

#[tokio::test]
async fn test_oauth_option_enabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/config/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "github_app_id": "Iv1.abc"
        })))
        .mount(&mock_server)
        .await;

    let (console, _navigator) = setup_console(&mock_server);

    let mut form = ConnectForm::mount(None);
    form.load_oauth(console.auth()).await;

    match form.oauth() {
        OAuthOption::Enabled {
            provider,
            authorize_url,
        } => {
            assert_eq!(provider, "GitHub");
            assert_eq!(
                authorize_url.as_str(),
                "https://github.com/login/oauth/authorize?client_id=Iv1.abc"
            );
        }
        OAuthOption::Disabled => panic!("expected OAuth to be enabled"),
    }
}

#[tokio::test]
async fn test_oauth_option_disabled_when_not_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/config/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let (console, _navigator) = setup_console(&mock_server);
    assert_eq!(console.auth().oauth_option().await, OAuthOption::Disabled);
}

#[tokio::test]
async fn test_oauth_option_disabled_when_config_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/config/oauth"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (console, _navigator) = setup_console(&mock_server);
    assert_eq!(console.auth().oauth_option().await, OAuthOption::Disabled);
}

#[tokio::test]
async fn test_credential_is_sent_as_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/callback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "t-oauth"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/leaderboards"))
        .and(header("Authorization", "Bearer t-oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (console, _navigator) = setup_console(&mock_server);

    console.acquire_by_oauth_code("code-1").await.unwrap();
    let leaderboards = console.sync().load_leaderboards().await.unwrap();
    assert!(leaderboards.is_empty());
    assert!(console.credential().is_some());
}
