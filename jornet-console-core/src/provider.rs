//! OAuth provider configuration.
//!
//! The console never talks to the provider itself. It only needs the
//! provider's authorize endpoint to build the "connect using ..." link; the
//! server performs the code exchange behind `/oauth/callback`.

use serde::{Deserialize, Serialize};
use url::Url;

/// Default GitHub authorize endpoint.
pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// Configuration for an OAuth provider.
///
/// # Example
///
/// ```
/// use jornet_console_core::provider::ProviderConfig;
///
/// let github = ProviderConfig::github();
/// let link = github.authorize_url("Iv1.abc").unwrap();
/// assert_eq!(
///     link.as_str(),
///     "https://github.com/login/oauth/authorize?client_id=Iv1.abc"
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Unique identifier for the provider (e.g., "github").
    pub id: String,

    /// Human-readable name (e.g., "GitHub").
    pub name: String,

    /// OAuth authorization endpoint URL.
    pub auth_url: String,
}

impl ProviderConfig {
    /// Create a new provider configuration.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            auth_url: String::new(),
        }
    }

    /// Set the authorization URL.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// GitHub with its public authorize endpoint.
    pub fn github() -> Self {
        Self::new("github", "GitHub").with_auth_url(GITHUB_AUTHORIZE_URL)
    }

    /// Build the authorize link for the given OAuth client identifier.
    pub fn authorize_url(&self, client_id: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.auth_url)?;
        url.query_pairs_mut().append_pair("client_id", client_id);
        Ok(url)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::github()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_defaults() {
        let github = ProviderConfig::github();
        assert_eq!(github.id, "github");
        assert_eq!(github.name, "GitHub");
        assert_eq!(github.auth_url, GITHUB_AUTHORIZE_URL);
    }

    #[test]
    fn test_authorize_url_escapes_client_id() {
        let provider =
            ProviderConfig::new("test", "Test").with_auth_url("https://example.com/auth");
        let url = provider.authorize_url("a b").unwrap();
        assert_eq!(url.as_str(), "https://example.com/auth?client_id=a+b");
    }

    #[test]
    fn test_authorize_url_invalid_base() {
        let provider = ProviderConfig::new("test", "Test").with_auth_url("not a url");
        assert!(provider.authorize_url("id").is_err());
    }
}
