//! Domain model types for the admin console.
//!
//! This module defines the server-owned resources mirrored by the console:
//! - [`Identity`] - The signed-in admin and its display label
//! - [`Leaderboard`] - A named score collection owned by the admin
//! - [`LeaderboardId`] - Opaque server-generated leaderboard identifier
//! - [`Score`] - One entry of a leaderboard's public score listing
//!
//! Wire payloads of the exchange and identity endpoints are also defined here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::credential::Credential;

/// Opaque identifier of a leaderboard, assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaderboardId(String);

impl LeaderboardId {
    /// Create a new leaderboard ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the leaderboard ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaderboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LeaderboardId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LeaderboardId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A leaderboard as reported by the server.
///
/// `access_key` is only present in the response to a create request; the
/// list endpoint never returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    /// Server-generated identifier.
    pub id: LeaderboardId,

    /// User-supplied display name.
    pub name: String,

    /// Secret key for submitting scores, visible exactly once.
    #[serde(default, alias = "key", skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Number of scores recorded on the server.
    #[serde(default, alias = "scores")]
    pub score_count: u64,
}

/// The signed-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Admin account identifier.
    pub id: String,

    /// Third-party login, when the account is linked to the OAuth provider.
    pub display_name: Option<String>,
}

impl Identity {
    /// Label shown for the session owner.
    ///
    /// Falls back to the raw identifier when no provider login is linked.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

impl From<WhoAmI> for Identity {
    fn from(who: WhoAmI) -> Self {
        Self {
            id: who.admin.id,
            display_name: who.github.map(|g| g.login),
        }
    }
}

/// Response of `GET /api/v1/admin/whoami`.
#[derive(Debug, Clone, Deserialize)]
pub struct WhoAmI {
    pub admin: AdminAccount,
    #[serde(default)]
    pub github: Option<GithubLogin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminAccount {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubLogin {
    pub login: String,
}

/// Response of both credential exchange endpoints.
#[derive(Debug, Deserialize)]
pub struct TokenReply {
    pub token: Credential,
}

/// Body of `POST /oauth/by_uuid`.
#[derive(Debug, Serialize)]
pub struct IdentifierExchange<'a> {
    pub uuid: &'a str,
}

/// Response of `GET /api/config/oauth`.
#[derive(Debug, Default, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub github_app_id: Option<String>,
}

/// Body of `POST /api/v1/leaderboards`.
#[derive(Debug, Serialize)]
pub struct NewLeaderboard<'a> {
    pub name: &'a str,
}

/// One entry of a leaderboard's score listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub score: f64,
    #[serde(default)]
    pub meta: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub player: String,
}
