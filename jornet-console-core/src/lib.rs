//! # Jornet Console Core
//!
//! Session and data-synchronization layer of the Jornet leaderboard admin
//! console.
//!
//! This crate provides:
//! - A [`SessionStore`] holding the bearer credential and identity label
//! - Credential acquisition by account identifier or OAuth callback code
//! - An [`AccessGuard`] gating protected views with a deferred redirect
//! - [`ResourceSync`] mirroring identity and leaderboards, invalidating the
//!   session on any failed authenticated request
//! - The [`Console`] facade tying them together for a presentation layer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jornet_console_core::{Console, ConsoleConfig};
//!
//! let console = Console::from_config(&ConsoleConfig::default(), navigator)?;
//! console.acquire_by_identifier("67e55044-10b1-426f-9247-bb680e5fe0c8").await?;
//! console.create_leaderboard("Jam2024").await?;
//! ```

pub mod auth;
pub mod config;
pub mod console;
pub mod credential;
pub mod error;
pub mod guard;
pub mod model;
pub mod provider;
pub mod router;
pub mod scores;
pub mod session;
pub mod sync;
pub mod transport;

// Re-export commonly used types at crate root
pub use model::{
    Identity,
    Leaderboard,
    LeaderboardId,
    Score,
};

pub use credential::Credential;

pub use session::{
    SessionState,
    SessionStore,
};

pub use auth::{
    AuthAcquisition,
    ConnectForm,
    ConnectView,
    Connected,
    OAuthOption,
};

pub use guard::{
    AccessGuard,
    GuardDecision,
    GuardState,
    RedirectHandle,
};

pub use sync::ResourceSync;

pub use router::{
    Navigation,
    Navigator,
};

pub use transport::{
    ApiRequest,
    ApiResponse,
    HttpTransport,
    Transport,
};

pub use console::{
    Console,
    Dashboard,
    DashboardView,
};

pub use config::{
    ConsoleConfig,
    load_config,
};

pub use error::{
    AuthError,
    ConfigError,
    ConsoleError,
    ScoresError,
    SyncError,
    TransportError,
};
