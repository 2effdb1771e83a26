//! portico - view-engine and OAuth adaptors for axum applications
//!
//! This library plugs two concerns into an axum application's extension
//! points:
//! - **OAuth login**: a configurable pair of routes that begin and
//!   complete the OAuth/OAuth2 handshake against any of the built-in
//!   providers (GitHub, Google, GitLab, ...) or custom endpoint sets,
//!   with success/fail handler chains and cookie-backed handshake state.
//! - **Views**: a minijinja template engine with directory loading,
//!   embedded templates, filters, globals, and reverse URL generation
//!   shared with the OAuth routes.
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::Router;
//! use portico::{Oauth, OauthConfig, ViewEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     portico::init_logging();
//!
//!     let config = OauthConfig::from_env()
//!         .with_provider("github", "YOUR_GITHUB_KEY", "YOUR_GITHUB_SECRET");
//!     let auth = Oauth::new(config)?;
//!     auth.success(|user| async move {
//!         tracing::info!("{} logged in via {}", user.user_id, user.provider);
//!         None
//!     });
//!
//!     let views = ViewEngine::new("templates", ".html").with_routes(auth.route_map());
//!     views.load()?;
//!
//!     let app = Router::new().merge(auth.adapt("http://localhost:8080")?);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod constants;
pub mod error;

// Configuration and providers
pub mod config;
pub mod provider;

// Infrastructure
pub mod routes;
pub mod session;

// Adaptors
pub mod oauth;
pub mod view;

// Re-exports for convenience
pub use config::{OauthConfig, ProviderCredentials, ProviderEndpoints};
pub use error::{PorticoError, Result, TemplateError};
pub use oauth::Oauth;
pub use provider::{AuthSession, AuthUser, Provider, ProviderRegistry, UserMapping};
pub use routes::RouteMap;
pub use session::{Session, SessionStore};
pub use view::ViewEngine;

/// Initialize logging for the application
pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "portico=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
