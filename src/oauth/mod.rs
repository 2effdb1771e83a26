//! OAuth adaptor for axum applications
//!
//! Wires two routes into the host application: a request path that begins
//! the handshake by redirecting to the chosen provider, and a callback
//! path that completes it. The handshake itself is delegated to the
//! provider layer; the adaptor resolves the provider name, shuttles the
//! auth session blob through the cookie session store, and dispatches the
//! outcome to the registered success or fail handlers.

use crate::config::OauthConfig;
use crate::constants::{DEFAULT_SESSION_TTL_MINUTES, SESSION_VALUE_KEY, STATE_PARAM};
use crate::provider::{AuthSession, AuthUser, ProviderRegistry};
use crate::routes::RouteMap;
use crate::session::{self, SessionStore};
use crate::{PorticoError, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Duration;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Handler invoked with the authenticated user. Handlers run in
/// registration order; the first to return a response ends the chain.
pub type SuccessHandler =
    Arc<dyn Fn(AuthUser) -> BoxFuture<'static, Option<Response>> + Send + Sync>;

/// Handler invoked with the failure when authentication does not complete.
pub type FailHandler = Arc<dyn Fn(PorticoError) -> BoxFuture<'static, Response> + Send + Sync>;

/// OAuth adaptor. Construct with [`Oauth::new`], register handlers, then
/// mount the router from [`Oauth::adapt`] onto the application.
pub struct Oauth {
    config: OauthConfig,
    registry: Arc<ProviderRegistry>,
    session_store: Arc<SessionStore>,
    routes: RouteMap,
    http_client: reqwest::Client,
    success_handlers: RwLock<Vec<SuccessHandler>>,
    fail_handler: RwLock<Option<FailHandler>>,
}

impl Oauth {
    /// Create a new OAuth adaptor from a configuration.
    pub fn new(config: OauthConfig) -> Result<Arc<Self>> {
        // Redirects stay disabled so an authorization code cannot be
        // replayed through a rogue token endpoint redirect.
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| PorticoError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Arc::new(Self {
            config,
            registry: Arc::new(ProviderRegistry::new()),
            session_store: Arc::new(SessionStore::new()),
            routes: RouteMap::new(),
            http_client,
            success_handlers: RwLock::new(Vec::new()),
            fail_handler: RwLock::new(None),
        }))
    }

    /// Register a handler fired when a user logs in successfully.
    ///
    /// Returning `Some(response)` ends the chain; returning `None` passes
    /// control to the next handler. When no handler produces a response
    /// the adaptor answers with the user record as JSON.
    pub fn success<H, Fut>(&self, handler: H)
    where
        H: Fn(AuthUser) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Response>> + Send + 'static,
    {
        self.success_handlers
            .write()
            .push(Arc::new(move |user| Box::pin(handler(user))));
    }

    /// Register the handler fired when authentication fails. Without one,
    /// failures answer 401 with a JSON error body.
    pub fn fail<H, Fut>(&self, handler: H)
    where
        H: Fn(PorticoError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        *self.fail_handler.write() = Some(Arc::new(move |err| Box::pin(handler(err))));
    }

    /// Build the adaptor's routes for mounting onto the application.
    ///
    /// `vhost` is the application's external origin (scheme + host), used
    /// to derive the callback URLs registered with each provider. A
    /// configuration with empty routing fields or no providers disables
    /// the adaptor: a warning is logged and an empty router returned.
    pub fn adapt(self: &Arc<Self>, vhost: &str) -> Result<Router> {
        if !self.config.is_enabled() {
            tracing::warn!(
                "oauth adaptor disabled: request_path, request_path_param or \
                 callback_relative_path is empty, set them and restart the app"
            );
            return Ok(Router::new());
        }

        let providers = self.config.generate_providers(vhost)?;
        if providers.is_empty() {
            tracing::warn!("oauth adaptor disabled: no providers configured");
            return Ok(Router::new());
        }
        self.registry.use_providers(providers);

        if !self.config.route_name.is_empty() {
            self.routes
                .register(&self.config.route_name, &self.config.request_path);
        }

        let callback_path = format!(
            "{}{}",
            self.config.request_path, self.config.callback_relative_path
        );
        tracing::debug!(
            request_path = %self.config.request_path,
            callback_path = %callback_path,
            providers = self.registry.len(),
            "registering oauth routes"
        );

        Ok(Router::new()
            .route(&self.config.request_path, get(begin_auth_handler))
            .route(&callback_path, get(callback_handler))
            .with_state(self.clone()))
    }

    /// The URL that starts authentication against a provider, for links
    /// on login pages. Same as the view engine's `url(route_name, name)`.
    pub fn url(&self, provider: &str) -> String {
        self.routes
            .url(&self.config.route_name, &[provider])
            .unwrap_or_else(|| self.config.fill_request_path(provider))
    }

    /// Registered provider names, sorted, for building index pages.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// The named-route registry, for sharing with a
    /// [`crate::view::ViewEngine`].
    pub fn route_map(&self) -> RouteMap {
        self.routes.clone()
    }

    /// The cookie session store backing the handshake.
    pub fn session_store(&self) -> Arc<SessionStore> {
        self.session_store.clone()
    }

    /// Start the handshake: resolve the provider, begin an auth session,
    /// persist its blob, and hand back the authorization URL plus a
    /// session cookie when a new session was created.
    async fn begin_auth(
        &self,
        headers: &HeaderMap,
        path_params: &HashMap<String, String>,
        query: &HashMap<String, String>,
    ) -> Result<(String, Option<String>)> {
        let provider_name = self.resolve_provider_name(path_params, query)?;
        let provider = self.registry.get(&provider_name)?;

        let state_override = query.get(STATE_PARAM).filter(|s| !s.is_empty()).cloned();
        let auth_session = provider.begin_auth(state_override)?;

        let (session, cookie) = match SessionStore::session_id_from_headers(headers)
            .and_then(|id| self.session_store.get_session(&id))
        {
            Some(existing) => (existing, None),
            None => {
                let ttl = if self.config.session_ttl_minutes > 0 {
                    self.config.session_ttl_minutes
                } else {
                    DEFAULT_SESSION_TTL_MINUTES
                };
                let created = self.session_store.create_session(Duration::minutes(ttl));
                let cookie = session::set_session_cookie(
                    &created.id,
                    created.expires_at,
                    self.config.secure_cookies,
                );
                (created, Some(cookie))
            }
        };

        self.session_store.set_value(
            &session.id,
            SESSION_VALUE_KEY,
            serde_json::Value::String(auth_session.marshal()?),
        );

        Ok((auth_session.auth_url, cookie))
    }

    /// Complete the handshake and fetch the user record. The stored blob
    /// is consumed on success so a callback cannot be replayed.
    async fn complete_auth(
        &self,
        headers: &HeaderMap,
        path_params: &HashMap<String, String>,
        query: &HashMap<String, String>,
    ) -> Result<AuthUser> {
        let provider_name = self.resolve_provider_name(path_params, query)?;
        let provider = self.registry.get(&provider_name)?;

        let session_id = SessionStore::session_id_from_headers(headers)
            .ok_or_else(no_matching_session)?;
        let session = self
            .session_store
            .get_session(&session_id)
            .ok_or_else(no_matching_session)?;
        let blob = session
            .data
            .get(SESSION_VALUE_KEY)
            .and_then(|v| v.as_str())
            .ok_or_else(no_matching_session)?;

        let mut auth_session = AuthSession::unmarshal(blob)?;
        if auth_session.provider != provider.name {
            return Err(PorticoError::auth(
                "session was begun for a different provider",
            ));
        }

        provider
            .authorize(&mut auth_session, query, &self.http_client)
            .await?;
        let user = provider.fetch_user(&auth_session, &self.http_client).await?;

        self.session_store.take_value(&session_id, SESSION_VALUE_KEY);

        Ok(user)
    }

    /// Pick the provider name out of the configured path parameter,
    /// falling back to the URL query parameter of the same name.
    fn resolve_provider_name(
        &self,
        path_params: &HashMap<String, String>,
        query: &HashMap<String, String>,
    ) -> Result<String> {
        let param = &self.config.request_path_param;
        path_params
            .get(param)
            .or_else(|| query.get(param))
            .filter(|name| !name.is_empty())
            .cloned()
            .ok_or_else(|| PorticoError::MissingProviderName(param.clone()))
    }

    async fn fail_response(&self, err: PorticoError) -> Response {
        let handler = self.fail_handler.read().clone();
        match handler {
            Some(handler) => handler(err).await,
            None => err.into_response(),
        }
    }
}

async fn begin_auth_handler(
    State(oauth): State<Arc<Oauth>>,
    uri: Uri,
    Path(path_params): Path<HashMap<String, String>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    match oauth.begin_auth(&headers, &path_params, &query).await {
        Ok((auth_url, cookie)) => {
            let mut response = Redirect::temporary(&auth_url).into_response();
            if let Some(cookie) = cookie
                && let Ok(value) = HeaderValue::from_str(&cookie)
            {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            response
        }
        Err(err) => {
            tracing::warn!("oauth adaptor runtime error on '{}': {}", uri.path(), err);
            oauth.fail_response(err).await
        }
    }
}

async fn callback_handler(
    State(oauth): State<Arc<Oauth>>,
    uri: Uri,
    Path(path_params): Path<HashMap<String, String>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    match oauth.complete_auth(&headers, &path_params, &query).await {
        Ok(user) => {
            let handlers: Vec<SuccessHandler> = oauth.success_handlers.read().clone();
            for handler in handlers {
                if let Some(response) = handler(user.clone()).await {
                    return response;
                }
            }
            Json(user).into_response()
        }
        Err(err) => {
            tracing::warn!("oauth adaptor runtime error on '{}': {}", uri.path(), err);
            oauth.fail_response(err).await
        }
    }
}

fn no_matching_session() -> PorticoError {
    PorticoError::auth("could not find a matching session for this request")
}

impl IntoResponse for PorticoError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            PorticoError::MissingProviderName(_) => (StatusCode::UNAUTHORIZED, "missing_provider"),
            PorticoError::UnknownProvider(_) => (StatusCode::UNAUTHORIZED, "unknown_provider"),
            PorticoError::Auth(_) => (StatusCode::UNAUTHORIZED, "auth_error"),
            PorticoError::Template(_) => (StatusCode::INTERNAL_SERVER_ERROR, "template_error"),
            PorticoError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            PorticoError::Network(_) => (StatusCode::BAD_GATEWAY, "network_error"),
            PorticoError::Io(_) | PorticoError::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}
