//! OAuth providers and handshake sessions
//!
//! A [`Provider`] wraps one configured OAuth/OAuth2 endpoint set and
//! delegates the protocol to the `oauth2` crate: building the
//! authorization URL, exchanging the callback code, and fetching the user
//! record. The [`ProviderRegistry`] holds the generated provider set for
//! the adaptor's lifetime.

pub mod catalog;

use crate::{PorticoError, Result};
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
    basic::BasicClient,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Fully configured oauth2 client with auth and token endpoints set.
type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// JSON-pointer paths into a provider's user-info response.
///
/// Only `id` is required; everything else degrades to `None` when the
/// provider does not report it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMapping {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Default for UserMapping {
    fn default() -> Self {
        Self {
            id: "/id".to_string(),
            name: Some("/name".to_string()),
            nickname: None,
            email: Some("/email".to_string()),
            avatar_url: None,
        }
    }
}

/// One configured OAuth provider
#[derive(Debug, Clone)]
pub struct Provider {
    pub name: String,
    pub display_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub scopes: Vec<String>,
    pub user_mapping: UserMapping,
}

/// Per-request handshake state, marshaled into the session store between
/// the begin and callback requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub provider: String,
    pub auth_url: String,
    pub state: String,
    pub pkce_verifier: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Serialize the session for storage.
    pub fn marshal(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a stored session. A corrupt blob is an authentication
    /// failure, not a crash.
    pub fn unmarshal(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| PorticoError::auth(format!("invalid auth session: {e}")))
    }
}

/// The authenticated user record produced by a completed handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub provider: String,
    pub user_id: String,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Raw user-info response for fields the mapping does not cover
    pub raw: serde_json::Value,
}

impl Provider {
    /// Begin the authorization-code flow: build the authorization URL with
    /// scopes, state, and a PKCE challenge.
    ///
    /// `state_override` preserves a caller-supplied `state` query
    /// parameter; otherwise a random token is generated.
    pub fn begin_auth(&self, state_override: Option<String>) -> Result<AuthSession> {
        let client = self.oauth_client()?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let request = match state_override {
            Some(state) => client.authorize_url(|| CsrfToken::new(state)),
            None => client.authorize_url(CsrfToken::new_random),
        };

        let (auth_url, csrf_token) = request
            .add_scopes(self.scopes.iter().map(|s| Scope::new(s.clone())))
            .set_pkce_challenge(pkce_challenge)
            .url();

        Ok(AuthSession {
            provider: self.name.clone(),
            auth_url: auth_url.to_string(),
            state: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            access_token: None,
            refresh_token: None,
            expires_at: None,
        })
    }

    /// Complete the handshake against the callback query parameters:
    /// surface a provider `error`, validate `state`, and exchange the
    /// authorization code for tokens.
    pub async fn authorize(
        &self,
        session: &mut AuthSession,
        params: &HashMap<String, String>,
        http_client: &reqwest::Client,
    ) -> Result<()> {
        if let Some(error) = params.get("error") {
            let description = params
                .get("error_description")
                .map(|d| format!(": {d}"))
                .unwrap_or_default();
            return Err(PorticoError::auth(format!(
                "provider rejected the request: {error}{description}"
            )));
        }

        let state = params.get(crate::constants::STATE_PARAM);
        if !constant_time_eq(state.map(String::as_str).unwrap_or(""), &session.state) {
            return Err(PorticoError::auth("state parameter mismatch"));
        }

        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PorticoError::auth("missing authorization code"))?;

        let token_result = self
            .oauth_client()?
            .exchange_code(AuthorizationCode::new(code.clone()))
            .set_pkce_verifier(PkceCodeVerifier::new(session.pkce_verifier.clone()))
            .request_async(http_client)
            .await
            .map_err(|e| PorticoError::auth(format!("token exchange failed: {e}")))?;

        session.access_token = Some(token_result.access_token().secret().clone());
        session.refresh_token = token_result.refresh_token().map(|t| t.secret().clone());
        session.expires_at = token_result
            .expires_in()
            .map(|duration| Utc::now() + Duration::seconds(duration.as_secs() as i64));

        Ok(())
    }

    /// Fetch the user record from the provider's user-info endpoint.
    pub async fn fetch_user(
        &self,
        session: &AuthSession,
        http_client: &reqwest::Client,
    ) -> Result<AuthUser> {
        let access_token = session
            .access_token
            .as_deref()
            .ok_or_else(|| PorticoError::auth("session has not been authorized"))?;

        let response = http_client
            .get(&self.user_info_url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            // GitHub rejects requests without a user agent
            .header(
                reqwest::header::USER_AGENT,
                concat!("portico/", env!("CARGO_PKG_VERSION")),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PorticoError::auth(format!(
                "user info request failed with status {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response.json().await?;

        let user_id = pointer_string(&raw, &self.user_mapping.id).ok_or_else(|| {
            PorticoError::auth(format!(
                "user info response missing id field {}",
                self.user_mapping.id
            ))
        })?;

        Ok(AuthUser {
            provider: self.name.clone(),
            user_id,
            name: lookup_mapped(&raw, self.user_mapping.name.as_deref()),
            nickname: lookup_mapped(&raw, self.user_mapping.nickname.as_deref()),
            email: lookup_mapped(&raw, self.user_mapping.email.as_deref()),
            avatar_url: lookup_mapped(&raw, self.user_mapping.avatar_url.as_deref()),
            access_token: access_token.to_string(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
            raw,
        })
    }

    fn oauth_client(&self) -> Result<ConfiguredClient> {
        Ok(BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(self.auth_url.clone())
                    .map_err(|e| PorticoError::auth(format!("invalid auth URL: {e}")))?,
            )
            .set_token_uri(
                TokenUrl::new(self.token_url.clone())
                    .map_err(|e| PorticoError::auth(format!("invalid token URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(self.callback_url.clone())
                    .map_err(|e| PorticoError::auth(format!("invalid redirect URI: {e}")))?,
            ))
    }
}

/// Name-keyed set of configured providers
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a provider set. Providers sharing a name replace each
    /// other, so every name appears exactly once.
    pub fn use_providers(&self, providers: Vec<Provider>) {
        let mut map = self.providers.write();
        for provider in providers {
            map.insert(provider.name.clone(), Arc::new(provider));
        }
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Result<Arc<Provider>> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PorticoError::UnknownProvider(name.to_string()))
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }
}

/// Constant-time string comparison for state tokens
fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).unwrap_u8() == 1
}

/// Resolve a JSON pointer to a string, stringifying numeric ids.
fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lookup_mapped(value: &serde_json::Value, pointer: Option<&str>) -> Option<String> {
    pointer_string(value, pointer?)
}
