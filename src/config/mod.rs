//! Configuration for the OAuth adaptor
//!
//! The configuration is a static record: where the login routes live, how
//! the provider name is picked out of a request, and a provider-name ->
//! credential-pair map. [`OauthConfig::generate_providers`] turns that
//! record into the provider set the adaptor registers.

use crate::constants::{
    DEFAULT_CALLBACK_RELATIVE_PATH, DEFAULT_REQUEST_PATH, DEFAULT_REQUEST_PATH_PARAM,
    DEFAULT_ROUTE_NAME, DEFAULT_SESSION_TTL_MINUTES,
};
use crate::provider::{Provider, UserMapping, catalog};
use crate::{PorticoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

/// OAuth adaptor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OauthConfig {
    /// Route template for starting a login, e.g. `/oauth/{provider}`
    pub request_path: String,

    /// Name of the path (or query) parameter carrying the provider name
    pub request_path_param: String,

    /// Path appended to the request path for the provider callback
    pub callback_relative_path: String,

    /// Route name registered for reverse URL generation
    pub route_name: String,

    /// How long a login may sit between begin and callback
    pub session_ttl_minutes: i64,

    /// Set the Secure flag on session cookies (requires HTTPS)
    pub secure_cookies: bool,

    /// Provider name -> credential pair
    pub providers: HashMap<String, ProviderCredentials>,
}

/// Operator-supplied credentials for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub key: String,
    pub secret: String,

    /// Overrides the catalog display name
    #[serde(default)]
    pub display_name: Option<String>,

    /// Overrides the catalog default scopes
    #[serde(default)]
    pub scopes: Option<Vec<String>>,

    /// Required for providers the catalog does not know
    #[serde(default)]
    pub endpoints: Option<ProviderEndpoints>,
}

/// Explicit endpoints for a non-catalog provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,

    /// Where the standard user fields live in the user-info response
    #[serde(default)]
    pub user_mapping: Option<UserMapping>,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            request_path: DEFAULT_REQUEST_PATH.to_string(),
            request_path_param: DEFAULT_REQUEST_PATH_PARAM.to_string(),
            callback_relative_path: DEFAULT_CALLBACK_RELATIVE_PATH.to_string(),
            route_name: DEFAULT_ROUTE_NAME.to_string(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            secure_cookies: false,
            providers: HashMap::new(),
        }
    }
}

impl ProviderCredentials {
    pub fn new<K: Into<String>, S: Into<String>>(key: K, secret: S) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            display_name: None,
            scopes: None,
            endpoints: None,
        }
    }
}

impl OauthConfig {
    /// Build a configuration from the environment.
    ///
    /// Loads `.env` when present, then picks up
    /// `PORTICO_<PROVIDER>_KEY` / `PORTICO_<PROVIDER>_SECRET` pairs for
    /// every catalog provider.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        for name in catalog::names() {
            let upper = name.to_uppercase();
            let key = env::var(format!("PORTICO_{upper}_KEY")).unwrap_or_default();
            let secret = env::var(format!("PORTICO_{upper}_SECRET")).unwrap_or_default();
            if !key.is_empty() && !secret.is_empty() {
                config
                    .providers
                    .insert(name.to_string(), ProviderCredentials::new(key, secret));
            }
        }
        config
    }

    /// Add a provider credential pair
    pub fn with_provider<K: Into<String>, S: Into<String>>(
        mut self,
        name: &str,
        key: K,
        secret: S,
    ) -> Self {
        self.providers
            .insert(name.to_string(), ProviderCredentials::new(key, secret));
        self
    }

    /// The adaptor only registers routes when all three routing fields are
    /// set. An unset field disables it rather than failing the app.
    pub fn is_enabled(&self) -> bool {
        !self.request_path.is_empty()
            && !self.request_path_param.is_empty()
            && !self.callback_relative_path.is_empty()
    }

    /// Fill the request-path template with a provider name.
    pub fn fill_request_path(&self, provider: &str) -> String {
        self.request_path
            .replace(&format!("{{{}}}", self.request_path_param), provider)
    }

    /// The absolute callback URL a provider redirects back to.
    pub fn callback_url(&self, vhost: &str, provider: &str) -> String {
        format!(
            "{}{}{}",
            vhost.trim_end_matches('/'),
            self.fill_request_path(provider),
            self.callback_relative_path
        )
    }

    /// Generate the provider set for this configuration, sorted by name.
    ///
    /// Every configured entry appears exactly once. Credentials must be
    /// non-empty, and names the catalog does not know need explicit
    /// endpoints.
    pub fn generate_providers(&self, vhost: &str) -> Result<Vec<Provider>> {
        url::Url::parse(vhost)
            .map_err(|e| PorticoError::config(format!("invalid vhost '{vhost}': {e}")))?;

        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();

        let mut providers = Vec::with_capacity(names.len());
        for name in names {
            let credentials = &self.providers[name];
            if credentials.key.is_empty() || credentials.secret.is_empty() {
                return Err(PorticoError::config(format!(
                    "provider '{name}' is missing its key or secret"
                )));
            }

            let provider = match (&credentials.endpoints, catalog::lookup(name)) {
                (Some(endpoints), _) => Provider {
                    name: name.clone(),
                    display_name: credentials
                        .display_name
                        .clone()
                        .unwrap_or_else(|| name.clone()),
                    client_id: credentials.key.clone(),
                    client_secret: credentials.secret.clone(),
                    callback_url: self.callback_url(vhost, name),
                    auth_url: endpoints.auth_url.clone(),
                    token_url: endpoints.token_url.clone(),
                    user_info_url: endpoints.user_info_url.clone(),
                    scopes: credentials.scopes.clone().unwrap_or_default(),
                    user_mapping: endpoints.user_mapping.clone().unwrap_or_default(),
                },
                (None, Some(template)) => Provider {
                    name: name.clone(),
                    display_name: credentials
                        .display_name
                        .clone()
                        .unwrap_or_else(|| template.display_name.to_string()),
                    client_id: credentials.key.clone(),
                    client_secret: credentials.secret.clone(),
                    callback_url: self.callback_url(vhost, name),
                    auth_url: template.auth_url.to_string(),
                    token_url: template.token_url.to_string(),
                    user_info_url: template.user_info_url.to_string(),
                    scopes: credentials
                        .scopes
                        .clone()
                        .unwrap_or_else(|| template.scopes.iter().map(|s| s.to_string()).collect()),
                    user_mapping: template.user_mapping,
                },
                (None, None) => {
                    return Err(PorticoError::config(format!(
                        "unknown provider '{name}': not in the catalog and no endpoints configured"
                    )));
                }
            };
            providers.push(provider);
        }

        Ok(providers)
    }
}

#[cfg(test)]
mod config_test;
