//! Tests for config

use super::*;
use crate::constants;

#[test]
fn defaults_match_constants() {
    let config = OauthConfig::default();

    assert_eq!(config.request_path, constants::DEFAULT_REQUEST_PATH);
    assert_eq!(
        config.request_path_param,
        constants::DEFAULT_REQUEST_PATH_PARAM
    );
    assert_eq!(
        config.callback_relative_path,
        constants::DEFAULT_CALLBACK_RELATIVE_PATH
    );
    assert_eq!(config.route_name, constants::DEFAULT_ROUTE_NAME);
    assert!(config.is_enabled());
    assert!(config.providers.is_empty());
}

#[test]
fn empty_routing_fields_disable_the_adaptor() {
    let mut config = OauthConfig::default();
    config.request_path = String::new();
    assert!(!config.is_enabled());

    let mut config = OauthConfig::default();
    config.request_path_param = String::new();
    assert!(!config.is_enabled());

    let mut config = OauthConfig::default();
    config.callback_relative_path = String::new();
    assert!(!config.is_enabled());
}

#[test]
fn fill_request_path_substitutes_the_param() {
    let config = OauthConfig::default();
    assert_eq!(config.fill_request_path("github"), "/oauth/github");

    let mut custom = OauthConfig::default();
    custom.request_path = "/login/{service}/start".to_string();
    custom.request_path_param = "service".to_string();
    assert_eq!(custom.fill_request_path("gitlab"), "/login/gitlab/start");
}

#[test]
fn callback_url_joins_vhost_path_and_suffix() {
    let config = OauthConfig::default();
    assert_eq!(
        config.callback_url("http://localhost:8080/", "github"),
        "http://localhost:8080/oauth/github/callback"
    );
}

#[test]
fn generate_providers_yields_each_entry_exactly_once() {
    let config = OauthConfig::default()
        .with_provider("github", "gh-key", "gh-secret")
        .with_provider("google", "go-key", "go-secret")
        .with_provider("gitlab", "gl-key", "gl-secret");

    let providers = config.generate_providers("http://app.local").unwrap();

    let names: Vec<&str> = providers.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["github", "gitlab", "google"]);

    let github = providers.iter().find(|p| p.name == "github").unwrap();
    assert_eq!(github.client_id, "gh-key");
    assert_eq!(
        github.callback_url,
        "http://app.local/oauth/github/callback"
    );
    assert_eq!(github.auth_url, "https://github.com/login/oauth/authorize");
    assert!(!github.scopes.is_empty());
}

#[test]
fn generate_providers_rejects_blank_credentials() {
    let config = OauthConfig::default().with_provider("github", "", "secret");

    let err = config.generate_providers("http://app.local").unwrap_err();
    assert!(err.to_string().contains("missing its key or secret"));
}

#[test]
fn generate_providers_rejects_unknown_name_without_endpoints() {
    let config = OauthConfig::default().with_provider("acme", "key", "secret");

    let err = config.generate_providers("http://app.local").unwrap_err();
    assert!(err.to_string().contains("unknown provider 'acme'"));
}

#[test]
fn generate_providers_accepts_custom_endpoints() {
    let mut config = OauthConfig::default();
    config.providers.insert(
        "acme".to_string(),
        ProviderCredentials {
            key: "key".to_string(),
            secret: "secret".to_string(),
            display_name: Some("Acme SSO".to_string()),
            scopes: Some(vec!["profile".to_string()]),
            endpoints: Some(ProviderEndpoints {
                auth_url: "https://sso.acme.example/authorize".to_string(),
                token_url: "https://sso.acme.example/token".to_string(),
                user_info_url: "https://sso.acme.example/me".to_string(),
                user_mapping: None,
            }),
        },
    );

    let providers = config.generate_providers("https://app.acme.example").unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].display_name, "Acme SSO");
    assert_eq!(providers[0].scopes, vec!["profile".to_string()]);
    // default mapping kicks in when none is configured
    assert_eq!(providers[0].user_mapping.id, "/id");
}

#[test]
fn generate_providers_rejects_bad_vhost() {
    let config = OauthConfig::default().with_provider("github", "k", "s");

    let err = config.generate_providers("not a url").unwrap_err();
    assert!(matches!(err, PorticoError::Config(_)));
}

#[test]
fn from_env_reads_credential_pairs() {
    unsafe {
        env::set_var("PORTICO_GITHUB_KEY", "env-key");
        env::set_var("PORTICO_GITHUB_SECRET", "env-secret");
        env::set_var("PORTICO_GITLAB_KEY", "only-key-no-secret");
    }

    let config = OauthConfig::from_env();

    let github = config.providers.get("github").unwrap();
    assert_eq!(github.key, "env-key");
    assert_eq!(github.secret, "env-secret");
    // a key without its secret is ignored
    assert!(!config.providers.contains_key("gitlab"));
}

#[test]
fn config_survives_serde_roundtrip() {
    let config = OauthConfig::default().with_provider("github", "k", "s");

    let json = serde_json::to_string(&config).unwrap();
    let restored: OauthConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.request_path, config.request_path);
    assert_eq!(restored.providers.len(), 1);
}
