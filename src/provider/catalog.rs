//! Built-in provider endpoint templates
//!
//! Endpoint and user-info knowledge for the well-known providers, so
//! operators only supply a credential pair. Anything not listed here needs
//! explicit endpoints in its [`crate::config::ProviderCredentials`].

use super::UserMapping;

/// Endpoints and user-info mapping for a known provider.
#[derive(Debug, Clone)]
pub struct ProviderTemplate {
    pub display_name: &'static str,
    pub auth_url: &'static str,
    pub token_url: &'static str,
    pub user_info_url: &'static str,
    pub scopes: &'static [&'static str],
    pub user_mapping: UserMapping,
}

/// Names of all built-in providers.
pub fn names() -> &'static [&'static str] {
    &[
        "github",
        "gitlab",
        "google",
        "facebook",
        "discord",
        "slack",
        "microsoft",
        "bitbucket",
    ]
}

/// Look up the endpoint template for a built-in provider.
pub fn lookup(name: &str) -> Option<ProviderTemplate> {
    let template = match name.to_ascii_lowercase().as_str() {
        "github" => ProviderTemplate {
            display_name: "GitHub",
            auth_url: "https://github.com/login/oauth/authorize",
            token_url: "https://github.com/login/oauth/access_token",
            user_info_url: "https://api.github.com/user",
            scopes: &["read:user", "user:email"],
            user_mapping: mapping("/id", "/name", "/login", "/email", "/avatar_url"),
        },
        "gitlab" => ProviderTemplate {
            display_name: "GitLab",
            auth_url: "https://gitlab.com/oauth/authorize",
            token_url: "https://gitlab.com/oauth/token",
            user_info_url: "https://gitlab.com/api/v4/user",
            scopes: &["read_user"],
            user_mapping: mapping("/id", "/name", "/username", "/email", "/avatar_url"),
        },
        "google" => ProviderTemplate {
            display_name: "Google",
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            user_info_url: "https://www.googleapis.com/oauth2/v2/userinfo",
            scopes: &["openid", "email", "profile"],
            user_mapping: UserMapping {
                id: "/id".to_string(),
                name: Some("/name".to_string()),
                nickname: None,
                email: Some("/email".to_string()),
                avatar_url: Some("/picture".to_string()),
            },
        },
        "facebook" => ProviderTemplate {
            display_name: "Facebook",
            auth_url: "https://www.facebook.com/dialog/oauth",
            token_url: "https://graph.facebook.com/oauth/access_token",
            user_info_url: "https://graph.facebook.com/me?fields=id,name,email",
            scopes: &["email", "public_profile"],
            user_mapping: UserMapping {
                id: "/id".to_string(),
                name: Some("/name".to_string()),
                nickname: None,
                email: Some("/email".to_string()),
                avatar_url: None,
            },
        },
        "discord" => ProviderTemplate {
            display_name: "Discord",
            auth_url: "https://discord.com/api/oauth2/authorize",
            token_url: "https://discord.com/api/oauth2/token",
            user_info_url: "https://discord.com/api/users/@me",
            scopes: &["identify", "email"],
            user_mapping: mapping("/id", "/global_name", "/username", "/email", "/avatar"),
        },
        "slack" => ProviderTemplate {
            display_name: "Slack",
            auth_url: "https://slack.com/openid/connect/authorize",
            token_url: "https://slack.com/api/openid.connect.token",
            user_info_url: "https://slack.com/api/openid.connect.userInfo",
            scopes: &["openid", "email", "profile"],
            user_mapping: UserMapping {
                id: "/sub".to_string(),
                name: Some("/name".to_string()),
                nickname: None,
                email: Some("/email".to_string()),
                avatar_url: Some("/picture".to_string()),
            },
        },
        "microsoft" => ProviderTemplate {
            display_name: "Microsoft",
            auth_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            user_info_url: "https://graph.microsoft.com/v1.0/me",
            scopes: &["User.Read"],
            user_mapping: UserMapping {
                id: "/id".to_string(),
                name: Some("/displayName".to_string()),
                nickname: Some("/userPrincipalName".to_string()),
                email: Some("/mail".to_string()),
                avatar_url: None,
            },
        },
        "bitbucket" => ProviderTemplate {
            display_name: "Bitbucket",
            auth_url: "https://bitbucket.org/site/oauth2/authorize",
            token_url: "https://bitbucket.org/site/oauth2/access_token",
            user_info_url: "https://api.bitbucket.org/2.0/user",
            scopes: &["account"],
            user_mapping: UserMapping {
                id: "/uuid".to_string(),
                name: Some("/display_name".to_string()),
                nickname: Some("/username".to_string()),
                email: None,
                avatar_url: Some("/links/avatar/href".to_string()),
            },
        },
        _ => return None,
    };
    Some(template)
}

fn mapping(id: &str, name: &str, nickname: &str, email: &str, avatar_url: &str) -> UserMapping {
    UserMapping {
        id: id.to_string(),
        name: Some(name.to_string()),
        nickname: Some(nickname.to_string()),
        email: Some(email.to_string()),
        avatar_url: Some(avatar_url.to_string()),
    }
}
