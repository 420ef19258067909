//! OAuth client secrets and stored user tokens

use super::AuthError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Google's token endpoint, used when a file does not name one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google's authorization endpoint, used when a file does not name one
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Scopes requested for both accounts
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube",
];

/// Tokens this close to expiry are refreshed early
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth client registration (`credentials.json`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authorization endpoint
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse the console download, which nests the client under `installed` or `web`
    pub fn parse(contents: &str) -> Result<Self, AuthError> {
        let file: SecretsFile = serde_json::from_str(contents)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidCredentials(
                "expected an \"installed\" or \"web\" client section".to_string(),
            )
        })
    }

    /// Load from disk
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::CredentialsMissing(path.to_path_buf()))
            }
            Err(e) => return Err(AuthError::IoError(e.to_string())),
        };
        Self::parse(&contents)
    }
}

/// Authorized-user token file (`token_<role>.json`)
///
/// Unknown fields are kept so a rewrite does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Current access token
    pub token: String,
    /// Long-lived refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    /// OAuth client ID the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// OAuth client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Granted scopes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Access token expiry (ISO-8601, UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl StoredToken {
    /// Token without refresh capability
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: Vec::new(),
            expiry: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Load from disk
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuthError::TokenMissing(path.to_path_buf())
            } else {
                AuthError::IoError(e.to_string())
            }
        })?;

        let token: StoredToken = serde_json::from_str(&contents)
            .map_err(|e| AuthError::InvalidToken(format!("{}: {e}", path.display())))?;

        if token.token.trim().is_empty() {
            return Err(AuthError::InvalidToken(format!(
                "{}: empty access token",
                path.display()
            )));
        }
        Ok(token)
    }

    /// Parsed expiry; naive timestamps are taken as UTC
    pub fn expiry_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiry.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Whether the access token is expired (or about to be) at `now`
    ///
    /// Tokens without a readable expiry are assumed valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time()
            .is_some_and(|expiry| expiry <= now + chrono::Duration::seconds(EXPIRY_SKEW_SECS))
    }

    /// Whether the access token is expired now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Install a freshly issued access token
    pub fn apply_refresh(&mut self, access_token: String, expires_in: Option<i64>, now: DateTime<Utc>) {
        self.token = access_token;
        self.expiry = expires_in.map(|secs| {
            (now + chrono::Duration::seconds(secs)).to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        });
    }
}
