//! Authorized sessions per account role
//!
//! Tokens live as `token_<role>.json` in the data directory. An expired token
//! is refreshed against the OAuth token endpoint and written back. When there
//! is no token, or it cannot be refreshed, the browser consent flow issues a
//! new one.

pub mod consent;
pub mod token;

pub use consent::{ConsentFlow, CONSENT_TIMEOUT};
pub use token::{ClientSecrets, StoredToken, DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI, SCOPES};

use crate::config::AppConfig;
use crate::resume::write_atomic;
use crate::transfer::config::REQUEST_TIMEOUT;
use crate::AccountRole;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token file for the role
    #[error("no stored token at {0}; authorize this account and place its token file there")]
    TokenMissing(PathBuf),

    /// Token file unreadable or malformed
    #[error("invalid token file: {0}")]
    InvalidToken(String),

    /// Token expired and cannot be refreshed
    #[error("token for the {0} account has expired and has no refresh token; re-authorize it")]
    Expired(AccountRole),

    /// Client secrets file missing
    #[error("credentials file not found at {0}; download it from the Google Cloud Console")]
    CredentialsMissing(PathBuf),

    /// Client secrets malformed
    #[error("invalid credentials file: {0}")]
    InvalidCredentials(String),

    /// Token endpoint rejected the refresh
    #[error("failed to refresh token: {0}")]
    RefreshFailed(String),

    /// Browser authorization did not produce a token
    #[error("browser authorization failed: {0}")]
    ConsentFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

impl AuthError {
    /// Whether a fresh browser authorization can recover from this error
    pub fn needs_consent(&self) -> bool {
        matches!(
            self,
            AuthError::TokenMissing(_) | AuthError::Expired(_) | AuthError::RefreshFailed(_)
        )
    }
}

/// Ready-to-use access for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedSession {
    role: AccountRole,
    access_token: String,
}

impl AuthorizedSession {
    /// Wrap an access token
    pub fn new(role: AccountRole, access_token: impl Into<String>) -> Self {
        Self {
            role,
            access_token: access_token.into(),
        }
    }

    /// Account role this session acts for
    pub fn role(&self) -> AccountRole {
        self.role
    }

    /// Bearer token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Loads, refreshes and issues tokens
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials_path: PathBuf,
    token_dir: PathBuf,
    http: Client,
    consent: bool,
}

impl Authenticator {
    /// Authenticator using the locations in `config`
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        Self::with_paths(&config.credentials_path, config.data_dir())
    }

    /// Authenticator with explicit secrets file and token directory
    pub fn with_paths(credentials_path: &Path, token_dir: &Path) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::RefreshFailed(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            credentials_path: credentials_path.to_path_buf(),
            token_dir: token_dir.to_path_buf(),
            http,
            consent: true,
        })
    }

    /// Enable or disable the browser consent fallback
    pub fn with_consent(mut self, enabled: bool) -> Self {
        self.consent = enabled;
        self
    }

    /// Token file for `role`
    pub fn token_path(&self, role: AccountRole) -> PathBuf {
        self.token_dir.join(format!("token_{role}.json"))
    }

    /// Produce a session for `role`
    ///
    /// Refreshes an expired token. Falls back to browser consent when there is
    /// no token or the refresh is impossible.
    pub async fn authorize(&self, role: AccountRole) -> Result<AuthorizedSession, AuthError> {
        let path = self.token_path(role);

        let token = match self.load_or_refresh(role, &path).await {
            Ok(token) => token,
            Err(e) if self.consent && e.needs_consent() => {
                warn!(
                    role = %role,
                    error = %e,
                    "No usable stored token, starting browser authorization"
                );
                let secrets = ClientSecrets::load(&self.credentials_path)?;
                let token = ConsentFlow::new(secrets, self.http.clone())
                    .run(|url| present_consent_url(role, url))
                    .await?;
                self.save_token(role, &path, &token)?;
                token
            }
            Err(e) => return Err(e),
        };

        info!(role = %role, "Authenticated {} account", role);
        Ok(AuthorizedSession::new(role, token.token))
    }

    async fn load_or_refresh(
        &self,
        role: AccountRole,
        path: &Path,
    ) -> Result<StoredToken, AuthError> {
        let mut token = StoredToken::load(path)?;

        if token.is_expired() {
            debug!(role = %role, "Stored token expired, refreshing");
            self.refresh(role, &mut token).await?;

            if let Err(e) = write_atomic(path, &serialize_token(&token)?) {
                warn!(
                    role = %role,
                    path = %path.display(),
                    error = %e,
                    "Failed to save refreshed token"
                );
            } else {
                info!(role = %role, "Saved refreshed credentials");
            }
        }

        Ok(token)
    }

    fn save_token(
        &self,
        role: AccountRole,
        path: &Path,
        token: &StoredToken,
    ) -> Result<(), AuthError> {
        write_atomic(path, &serialize_token(token)?).map_err(|e| {
            AuthError::IoError(format!("Failed to save token to {}: {e}", path.display()))
        })?;
        info!(role = %role, path = %path.display(), "Saved new credentials");
        Ok(())
    }

    async fn refresh(&self, role: AccountRole, token: &mut StoredToken) -> Result<(), AuthError> {
        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or(AuthError::Expired(role))?;

        // The token file normally carries the client; fall back to credentials.json
        let (client_id, client_secret, default_uri) =
            match (token.client_id.clone(), token.client_secret.clone()) {
                (Some(id), Some(secret)) => (id, secret, DEFAULT_TOKEN_URI.to_string()),
                _ => {
                    let secrets = ClientSecrets::load(&self.credentials_path)?;
                    (secrets.client_id, secrets.client_secret, secrets.token_uri)
                }
            };
        let token_uri = token.token_uri.clone().unwrap_or(default_uri);

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(role = %role, status = status.as_u16(), "Token refresh rejected");
            return Err(AuthError::RefreshFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::RefreshFailed(format!("Invalid token response: {e}")))?;

        token.apply_refresh(refreshed.access_token, refreshed.expires_in, Utc::now());
        info!(role = %role, "Refreshed credentials for {} account", role);
        Ok(())
    }
}

fn present_consent_url(role: AccountRole, url: &reqwest::Url) {
    println!("\nAuthorize the {role} account by visiting this URL in a browser:\n\n{url}\n");
}

fn serialize_token(token: &StoredToken) -> Result<Vec<u8>, AuthError> {
    serde_json::to_vec_pretty(token).map_err(|e| AuthError::InvalidToken(e.to_string()))
}
