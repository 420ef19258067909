//! Installed-app authorization through the browser
//!
//! The operator opens the consent URL, Google redirects back to a loopback
//! listener with a one-time code, and the code is exchanged for tokens.

use super::token::{ClientSecrets, StoredToken, SCOPES};
use super::AuthError;
use chrono::Utc;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How long to wait for the browser redirect
pub const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

const MAX_REQUEST_HEAD: usize = 8 * 1024;

const SUCCESS_PAGE: &str =
    "<html><body><p>Authorization complete. You may close this window.</p></body></html>";
const FAILURE_PAGE: &str =
    "<html><body><p>Authorization failed. Return to the terminal for details.</p></body></html>";

#[derive(Debug, Deserialize)]
struct CodeExchangeResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Browser consent for one OAuth client
#[derive(Debug, Clone)]
pub struct ConsentFlow {
    secrets: ClientSecrets,
    http: Client,
    timeout: Duration,
}

impl ConsentFlow {
    /// Flow for the client registered in `secrets`
    pub fn new(secrets: ClientSecrets, http: Client) -> Self {
        Self {
            secrets,
            http,
            timeout: CONSENT_TIMEOUT,
        }
    }

    /// Override how long to wait for the redirect
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Consent page URL redirecting to `redirect_uri` with `state`
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, AuthError> {
        let scope = SCOPES.join(" ");
        Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::InvalidCredentials(format!("invalid auth_uri: {e}")))
    }

    /// Run the flow, handing the consent URL to `present`
    pub async fn run<F>(&self, present: F) -> Result<StoredToken, AuthError>
    where
        F: FnOnce(&Url),
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| AuthError::IoError(format!("Failed to bind redirect listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::IoError(e.to_string()))?
            .port();

        let redirect_uri = format!("http://127.0.0.1:{port}/");
        let state = Uuid::new_v4().to_string();
        let url = self.authorization_url(&redirect_uri, &state)?;

        present(&url);
        debug!(redirect_uri = %redirect_uri, "Waiting for authorization redirect");

        let code = tokio::time::timeout(self.timeout, receive_code(&listener, &state))
            .await
            .map_err(|_| {
                AuthError::ConsentFailed(format!(
                    "no authorization response within {}s",
                    self.timeout.as_secs()
                ))
            })??;

        self.exchange_code(&code, &redirect_uri).await
    }

    /// Trade an authorization code for tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<StoredToken, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.secrets.token_uri)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ConsentFailed(format!("code exchange failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Authorization code rejected");
            return Err(AuthError::ConsentFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let issued: CodeExchangeResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ConsentFailed(format!("Invalid token response: {e}")))?;

        if issued.refresh_token.is_none() {
            warn!("Token response carried no refresh token; expiry will need consent again");
        }

        let mut token = StoredToken::new(String::new());
        token.apply_refresh(issued.access_token, issued.expires_in, Utc::now());
        token.refresh_token = issued.refresh_token;
        token.token_uri = Some(self.secrets.token_uri.clone());
        token.client_id = Some(self.secrets.client_id.clone());
        token.client_secret = Some(self.secrets.client_secret.clone());
        token.scopes = match issued.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => SCOPES.iter().map(|s| s.to_string()).collect(),
        };

        info!("Exchanged authorization code for tokens");
        Ok(token)
    }
}

/// Accept redirects on `listener` until one carries the authorization result
///
/// Requests without a `code` or `error` parameter (a favicon fetch, say) get
/// a 404 and are skipped.
pub async fn receive_code(
    listener: &TcpListener,
    expected_state: &str,
) -> Result<String, AuthError> {
    loop {
        let (mut socket, peer) = listener
            .accept()
            .await
            .map_err(|e| AuthError::IoError(e.to_string()))?;

        let target = match read_request_target(&mut socket).await {
            Ok(target) => target,
            Err(e) => {
                debug!(peer = %peer, error = %e, "Ignoring unreadable redirect request");
                continue;
            }
        };

        let params = query_params(&target);
        if !params.contains_key("code") && !params.contains_key("error") {
            respond(&mut socket, "404 Not Found", "").await;
            continue;
        }

        if params.get("state").map(String::as_str) != Some(expected_state) {
            respond(&mut socket, "400 Bad Request", FAILURE_PAGE).await;
            return Err(AuthError::ConsentFailed(
                "state mismatch in authorization response".to_string(),
            ));
        }

        if let Some(error) = params.get("error") {
            respond(&mut socket, "200 OK", FAILURE_PAGE).await;
            return Err(AuthError::ConsentFailed(format!("authorization denied: {error}")));
        }

        match params.get("code").filter(|code| !code.is_empty()) {
            Some(code) => {
                respond(&mut socket, "200 OK", SUCCESS_PAGE).await;
                return Ok(code.clone());
            }
            None => {
                respond(&mut socket, "400 Bad Request", FAILURE_PAGE).await;
                return Err(AuthError::ConsentFailed(
                    "empty authorization code".to_string(),
                ));
            }
        }
    }
}

async fn read_request_target(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        if buf.len() > MAX_REQUEST_HEAD {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    match (request_line.next(), request_line.next()) {
        (Some("GET"), Some(target)) => Ok(target.to_string()),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "expected a GET request",
        )),
    }
}

fn query_params(target: &str) -> HashMap<String, String> {
    Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(target))
        .map(|url| url.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

async fn respond(socket: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = socket.write_all(response.as_bytes()).await {
        debug!(error = %e, "Failed to answer redirect request");
    }
    let _ = socket.shutdown().await;
}
