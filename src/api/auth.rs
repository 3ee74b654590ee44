//! OAuth2 authentication for the Google APIs.
//!
//! Tokens are cached on disk. An expired token is renewed with its refresh
//! token; when that fails (revoked grant, missing refresh token) the
//! installed-application flow runs again: the consent URL is printed and the
//! authorization code is received on a loopback listener.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use url::Url;

use crate::error::{Error, Result};
use crate::output::print_info;

/// Read-only scopes needed to list courses and download Drive files.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/classroom.courses.readonly",
    "https://www.googleapis.com/auth/classroom.coursework.me.readonly",
    "https://www.googleapis.com/auth/classroom.courseworkmaterials.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration, as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecrets {
    /// Load the `installed` (or `web`) section of a client secrets file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::MissingConfig(format!(
                    "client_secrets (OAuth client file not found at {})",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let file: ClientSecretsFile = serde_json::from_str(&content)?;
        file.installed.or(file.web).ok_or_else(|| {
            Error::Config(format!(
                "{} has neither an 'installed' nor a 'web' section",
                path.display()
            ))
        })
    }
}

/// Cached credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    /// Whether the access token can still be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_MARGIN_SECONDS) > now,
            None => true,
        }
    }

    /// Whether the token was granted every scope this tool needs.
    pub fn covers_scopes(&self) -> bool {
        self.scopes.is_empty() || SCOPES.iter().all(|s| self.scopes.iter().any(|t| t == s))
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        let expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        let scopes = response
            .scope
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expiry,
            scopes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Query parameters carried by the OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectParams {
    Code { code: String, state: Option<String> },
    Denied(String),
}

/// Parse the request line of the browser's redirect, e.g.
/// `GET /?state=xyz&code=4/abc HTTP/1.1`.
///
/// Returns `None` for unrelated requests such as `/favicon.ico`.
pub fn parse_redirect_request(request_line: &str) -> Option<RedirectParams> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    let url = Url::parse(&format!("http://localhost{}", target)).ok()?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(RedirectParams::Denied(error));
    }
    code.map(|code| RedirectParams::Code { code, state })
}

/// Supplies bearer tokens and renews them when they expire.
pub struct Authenticator {
    client: Client,
    secrets: ClientSecrets,
    token_path: PathBuf,
    token: RwLock<Option<StoredToken>>,
}

impl Authenticator {
    /// Load client secrets and any cached token.
    pub fn new(client: Client, secrets_path: &Path, token_path: PathBuf) -> Result<Self> {
        let secrets = ClientSecrets::load(secrets_path)?;

        let token = match StoredToken::load(&token_path) {
            Ok(token) => token.filter(StoredToken::covers_scopes),
            Err(e) => {
                tracing::warn!("Ignoring unreadable token cache {}: {}", token_path.display(), e);
                None
            }
        };

        Ok(Self {
            client,
            secrets,
            token_path,
            token: RwLock::new(token),
        })
    }

    /// Get a valid access token, renewing it if needed.
    pub async fn access_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(token) = token.as_ref() {
                if token.is_valid_at(Utc::now()) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        self.renew().await
    }

    /// Force a new access token: refresh first, then fall back to an
    /// interactive login.
    pub async fn renew(&self) -> Result<String> {
        let mut guard = self.token.write().await;

        let refresh_token = guard.as_ref().and_then(|t| t.refresh_token.clone());
        let renewed = match refresh_token {
            Some(refresh_token) => match self.refresh(&refresh_token).await {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!("Token refresh failed, logging in again: {}", e);
                    self.interactive_login().await?
                }
            },
            None => self.interactive_login().await?,
        };

        if let Err(e) = renewed.save(&self.token_path) {
            tracing::warn!(
                "Failed to save token to {}: {}",
                self.token_path.display(),
                e
            );
        }

        let access_token = renewed.access_token.clone();
        *guard = Some(renewed);
        Ok(access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        tracing::debug!("Refreshing access token");
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.request_token(&params).await?;
        Ok(StoredToken::from_response(
            response,
            Some(refresh_token.to_string()),
        ))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&text)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or(text);
            return Err(Error::Authentication(format!("HTTP {}: {}", status, message)));
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::Authentication(format!("Invalid token response: {}", e)))
    }

    /// Build the consent page URL.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url> {
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )?;
        Ok(url)
    }

    /// Run the installed-application flow on a loopback port.
    async fn interactive_login(&self) -> Result<StoredToken> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);
        let state = uuid::Uuid::new_v4().simple().to_string();

        let url = self.authorization_url(&redirect_uri, &state)?;
        print_info("Please visit this URL to authorize access to Classroom and Drive:");
        println!("{}", url);

        let code = loop {
            let (stream, _) = listener.accept().await?;
            let (reader, mut writer) = stream.into_split();
            let mut request_line = String::new();
            BufReader::new(reader).read_line(&mut request_line).await?;

            match parse_redirect_request(&request_line) {
                Some(RedirectParams::Code {
                    code,
                    state: returned,
                }) => {
                    if returned.as_deref() != Some(state.as_str()) {
                        respond(&mut writer, "400 Bad Request", "State mismatch.").await?;
                        return Err(Error::Authentication(
                            "OAuth state mismatch in redirect".into(),
                        ));
                    }
                    respond(
                        &mut writer,
                        "200 OK",
                        "Authentication complete. You may close this window.",
                    )
                    .await?;
                    break code;
                }
                Some(RedirectParams::Denied(error)) => {
                    respond(&mut writer, "200 OK", "Authorization was denied.").await?;
                    return Err(Error::Authentication(format!(
                        "Authorization denied: {}",
                        error
                    )));
                }
                None => respond(&mut writer, "404 Not Found", "").await?,
            }
        };

        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self.request_token(&params).await?;
        Ok(StoredToken::from_response(response, None))
    }
}

async fn respond<W: AsyncWriteExt + Unpin>(writer: &mut W, status: &str, body: &str) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
