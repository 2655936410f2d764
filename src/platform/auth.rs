use std::fs;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::remote::{
    ENV_SPOTIFY_CLIENT, ENV_SPOTIFY_SECRET, GOOGLE_TOKEN_URL, SPOTIFY_TOKEN_URL,
    TOKEN_EXPIRY_SKEW_SECS,
};
use crate::errors::PipelineError;
use crate::types::Platform;

/// Bearer token plus optional expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    /// Raw bearer token.
    pub value: String,
    /// Expiry instant, when the issuer reported one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Token that never expires.
    pub fn non_expiring(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// True when the token is non-empty and not within the expiry skew of `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.value.is_empty() {
            return false;
        }
        self.expires_at
            .is_none_or(|expires_at| expires_at - Duration::seconds(TOKEN_EXPIRY_SKEW_SECS) > now)
    }
}

/// Supplies access tokens for one platform.
pub trait CredentialProvider {
    /// Platform the tokens are for.
    fn platform(&self) -> Platform;
    /// Return a currently valid token, refreshing it if the provider can.
    fn token(&self) -> Result<AccessToken, PipelineError>;
}

/// Provider returning a fixed, pre-issued token.
#[derive(Clone, Debug)]
pub struct StaticToken {
    platform: Platform,
    token: AccessToken,
}

impl StaticToken {
    /// Wrap `token` for `platform`.
    pub fn new(platform: Platform, token: AccessToken) -> Self {
        Self { platform, token }
    }
}

impl CredentialProvider for StaticToken {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn token(&self) -> Result<AccessToken, PipelineError> {
        if !self.token.is_valid_at(Utc::now()) {
            return Err(PipelineError::Credential {
                platform: self.platform,
                reason: "static token is empty or expired".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

/// Spotify application credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    /// Application client id.
    pub client_id: String,
    /// Application client secret.
    pub client_secret: String,
}

impl SpotifyCredentials {
    /// Read `SPOTIFY_CLIENT` / `SPOTIFY_SECRET`; `None` unless both are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var(ENV_SPOTIFY_CLIENT).ok()?;
        let client_secret = std::env::var(ENV_SPOTIFY_SECRET).ok()?;
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            client_secret,
        })
    }

    fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Spotify client-credentials grant.
#[derive(Clone, Debug)]
pub struct SpotifyClientCredentials {
    credentials: SpotifyCredentials,
    token_url: String,
}

impl SpotifyClientCredentials {
    /// Provider posting to the public accounts endpoint.
    pub fn new(credentials: SpotifyCredentials) -> Self {
        Self {
            credentials,
            token_url: SPOTIFY_TOKEN_URL.to_string(),
        }
    }

    /// Override the token endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

impl CredentialProvider for SpotifyClientCredentials {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    fn token(&self) -> Result<AccessToken, PipelineError> {
        info!("[activity:auth] requesting spotify client-credentials token");
        let result = ureq::post(&self.token_url)
            .header("Authorization", &self.credentials.basic_auth_header())
            .send_form([("grant_type", "client_credentials")]);
        let grant = read_token_response(Platform::Spotify, result)?;
        Ok(grant.into_token(Utc::now()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self, issued_at: DateTime<Utc>) -> AccessToken {
        AccessToken {
            value: self.access_token,
            expires_at: self
                .expires_in
                .map(|secs| issued_at + Duration::seconds(secs)),
        }
    }
}

fn read_token_response(
    platform: Platform,
    result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> Result<TokenResponse, PipelineError> {
    let credential_error = |reason: String| PipelineError::Credential { platform, reason };
    let response =
        result.map_err(|err| credential_error(format!("token request failed: {err}")))?;
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|err| credential_error(format!("failed reading token response: {err}")))?;
    serde_json::from_str(&body)
        .map_err(|err| credential_error(format!("failed parsing token response: {err}")))
}

/// On-disk Google OAuth token cache.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedGoogleToken {
    /// Current access token.
    pub access_token: String,
    /// Long-lived refresh token from the consent flow.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token expiry.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// OAuth client id used for refresh.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret used for refresh.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Token endpoint; defaults to Google's.
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl CachedGoogleToken {
    fn access_token(&self) -> AccessToken {
        AccessToken {
            value: self.access_token.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Google credentials backed by a cached consent token, refreshed on expiry.
///
/// The interactive consent flow happens out of band; this provider only
/// loads, refreshes, and rewrites the cache file.
#[derive(Clone, Debug)]
pub struct GoogleTokenCache {
    path: PathBuf,
}

impl GoogleTokenCache {
    /// Use the cache file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn credential_error(&self, reason: impl Into<String>) -> PipelineError {
        PipelineError::Credential {
            platform: Platform::YouTube,
            reason: reason.into(),
        }
    }

    fn load(&self) -> Result<CachedGoogleToken, PipelineError> {
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            self.credential_error(format!(
                "no cached token at {} ({err}); complete the consent flow first",
                self.path.display()
            ))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            self.credential_error(format!(
                "cached token at {} is unreadable: {err}",
                self.path.display()
            ))
        })
    }

    fn store(&self, cached: &CachedGoogleToken) -> Result<(), PipelineError> {
        let body = serde_json::to_string_pretty(cached)?;
        fs::write(&self.path, body)?;
        info!(
            path = %self.path.display(),
            "[activity:auth] saved refreshed google token"
        );
        Ok(())
    }

    fn refresh(&self, cached: CachedGoogleToken) -> Result<CachedGoogleToken, PipelineError> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            cached.refresh_token.as_deref(),
            cached.client_id.as_deref(),
            cached.client_secret.as_deref(),
        ) else {
            return Err(self.credential_error(
                "cached token expired and cannot be refreshed; complete the consent flow again",
            ));
        };
        let token_uri = cached.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URL);
        info!("[activity:auth] refreshing google access token");
        let result = ureq::post(token_uri).send_form([
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ]);
        let grant = read_token_response(Platform::YouTube, result)?;
        let token = grant.into_token(Utc::now());
        Ok(CachedGoogleToken {
            access_token: token.value,
            expires_at: token.expires_at,
            ..cached
        })
    }
}

impl CredentialProvider for GoogleTokenCache {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn token(&self) -> Result<AccessToken, PipelineError> {
        let cached = self.load()?;
        if cached.access_token().is_valid_at(Utc::now()) {
            return Ok(cached.access_token());
        }
        let refreshed = self.refresh(cached)?;
        self.store(&refreshed)?;
        Ok(refreshed.access_token())
    }
}
