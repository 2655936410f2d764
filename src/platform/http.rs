use serde_json::Value;
use tracing::debug;

use super::JsonTransport;
use super::auth::{AccessToken, CredentialProvider};
use crate::errors::PipelineError;
use crate::types::Platform;

/// Bearer-authenticated JSON transport over `ureq`.
///
/// The token is obtained once when the client is built and reused for every
/// call in the run.
#[derive(Clone, Debug)]
pub struct HttpJsonClient {
    platform: Platform,
    base_url: String,
    token: AccessToken,
}

impl HttpJsonClient {
    /// Build a client for `base_url`, fetching a token from `provider`.
    pub fn connect(
        base_url: impl Into<String>,
        provider: &dyn CredentialProvider,
    ) -> Result<Self, PipelineError> {
        let token = provider.token()?;
        Ok(Self::with_token(provider.platform(), base_url, token))
    }

    /// Build a client around an already issued token.
    pub fn with_token(platform: Platform, base_url: impl Into<String>, token: AccessToken) -> Self {
        Self {
            platform,
            base_url: base_url.into(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn lookup_error(&self, path: &str, reason: String) -> PipelineError {
        PipelineError::Lookup {
            platform: self.platform,
            endpoint: path.to_string(),
            reason,
        }
    }
}

impl JsonTransport for HttpJsonClient {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, PipelineError> {
        let endpoint = self.endpoint(path);
        debug!(
            platform = %self.platform,
            endpoint = %endpoint,
            "[activity:http] GET"
        );
        let mut request = ureq::get(&endpoint)
            .header("Authorization", &format!("Bearer {}", self.token.value));
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        let response = request
            .call()
            .map_err(|err| self.lookup_error(path, format!("request failed: {err}")))?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|err| self.lookup_error(path, format!("failed reading response body: {err}")))?;
        serde_json::from_str(&body)
            .map_err(|err| self.lookup_error(path, format!("failed parsing response body: {err}")))
    }
}
