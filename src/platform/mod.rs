//! Platform API access.
//!
//! Ownership model:
//! - `CredentialProvider` hands out access tokens; it is consulted once when a
//!   transport is built.
//! - `JsonTransport` is the seam between typed clients and the network, so
//!   clients can be exercised with canned responses.
//! - `YouTubeClient` and `SpotifyClient` own their response schemas and turn
//!   raw bodies into tables.

use serde_json::Value;

use crate::errors::PipelineError;
use crate::types::Platform;

/// Credential providers for both platforms.
pub mod auth;
/// `ureq`-backed transport.
pub mod http;
/// Spotify Web API client.
pub mod spotify;
/// YouTube Data API client.
pub mod youtube;

#[cfg(test)]
pub(crate) mod test_http;

pub use auth::{
    AccessToken, CredentialProvider, GoogleTokenCache, SpotifyClientCredentials,
    SpotifyCredentials, StaticToken,
};
pub use http::HttpJsonClient;
pub use spotify::SpotifyClient;
pub use youtube::YouTubeClient;

/// Fetches JSON documents from one platform's API.
pub trait JsonTransport {
    /// Platform this transport talks to.
    fn platform(&self) -> Platform;
    /// GET `path` (relative to the API base) with `query` parameters.
    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, PipelineError>;
}

impl<T: JsonTransport + ?Sized> JsonTransport for &T {
    fn platform(&self) -> Platform {
        (**self).platform()
    }

    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, PipelineError> {
        (**self).get_json(path, query)
    }
}
