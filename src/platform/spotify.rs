use std::sync::OnceLock;

use super::JsonTransport;
use crate::constants::columns::{ARTIST_ID, GENRES};
use crate::errors::PipelineError;
use crate::mapping::ResponseSchema;
use crate::normalize::normalize_tags;
use crate::table::Table;

/// `/artists` response → artist table.
pub fn artist_schema() -> &'static ResponseSchema {
    static SCHEMA: OnceLock<ResponseSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        ResponseSchema::new(
            "artists",
            &[
                ("id", "artistId"),
                ("name", "artistName"),
                ("genres", "genres"),
                ("popularity", "artistPopularity"),
                ("followers.total", "artistFollowers"),
            ],
        )
    })
}

/// Spotify Web API lookups over an injected transport.
pub struct SpotifyClient<T: JsonTransport> {
    transport: T,
}

impl<T: JsonTransport> SpotifyClient<T> {
    /// Wrap `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Raw artist rows for up to 50 comma-joined artist ids.
    pub fn artists(&self, joined: &str) -> Result<Table, PipelineError> {
        let body = self.transport.get_json("artists", &[("ids", joined)])?;
        artist_schema().extract(&body)
    }

    /// Artist rows with the genre list rendered into one cell.
    pub fn artist_details(&self, joined: &str) -> Result<Table, PipelineError> {
        let (artists, genres) = normalize_tags(self.artists(joined)?, ARTIST_ID, GENRES)?;
        artists.left_join(&genres, ARTIST_ID, ARTIST_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakeTransport;
    use crate::types::Platform;
    use serde_json::{Value, json};

    #[test]
    fn artist_details_flatten_followers_and_join_genres() {
        let transport = FakeTransport::new(
            Platform::Spotify,
            vec![json!({"artists": [
                {"id": "ar1", "name": "One", "genres": ["indie", "pop"], "popularity": 55,
                 "followers": {"href": null, "total": 1200}},
                {"id": "ar2", "name": "Two", "genres": [], "popularity": 10,
                 "followers": {"total": 3}},
            ]})],
        );

        let table = SpotifyClient::new(&transport).artist_details("ar1,ar2").unwrap();

        assert_eq!(
            table.columns().collect::<Vec<_>>(),
            vec!["artistId", "artistName", "artistPopularity", "artistFollowers", "genres"]
        );
        assert_eq!(table.value(0, "genres"), Some(&json!("indie,pop")));
        assert_eq!(table.value(0, "artistFollowers"), Some(&json!(1200)));
        assert_eq!(table.value(1, "genres"), Some(&Value::Null));
        assert_eq!(transport.query_values("ids"), vec!["ar1,ar2".to_string()]);
        assert_eq!(transport.requests.borrow()[0].0, "artists");
    }

    #[test]
    fn body_without_artists_key_is_empty() {
        let transport = FakeTransport::new(Platform::Spotify, vec![json!({"error": "nope"})]);
        let table = SpotifyClient::new(&transport).artists("x").unwrap();
        assert!(table.is_empty());
        assert!(table.has_column("artistId"));
    }
}
