use std::fmt;

/// Platform-issued identifier (video, category, artist, or track id).
/// Examples: `dQw4w9WgXcQ`, `10`, `0OdUWJ0sBjDrqHygGUXeCF`
pub type RecordId = String;
/// Column name inside a `Table`.
/// Examples: `id`, `videoTitle`, `album.name`
pub type ColumnName = String;
/// Dotted path into a nested JSON response.
/// Examples: `snippet.title`, `followers.total`
pub type FieldPath = String;

/// External platform an identifier or credential belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Google's YouTube Data API.
    YouTube,
    /// Spotify Web API.
    Spotify,
}

impl Platform {
    /// Stable lowercase label used in logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Spotify => "spotify",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
