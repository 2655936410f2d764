/// Constants used by the bulk fetch batcher.
pub mod batch {
    /// Maximum number of ids either platform accepts in one bulk lookup.
    pub const MAX_IDS_PER_CALL: usize = 50;
    /// Delimiter used when joining ids into the lookup wire format.
    pub const ID_DELIMITER: &str = ",";
}

/// Constants used by the Takeout HTML history parser.
pub mod history {
    /// Selector for per-entry containers in the export.
    pub const CONTAINER_SELECTOR: &str = "body > div:first-of-type > div";
    /// Selector for the content cell inside a container.
    pub const CONTENT_SELECTOR: &str = "div.mdl-typography--body-1";
    /// Selector for links inside a content cell.
    pub const LINK_SELECTOR: &str = "a";
    /// Query parameter that carries the video id in watch URLs.
    pub const VIDEO_ID_PARAM: &str = "v";
    /// Date-time layout preceding the trailing zone token.
    /// Example: `Jan 5, 2023, 10:32:15 PM`
    pub const TIMESTAMP_FORMAT: &str = "%b %d, %Y, %I:%M:%S %p";
    /// Zone abbreviations accepted after the timestamp, with UTC offsets in minutes.
    /// `IST` is India Standard Time.
    pub const ZONE_OFFSETS: &[(&str, i32)] = &[
        ("UTC", 0),
        ("GMT", 0),
        ("WET", 0),
        ("BST", 60),
        ("CET", 60),
        ("WEST", 60),
        ("CEST", 120),
        ("EET", 120),
        ("EEST", 180),
        ("AST", -240),
        ("EDT", -240),
        ("EST", -300),
        ("CDT", -300),
        ("CST", -360),
        ("MDT", -360),
        ("MST", -420),
        ("PDT", -420),
        ("PST", -480),
        ("AKDT", -480),
        ("AKST", -540),
        ("HST", -600),
        ("IST", 330),
        ("SGT", 480),
        ("HKT", 480),
        ("AWST", 480),
        ("JST", 540),
        ("KST", 540),
        ("ACST", 570),
        ("ACDT", 630),
        ("AEST", 600),
        ("AEDT", 660),
        ("NZST", 720),
        ("NZDT", 780),
    ];
}

/// Column names shared across stages.
pub mod columns {
    /// Video identifier column (detail, tag, and history tables).
    pub const ID: &str = "id";
    /// Multi-valued video tag column.
    pub const TAGS: &str = "tags";
    /// Category identifier column.
    pub const CATEGORY_ID: &str = "categoryId";
    /// Event timestamp column.
    pub const TIMESTAMP: &str = "timestamp";
    /// Search query column.
    pub const QUERY: &str = "query";
    /// Artist identifier column in artist detail tables.
    pub const ARTIST_ID: &str = "artistId";
    /// Multi-valued artist genre column.
    pub const GENRES: &str = "genres";
    /// Primary artist identifier column in listening tables.
    pub const PRIMARY_ARTIST_ID: &str = "artist.id";
    /// Primary artist name column in listening tables.
    pub const PRIMARY_ARTIST_NAME: &str = "artist.name";
    /// All artist names, comma-joined, in listening tables.
    pub const ARTIST_NAMES: &str = "artist.names";
    /// Play time column carried from play-event exports.
    pub const PLAYED_AT: &str = "played_at";
}

/// Default input and output locations, relative to the working directory.
pub mod paths {
    /// Directory holding exports and generated tables.
    pub const DATA_DIR: &str = "data";
    /// Directory holding cached credentials.
    pub const CREDENTIALS_DIR: &str = "credentials";
    /// Takeout watch-history export.
    pub const WATCH_HISTORY: &str = "watch-history.html";
    /// Takeout search-history export.
    pub const SEARCH_HISTORY: &str = "search-history.html";
    /// Directory (under the data dir) holding Spotify exports.
    pub const LISTENING_DIR: &str = "spotify";
    /// File-name prefix of numbered Spotify export files.
    pub const LISTENING_FILE_PREFIX: &str = "StreamingHistory";
    /// Combined video history output.
    pub const VIDEO_OUTPUT: &str = "fullYouTubeHistory.csv";
    /// Category lookup output.
    pub const CATEGORY_OUTPUT: &str = "youtubeCategories.csv";
    /// Search history output.
    pub const SEARCH_OUTPUT: &str = "youtubeSearchHistory.csv";
    /// Listening history output.
    pub const LISTENING_OUTPUT: &str = "spotifyHistory.csv";
    /// Cached Google OAuth token.
    pub const GOOGLE_TOKEN_FILE: &str = "google_token.json";
}

/// Remote endpoints and environment variables.
pub mod remote {
    /// YouTube Data API base URL.
    pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
    /// Spotify Web API base URL.
    pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
    /// Spotify accounts token endpoint.
    pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
    /// Google OAuth token endpoint used when the cache omits one.
    pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
    /// Environment variable holding the Spotify client id.
    pub const ENV_SPOTIFY_CLIENT: &str = "SPOTIFY_CLIENT";
    /// Environment variable holding the Spotify client secret.
    pub const ENV_SPOTIFY_SECRET: &str = "SPOTIFY_SECRET";
    /// Seconds subtracted from token expiry before a token counts as stale.
    pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;
}
