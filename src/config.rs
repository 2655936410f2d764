use std::path::{Path, PathBuf};

use crate::constants::batch::MAX_IDS_PER_CALL;
use crate::constants::paths::{
    CATEGORY_OUTPUT, CREDENTIALS_DIR, DATA_DIR, GOOGLE_TOKEN_FILE, LISTENING_DIR,
    LISTENING_OUTPUT, SEARCH_HISTORY, SEARCH_OUTPUT, VIDEO_OUTPUT, WATCH_HISTORY,
};
use crate::constants::remote::{SPOTIFY_API_BASE, SPOTIFY_TOKEN_URL, YOUTUBE_API_BASE};
use crate::errors::PipelineError;
use crate::platform::SpotifyCredentials;

/// Input and output locations, relative to the data directory unless absolute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelinePaths {
    /// Takeout watch-history export.
    pub watch_history: PathBuf,
    /// Takeout search-history export.
    pub search_history: PathBuf,
    /// Directory holding `StreamingHistory<N>.json` exports.
    pub listening_dir: PathBuf,
    /// Joined video table.
    pub video_output: PathBuf,
    /// Category lookup table.
    pub category_output: PathBuf,
    /// Parsed search history.
    pub search_output: PathBuf,
    /// Flattened listening history.
    pub listening_output: PathBuf,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self {
            watch_history: PathBuf::from(WATCH_HISTORY),
            search_history: PathBuf::from(SEARCH_HISTORY),
            listening_dir: PathBuf::from(LISTENING_DIR),
            video_output: PathBuf::from(VIDEO_OUTPUT),
            category_output: PathBuf::from(CATEGORY_OUTPUT),
            search_output: PathBuf::from(SEARCH_OUTPUT),
            listening_output: PathBuf::from(LISTENING_OUTPUT),
        }
    }
}

/// API endpoints. Overridable so runs can target a local server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEndpoints {
    /// YouTube Data API v3 base.
    pub youtube_api: String,
    /// Spotify Web API base.
    pub spotify_api: String,
    /// Spotify accounts token endpoint.
    pub spotify_token: String,
}

impl Default for RemoteEndpoints {
    fn default() -> Self {
        Self {
            youtube_api: YOUTUBE_API_BASE.to_string(),
            spotify_api: SPOTIFY_API_BASE.to_string(),
            spotify_token: SPOTIFY_TOKEN_URL.to_string(),
        }
    }
}

/// Top-level run configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Directory inputs are read from and outputs written to.
    pub data_dir: PathBuf,
    /// Directory holding the cached Google token.
    pub credentials_dir: PathBuf,
    /// File names under `data_dir`.
    pub paths: PipelinePaths,
    /// Maximum ids per lookup call.
    pub max_batch: usize,
    /// Re-parse inputs even when a cached output exists.
    pub refresh: bool,
    /// Spotify application credentials; listening rows stay unenriched without them.
    pub spotify: Option<SpotifyCredentials>,
    /// API endpoints.
    pub endpoints: RemoteEndpoints,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_DIR),
            credentials_dir: PathBuf::from(CREDENTIALS_DIR),
            paths: PipelinePaths::default(),
            max_batch: MAX_IDS_PER_CALL,
            refresh: false,
            spotify: None,
            endpoints: RemoteEndpoints::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults plus Spotify credentials from the environment, when set.
    pub fn from_env() -> Self {
        Self::default().with_spotify(SpotifyCredentials::from_env())
    }

    /// Override the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Override the credentials directory.
    pub fn with_credentials_dir(mut self, credentials_dir: impl Into<PathBuf>) -> Self {
        self.credentials_dir = credentials_dir.into();
        self
    }

    /// Override the per-call id limit.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    /// Toggle cache bypass.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Set or clear Spotify credentials.
    pub fn with_spotify(mut self, spotify: Option<SpotifyCredentials>) -> Self {
        self.spotify = spotify;
        self
    }

    /// Reject settings no run can succeed with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_batch == 0 || self.max_batch > MAX_IDS_PER_CALL {
            return Err(PipelineError::Configuration(format!(
                "max_batch must be between 1 and {MAX_IDS_PER_CALL}, got {}",
                self.max_batch
            )));
        }
        Ok(())
    }

    /// Resolve `relative` against the data directory.
    pub fn data_path(&self, relative: &Path) -> PathBuf {
        self.data_dir.join(relative)
    }

    /// Watch-history export path.
    pub fn watch_history_path(&self) -> PathBuf {
        self.data_path(&self.paths.watch_history)
    }

    /// Search-history export path.
    pub fn search_history_path(&self) -> PathBuf {
        self.data_path(&self.paths.search_history)
    }

    /// Listening export directory.
    pub fn listening_dir(&self) -> PathBuf {
        self.data_path(&self.paths.listening_dir)
    }

    /// Joined video table path.
    pub fn video_output_path(&self) -> PathBuf {
        self.data_path(&self.paths.video_output)
    }

    /// Category table path.
    pub fn category_output_path(&self) -> PathBuf {
        self.data_path(&self.paths.category_output)
    }

    /// Search table path.
    pub fn search_output_path(&self) -> PathBuf {
        self.data_path(&self.paths.search_output)
    }

    /// Listening table path.
    pub fn listening_output_path(&self) -> PathBuf {
        self.data_path(&self.paths.listening_output)
    }

    /// Cached Google token path.
    pub fn google_token_path(&self) -> PathBuf {
        self.credentials_dir.join(GOOGLE_TOKEN_FILE)
    }
}
