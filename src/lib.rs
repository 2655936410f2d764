#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runner behind the `activity_tables` binary.
pub mod app;
/// Join steps that assemble detail, tag, history, and category tables.
pub mod assemble;
/// Fixed-size windowing of identifier lists for bulk lookups.
pub mod batch;
/// Run configuration.
pub mod config;
/// Centralized constants: limits, selectors, column names, paths, endpoints.
pub mod constants;
/// Takeout HTML history parsing.
pub mod history;
/// Spotify streaming-history exports.
pub mod listening;
/// Declarative response → table mappings.
pub mod mapping;
/// Multi-valued attribute normalization.
pub mod normalize;
/// Pipeline runs and their reports.
pub mod pipeline;
/// Platform clients, transports, and credential providers.
pub mod platform;
/// Tabular model shared by every stage.
pub mod table;
/// Filesystem discovery and CSV persistence.
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

mod errors;

pub use assemble::Enrichment;
pub use batch::{BatchWindow, fetch_all, windows};
pub use config::{PipelineConfig, PipelinePaths, RemoteEndpoints};
pub use errors::PipelineError;
pub use history::{HistoryEvent, HistoryKind, ParsedHistory};
pub use mapping::{FieldMapping, ResponseSchema};
pub use pipeline::{ListeningReport, SearchReport, VideoReport, VideoTables};
pub use platform::{
    AccessToken, CredentialProvider, GoogleTokenCache, HttpJsonClient, JsonTransport,
    SpotifyClient, SpotifyClientCredentials, SpotifyCredentials, StaticToken, YouTubeClient,
};
pub use table::Table;
pub use types::{ColumnName, FieldPath, Platform, RecordId};
