use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::PipelineConfig;
use crate::constants::paths::{CREDENTIALS_DIR, DATA_DIR};
use crate::pipeline::{run_listening_pipeline, run_search_pipeline, run_video_pipeline};
use crate::platform::{
    GoogleTokenCache, HttpJsonClient, SpotifyClient, SpotifyClientCredentials, YouTubeClient,
};

/// Pipelines the binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PipelineKind {
    /// Watch history joined with video and category details.
    Video,
    /// Search history.
    Search,
    /// Spotify listening history.
    Listening,
}

#[derive(Debug, Parser)]
#[command(
    name = "activity_tables",
    disable_help_subcommand = true,
    about = "Build CSV tables from YouTube and Spotify activity exports",
    long_about = "Parse Takeout watch/search history and Spotify streaming exports, enrich them with platform lookups, and write flat CSV tables.",
    after_help = "Spotify enrichment needs SPOTIFY_CLIENT and SPOTIFY_SECRET. Set RUST_LOG to control log output."
)]
struct ActivityTablesCli {
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        default_value = DATA_DIR,
        help = "Directory holding the exports; outputs are written next to them"
    )]
    data_dir: PathBuf,
    #[arg(
        long = "credentials-dir",
        value_name = "DIR",
        default_value = CREDENTIALS_DIR,
        help = "Directory holding the cached Google token"
    )]
    credentials_dir: PathBuf,
    #[arg(long, help = "Re-parse inputs even when a cached output exists")]
    refresh: bool,
    #[arg(
        long = "run",
        value_enum,
        value_name = "PIPELINE",
        help = "Pipeline to run, repeat as needed (default: all)"
    )]
    runs: Vec<PipelineKind>,
}

impl ActivityTablesCli {
    fn selected(&self) -> Vec<PipelineKind> {
        if self.runs.is_empty() {
            return vec![
                PipelineKind::Video,
                PipelineKind::Search,
                PipelineKind::Listening,
            ];
        }
        let mut selected = Vec::new();
        for kind in &self.runs {
            if !selected.contains(kind) {
                selected.push(*kind);
            }
        }
        selected
    }
}

/// Parse `args_iter` (without the program name) and run the selected pipelines.
pub fn run<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<ActivityTablesCli, _>(
        std::iter::once("activity_tables".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = PipelineConfig::from_env()
        .with_data_dir(cli.data_dir.clone())
        .with_credentials_dir(cli.credentials_dir.clone())
        .with_refresh(cli.refresh);
    config.validate()?;

    println!("=== activity tables ===");
    println!("data dir: {}", config.data_dir.display());
    for kind in cli.selected() {
        match kind {
            PipelineKind::Video => {
                let provider = GoogleTokenCache::new(config.google_token_path());
                let transport = HttpJsonClient::connect(&config.endpoints.youtube_api, &provider)?;
                let report = run_video_pipeline(&YouTubeClient::new(transport), &config)?;
                println!("{report}");
            }
            PipelineKind::Search => {
                let report = run_search_pipeline(&config)?;
                println!("{report}");
            }
            PipelineKind::Listening => {
                let client = match &config.spotify {
                    Some(credentials) => {
                        let provider = SpotifyClientCredentials::new(credentials.clone())
                            .with_token_url(&config.endpoints.spotify_token);
                        let transport =
                            HttpJsonClient::connect(&config.endpoints.spotify_api, &provider)?;
                        Some(SpotifyClient::new(transport))
                    }
                    None => None,
                };
                let report = run_listening_pipeline(client.as_ref(), &config)?;
                println!("{report}");
            }
        }
    }

    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
