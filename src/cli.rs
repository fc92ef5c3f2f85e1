//! Command-line interface parsing for DDR Finder
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a `StartupConfig`: which data source to query and where the first box is.

use clap::Parser;
use thiserror::Error;

use crate::data::{Bounds, LatLng};
use crate::prefs::Preferences;
use crate::share::{parse_map_link, LinkError};

/// Center used when neither the command line nor preferences give one
pub const DEFAULT_CENTER: LatLng = LatLng::new(47.6062, -122.3321);

/// Span in degrees used when neither the command line nor preferences give one
pub const DEFAULT_SPAN: f64 = 0.4;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// Only one of --lat / --lng was given
    #[error("--lat and --lng must be given together")]
    PartialCenter,

    /// Coordinates outside ±90 / ±180
    #[error("coordinates out of range: {lat}, {lng}")]
    InvalidCenter { lat: f64, lng: f64 },

    /// Span not in (0, 180]
    #[error("invalid span: {0} (expected a value in degrees between 0 and 180)")]
    InvalidSpan(f64),

    /// A --source value was empty
    #[error("data source key must not be empty")]
    EmptySource,

    /// The --link value could not be parsed
    #[error("invalid map link: {0}")]
    InvalidLink(#[from] LinkError),
}

/// DDR Finder - find arcades with Dance Dance Revolution machines
#[derive(Parser, Debug)]
#[command(name = "ddrfinder")]
#[command(about = "Find arcades with DDR machines near a location")]
#[command(version)]
pub struct Cli {
    /// Data source to query (repeat for several sources with --once)
    #[arg(long = "source", value_name = "KEY")]
    pub sources: Vec<String>,

    /// Latitude of the box center
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the box center
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Width and height of the box in degrees
    #[arg(long)]
    pub span: Option<f64>,

    /// Open at a ddrfinder://map deep link
    #[arg(long, value_name = "URL", conflicts_with_all = ["lat", "lng"])]
    pub link: Option<String>,

    /// Print the locations in the box as JSON and exit
    #[arg(long)]
    pub once: bool,

    /// Bypass the cache for the first request
    #[arg(long)]
    pub force: bool,

    /// Override the API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupConfig {
    /// Data sources given on the command line, in order
    pub data_sources: Vec<String>,
    /// Box center, if given
    pub center: Option<LatLng>,
    /// Box span, if given
    pub span: Option<f64>,
    /// Run a single query and exit
    pub once: bool,
    /// Force a network fetch for the first request
    pub force: bool,
    /// API base URL override
    pub api_url: Option<String>,
}

fn validate_span(span: f64) -> Result<f64, CliError> {
    if span > 0.0 && span <= 180.0 {
        Ok(span)
    } else {
        Err(CliError::InvalidSpan(span))
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// A `--link` supplies both center and span; an explicit `--span` still
    /// wins over the link's span.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.sources.iter().any(|s| s.trim().is_empty()) {
            return Err(CliError::EmptySource);
        }

        let (mut center, mut span) = (None, None);

        if let Some(link) = &cli.link {
            let view = parse_map_link(link)?;
            center = Some(view.center);
            span = Some(view.span);
        }

        match (cli.lat, cli.lng) {
            (Some(lat), Some(lng)) => {
                let point = LatLng::new(lat, lng);
                if !point.is_valid() {
                    return Err(CliError::InvalidCenter { lat, lng });
                }
                center = Some(point);
            }
            (None, None) => {}
            _ => return Err(CliError::PartialCenter),
        }

        if let Some(s) = cli.span {
            span = Some(validate_span(s)?);
        }

        Ok(StartupConfig {
            data_sources: cli.sources.iter().map(|s| s.trim().to_string()).collect(),
            center,
            span,
            once: cli.once,
            force: cli.force,
            api_url: cli.api_url.clone(),
        })
    }

    /// The data source to start with: command line, then preferences, then `fallback`
    pub fn primary_source(&self, prefs: Option<&Preferences>, fallback: &str) -> String {
        self.data_sources
            .first()
            .cloned()
            .or_else(|| prefs.map(|p| p.data_source.clone()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// The first box to show: command line, then saved position, then defaults
    pub fn initial_bounds(&self, prefs: Option<&Preferences>) -> Bounds {
        let center = self
            .center
            .or_else(|| prefs.and_then(|p| p.last_center))
            .unwrap_or(DEFAULT_CENTER);

        let (lat_span, lng_span) = match self.span {
            Some(span) => (span, span),
            None => prefs
                .and_then(|p| p.last_span)
                .unwrap_or((DEFAULT_SPAN, DEFAULT_SPAN)),
        };

        Bounds::around(center, lat_span, lng_span)
    }
}
