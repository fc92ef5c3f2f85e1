//! Core data models for DDR Finder
//!
//! This module contains the records returned by the locations API: arcade
//! locations, the data sources that list them, and the geographic boxes used
//! to query them.

pub mod api;
pub mod bounds;

pub use api::{ApiClient, ApiError, FetchedPayload, NetworkFetcher};
pub use bounds::{Bounds, LatLng};

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An arcade location
///
/// Identity is the integer `id`: two records with the same id compare equal
/// and hash identically even if other fields differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Unique identifier across all sources
    pub id: i64,
    /// Key of the data source that listed this location
    #[serde(rename = "src")]
    pub source: String,
    /// Identifier of the location within its source
    #[serde(rename = "sid")]
    pub source_id: String,
    /// Arcade name
    pub name: String,
    /// City the arcade is in
    #[serde(default)]
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    /// Whether the arcade has a DDR machine, if the source reports it
    #[serde(rename = "hasDDR", default)]
    pub has_machine: Option<bool>,
}

impl PartialEq for LocationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LocationRecord {}

impl Hash for LocationRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl LocationRecord {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Machine availability as shown to the user
    ///
    /// Sources that do not track machines always yield `Unknown`, whatever the
    /// per-location flag says.
    pub fn machine_status(&self, source: Option<&SourceRecord>) -> MachineStatus {
        if let Some(source) = source {
            if !source.has_machine {
                return MachineStatus::Unknown;
            }
        }
        match self.has_machine {
            Some(true) => MachineStatus::Available,
            Some(false) => MachineStatus::Unavailable,
            None => MachineStatus::Unknown,
        }
    }
}

/// Machine availability at a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Available,
    Unavailable,
    Unknown,
}

/// Metadata for a data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Short key used in queries (e.g. "ziv")
    #[serde(rename = "shortName")]
    pub key: String,
    /// Display name
    pub name: String,
    /// Info page template with `${id}` and `${sid}` placeholders
    #[serde(rename = "infoURL", default)]
    pub info_url: String,
    /// Whether per-location machine flags are meaningful for this source
    #[serde(rename = "hasDDR", default)]
    pub has_machine: bool,
}

impl SourceRecord {
    /// Expands the info URL template for a location
    ///
    /// Returns `None` when the source has no info page.
    pub fn info_url_for(&self, location: &LocationRecord) -> Option<String> {
        if self.info_url.is_empty() {
            return None;
        }
        Some(
            self.info_url
                .replace("${id}", &location.id.to_string())
                .replace("${sid}", &location.source_id),
        )
    }
}

/// A request rectangle tagged with the data source it is asked of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBox {
    pub bounds: Bounds,
    pub data_source: String,
}

impl QueryBox {
    pub fn new(bounds: Bounds, data_source: impl Into<String>) -> Self {
        Self {
            bounds,
            data_source: data_source.into(),
        }
    }
}

/// One completed fetch, kept by the bounds cache for the life of the process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedRegion {
    /// The box that was actually requested from the server
    pub bounds: Bounds,
    pub data_source: String,
    pub locations: Vec<LocationRecord>,
    pub sources: Vec<SourceRecord>,
    /// When the server answered
    pub fetched_at: DateTime<Utc>,
}

/// Answer to a locations request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsResult {
    /// Box the result covers
    pub bounds: Bounds,
    pub data_source: String,
    pub sources: Vec<SourceRecord>,
    pub locations: Vec<LocationRecord>,
    /// True when the result was assembled from cached regions
    pub from_cache: bool,
}

impl LocationsResult {
    /// Looks up the source record for a location's source key
    pub fn source_for(&self, location: &LocationRecord) -> Option<&SourceRecord> {
        self.sources.iter().find(|s| s.key == location.source)
    }
}

impl From<&FetchedRegion> for LocationsResult {
    fn from(region: &FetchedRegion) -> Self {
        Self {
            bounds: region.bounds,
            data_source: region.data_source.clone(),
            sources: region.sources.clone(),
            locations: region.locations.clone(),
            from_cache: false,
        }
    }
}
