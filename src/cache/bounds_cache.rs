//! Bounds-aware result cache
//!
//! Keeps every region fetched from the network, tagged with its data source,
//! and answers a new query from memory when the query's four corners each fall
//! inside some cached region of the same source. Only whole server responses are
//! ever stored; nothing is evicted.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::data::{
    ApiError, Bounds, FetchedRegion, LocationsResult, NetworkFetcher, QueryBox,
};

/// Boxes with both spans under this many degrees are enlarged before fetching
pub const SMALL_BOX_SPAN: f64 = 0.5;

/// Degrees added on each side of a small box before fetching
pub const SMALL_BOX_MARGIN: f64 = 0.125;

/// Returns the box that should be requested from the network for `bounds`
///
/// Small boxes are grown so that subsequent pans and zooms are more likely to
/// be answered from the cache.
pub fn fetch_bounds(bounds: &Bounds) -> Bounds {
    if bounds.lat_span() < SMALL_BOX_SPAN && bounds.lng_span() < SMALL_BOX_SPAN {
        bounds.expanded(SMALL_BOX_MARGIN)
    } else {
        *bounds
    }
}

/// Cache of fetched regions in front of a [`NetworkFetcher`]
///
/// Regions live in an append-only arena behind a single mutex. The lock is
/// taken for the coverage check and for the append, never across a fetch.
#[derive(Debug)]
pub struct BoundsCache<F> {
    fetcher: F,
    regions: Mutex<Vec<Arc<FetchedRegion>>>,
}

impl<F: NetworkFetcher> BoundsCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            regions: Mutex::new(Vec::new()),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Number of regions fetched so far
    pub fn region_count(&self) -> usize {
        self.lock().len()
    }

    /// Snapshot of every cached region, in fetch-completion order
    pub fn regions(&self) -> Vec<Arc<FetchedRegion>> {
        self.lock().clone()
    }

    /// Whether a request for `bounds` on `data_source` would be a cache hit
    pub fn covers(&self, bounds: &Bounds, data_source: &str) -> bool {
        let regions = self.lock();
        qualifying_regions(&regions, bounds, data_source).is_some()
    }

    /// Returns the locations inside `bounds` for `data_source`
    ///
    /// Served from memory when the cached regions cover all four corners of
    /// `bounds` and `force` is false. Otherwise the fetcher is called once and,
    /// on success, the fetched region is appended to the cache before being
    /// returned. Fetch errors are returned unchanged.
    pub async fn request_locations(
        &self,
        bounds: Bounds,
        data_source: &str,
        force: bool,
    ) -> Result<LocationsResult, ApiError> {
        if data_source.is_empty() {
            return Err(ApiError::UnknownDataSource {
                data_source: String::new(),
            });
        }

        if !force {
            if let Some(result) = self.lookup(&bounds, data_source) {
                debug!(
                    source = data_source,
                    locations = result.locations.len(),
                    "bounds cache hit"
                );
                return Ok(result);
            }
        }

        let query = QueryBox::new(fetch_bounds(&bounds), data_source);
        debug!(
            source = data_source,
            force,
            lat_span = query.bounds.lat_span(),
            lng_span = query.bounds.lng_span(),
            "bounds cache miss, fetching"
        );

        let payload = self.fetcher.fetch(&query).await?;

        let region = Arc::new(FetchedRegion {
            bounds: query.bounds,
            data_source: query.data_source,
            locations: payload.locations,
            sources: payload.sources,
            fetched_at: Utc::now(),
        });
        let result = LocationsResult::from(region.as_ref());

        let count = {
            let mut regions = self.lock();
            regions.push(region);
            regions.len()
        };
        debug!(source = data_source, regions = count, "region cached");

        Ok(result)
    }

    /// Builds a result from cached regions if they cover `bounds`
    fn lookup(&self, bounds: &Bounds, data_source: &str) -> Option<LocationsResult> {
        let regions = self.lock();
        let indices = qualifying_regions(&regions, bounds, data_source)?;

        let mut seen_sources = HashSet::new();
        let mut seen_locations = HashSet::new();
        let mut sources = Vec::new();
        let mut locations = Vec::new();

        for region in indices.into_iter().map(|i| &regions[i]) {
            for source in &region.sources {
                if seen_sources.insert(source.key.as_str()) {
                    sources.push(source.clone());
                }
            }
            for location in &region.locations {
                if bounds.contains(location.position()) && seen_locations.insert(location.id) {
                    locations.push(location.clone());
                }
            }
        }

        Some(LocationsResult {
            bounds: *bounds,
            data_source: data_source.to_string(),
            sources,
            locations,
            from_cache: true,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<FetchedRegion>>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Indices of the regions of `data_source` that contain at least one corner of
/// `bounds`, or `None` if some corner is not contained in any of them
fn qualifying_regions(
    regions: &[Arc<FetchedRegion>],
    bounds: &Bounds,
    data_source: &str,
) -> Option<Vec<usize>> {
    let corners = bounds.corners();
    let mut covered = [false; 4];
    let mut indices = Vec::new();

    for (index, region) in regions.iter().enumerate() {
        if region.data_source != data_source {
            continue;
        }
        let mut contains_any = false;
        for (corner, covered) in corners.iter().zip(covered.iter_mut()) {
            if region.bounds.contains(*corner) {
                *covered = true;
                contains_any = true;
            }
        }
        if contains_any {
            indices.push(index);
        }
    }

    covered.iter().all(|c| *c).then_some(indices)
}
