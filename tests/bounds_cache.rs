//! Integration tests for BoundsCache against an in-memory fetcher
//!
//! Covers coverage decisions across sources, forced reloads, small-box
//! growth, deduplication across regions, and concurrent callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ddrfinder::cache::{BoundsCache, SMALL_BOX_MARGIN};
use ddrfinder::data::{
    ApiError, Bounds, FetchedPayload, LatLng, LocationRecord, NetworkFetcher, QueryBox,
    SourceRecord,
};

/// Serves canned locations per source, filtered to the requested box
#[derive(Default)]
struct MockFetcher {
    locations: HashMap<String, Vec<LocationRecord>>,
    failure: Option<ApiError>,
    calls: AtomicUsize,
    queries: Mutex<Vec<QueryBox>>,
}

impl MockFetcher {
    fn with_locations(source: &str, locations: Vec<LocationRecord>) -> Self {
        let mut fetcher = Self::default();
        fetcher.locations.insert(source.to_string(), locations);
        fetcher
    }

    fn failing(error: ApiError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queries(&self) -> Vec<QueryBox> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkFetcher for MockFetcher {
    async fn fetch(&self, query: &QueryBox) -> Result<FetchedPayload, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        tokio::task::yield_now().await;

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let locations: Vec<LocationRecord> = self
            .locations
            .get(&query.data_source)
            .map(|all| {
                all.iter()
                    .filter(|l| query.bounds.contains(l.position()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(FetchedPayload {
            sources: vec![source(&query.data_source)],
            locations,
        })
    }
}

fn location(id: i64, source: &str, lat: f64, lng: f64) -> LocationRecord {
    LocationRecord {
        id,
        source: source.to_string(),
        source_id: format!("s{}", id),
        name: format!("Arcade {}", id),
        city: "Testville".to_string(),
        lat,
        lng,
        has_machine: Some(true),
    }
}

fn source(key: &str) -> SourceRecord {
    SourceRecord {
        key: key.to_string(),
        name: key.to_uppercase(),
        info_url: String::new(),
        has_machine: true,
    }
}

fn ids(locations: &[LocationRecord]) -> Vec<i64> {
    let mut ids: Vec<i64> = locations.iter().map(|l| l.id).collect();
    ids.sort_unstable();
    ids
}

fn seeded_cache() -> BoundsCache<MockFetcher> {
    BoundsCache::new(MockFetcher::with_locations(
        "ziv",
        vec![
            location(1, "ziv", 15.0, 15.0),
            location(2, "ziv", 11.0, 11.0),
            location(3, "ziv", 19.0, 13.0),
        ],
    ))
}

#[tokio::test]
async fn test_contained_box_is_served_from_memory() {
    let cache = seeded_cache();
    let seed = cache
        .request_locations(Bounds::from_corners(10.0, 10.0, 20.0, 20.0), "ziv", false)
        .await
        .unwrap();
    assert_eq!(ids(&seed.locations), vec![1, 2, 3]);
    assert_eq!(cache.fetcher().calls(), 1);

    let result = cache
        .request_locations(Bounds::from_corners(12.0, 12.0, 18.0, 18.0), "ziv", false)
        .await
        .unwrap();

    assert!(result.from_cache);
    assert_eq!(ids(&result.locations), vec![1]);
    assert_eq!(result.sources, vec![source("ziv")]);
    assert_eq!(cache.fetcher().calls(), 1);
    assert_eq!(cache.region_count(), 1);
}

#[tokio::test]
async fn test_other_source_on_same_box_fetches() {
    let cache = seeded_cache();
    let bounds = Bounds::from_corners(10.0, 10.0, 20.0, 20.0);
    cache.request_locations(bounds, "ziv", false).await.unwrap();

    let result = cache.request_locations(bounds, "other", false).await.unwrap();

    assert!(!result.from_cache);
    assert_eq!(cache.fetcher().calls(), 2);
    assert_eq!(cache.fetcher().queries()[1].data_source, "other");
    assert_eq!(cache.region_count(), 2);
}

#[tokio::test]
async fn test_force_always_fetches() {
    let cache = seeded_cache();
    let bounds = Bounds::from_corners(10.0, 10.0, 20.0, 20.0);

    for _ in 0..3 {
        let result = cache.request_locations(bounds, "ziv", true).await.unwrap();
        assert!(!result.from_cache);
    }

    assert_eq!(cache.fetcher().calls(), 3);
    assert_eq!(cache.region_count(), 3);
}

#[tokio::test]
async fn test_small_box_grows_before_fetch() {
    let cache = seeded_cache();
    let small = Bounds::from_corners(15.0, 15.0, 15.2, 15.3);

    cache.request_locations(small, "ziv", false).await.unwrap();

    let sent = cache.fetcher().queries()[0].bounds;
    assert!((sent.southwest.lat - (15.0 - SMALL_BOX_MARGIN)).abs() < 1e-9);
    assert!((sent.southwest.lng - (15.0 - SMALL_BOX_MARGIN)).abs() < 1e-9);
    assert!((sent.northeast.lat - (15.2 + SMALL_BOX_MARGIN)).abs() < 1e-9);
    assert!((sent.northeast.lng - (15.3 + SMALL_BOX_MARGIN)).abs() < 1e-9);

    // A short pan stays inside the grown region
    let panned = Bounds::from_corners(15.05, 15.05, 15.25, 15.35);
    let result = cache.request_locations(panned, "ziv", false).await.unwrap();
    assert!(result.from_cache);
    assert_eq!(cache.fetcher().calls(), 1);
}

#[tokio::test]
async fn test_box_at_threshold_is_sent_unchanged() {
    let cache = seeded_cache();
    let bounds = Bounds::from_corners(15.0, 15.0, 15.5, 15.2);

    cache.request_locations(bounds, "ziv", false).await.unwrap();

    assert_eq!(cache.fetcher().queries()[0].bounds, bounds);
}

#[tokio::test]
async fn test_small_box_at_antimeridian_wraps() {
    let cache = BoundsCache::new(MockFetcher::with_locations(
        "ziv",
        vec![
            location(1, "ziv", 0.0, 179.97),
            location(2, "ziv", 0.01, -179.97),
        ],
    ));
    let east = Bounds::around(LatLng::new(0.0, 179.95), 0.1, 0.1);

    cache.request_locations(east, "ziv", false).await.unwrap();

    let sent = cache.fetcher().queries()[0].bounds;
    assert!(sent.northeast.is_valid());
    assert!(sent.southwest.is_valid());
    assert!(sent.crosses_antimeridian());

    // The grown margin reaches across the meridian
    let west = Bounds::around(LatLng::new(0.0, -179.95), 0.1, 0.1);
    assert!(cache.covers(&west, "ziv"));
    let result = cache.request_locations(west, "ziv", false).await.unwrap();
    assert!(result.from_cache);
    assert_eq!(ids(&result.locations), vec![2]);
    assert_eq!(cache.fetcher().calls(), 1);
}

#[tokio::test]
async fn test_overlapping_regions_are_merged_without_duplicates() {
    let cache = BoundsCache::new(MockFetcher::with_locations(
        "ziv",
        vec![
            location(1, "ziv", 5.0, 5.0),
            location(2, "ziv", 12.0, 12.0),
            location(3, "ziv", 18.0, 5.0),
        ],
    ));
    cache
        .request_locations(Bounds::from_corners(0.0, 0.0, 15.0, 15.0), "ziv", false)
        .await
        .unwrap();
    cache
        .request_locations(Bounds::from_corners(10.0, 0.0, 20.0, 15.0), "ziv", false)
        .await
        .unwrap();
    assert_eq!(cache.fetcher().calls(), 2);

    // Spans both regions; location 2 was returned by each fetch
    let result = cache
        .request_locations(Bounds::from_corners(1.0, 1.0, 19.0, 14.0), "ziv", false)
        .await
        .unwrap();

    assert!(result.from_cache);
    assert_eq!(ids(&result.locations), vec![1, 2, 3]);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(cache.fetcher().calls(), 2);
}

#[tokio::test]
async fn test_uncovered_corner_misses() {
    let cache = seeded_cache();
    cache
        .request_locations(Bounds::from_corners(10.0, 10.0, 20.0, 20.0), "ziv", false)
        .await
        .unwrap();

    assert!(!cache.covers(&Bounds::from_corners(15.0, 15.0, 25.0, 18.0), "ziv"));
    let result = cache
        .request_locations(Bounds::from_corners(15.0, 15.0, 25.0, 18.0), "ziv", false)
        .await
        .unwrap();

    assert!(!result.from_cache);
    assert_eq!(cache.fetcher().calls(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_all_complete() {
    let cache = seeded_cache();
    let boxes = [
        Bounds::from_corners(10.0, 10.0, 20.0, 20.0),
        Bounds::from_corners(30.0, 30.0, 40.0, 40.0),
        Bounds::from_corners(-10.0, -10.0, 0.0, 0.0),
    ];

    let results = futures::future::join_all(
        boxes
            .iter()
            .map(|bounds| cache.request_locations(*bounds, "ziv", false)),
    )
    .await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(cache.fetcher().calls(), 3);
    assert_eq!(cache.region_count(), 3);
    for bounds in &boxes {
        assert!(cache.covers(bounds, "ziv"));
    }
}

#[tokio::test]
async fn test_fetch_error_is_returned_and_not_cached() {
    let cache = BoundsCache::new(MockFetcher::failing(ApiError::OversizedBox));
    let bounds = Bounds::from_corners(0.0, 0.0, 60.0, 60.0);

    let err = cache.request_locations(bounds, "ziv", false).await.unwrap_err();

    assert_eq!(err, ApiError::OversizedBox);
    assert_eq!(cache.region_count(), 0);
    assert!(!cache.covers(&bounds, "ziv"));
}

#[tokio::test]
async fn test_no_results_is_not_cached() {
    let cache = BoundsCache::new(MockFetcher::failing(ApiError::NoResults));
    let bounds = Bounds::from_corners(0.0, 0.0, 1.0, 1.0);

    for _ in 0..2 {
        let err = cache.request_locations(bounds, "ziv", false).await.unwrap_err();
        assert!(err.is_soft());
    }

    assert_eq!(cache.fetcher().calls(), 2);
    assert_eq!(cache.region_count(), 0);
}

#[tokio::test]
async fn test_empty_source_is_rejected_without_fetching() {
    let cache = seeded_cache();

    let err = cache
        .request_locations(Bounds::from_corners(10.0, 10.0, 20.0, 20.0), "", false)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::UnknownDataSource { .. }));
    assert_eq!(cache.fetcher().calls(), 0);
}
