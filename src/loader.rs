//! Background location loading
//!
//! Runs bounds-cache requests on tokio tasks and hands the results back to a
//! single-threaded consumer through a channel. The consumer sees four lifecycle
//! callbacks per request: pre-load when it is issued, then success or error,
//! and finally finish.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::BoundsCache;
use crate::data::{ApiError, LocationsResult, NetworkFetcher, QueryBox};

/// Identifies one call to [`LocationLoader::request`]
pub type RequestId = u64;

/// Receives the lifecycle of each request
pub trait LoadObserver {
    /// Called synchronously when the request is issued
    fn on_pre_load(&mut self, request: RequestId, query: &QueryBox);

    fn on_success(&mut self, request: RequestId, result: LocationsResult);

    fn on_error(&mut self, request: RequestId, error: ApiError);

    /// Always the last callback for a request
    fn on_finish(&mut self, request: RequestId);
}

/// A finished request travelling back from its task
#[derive(Debug)]
struct Completion {
    request: RequestId,
    result: Result<LocationsResult, ApiError>,
}

/// Issues cache requests in the background and dispatches their results
pub struct LocationLoader<F> {
    cache: Arc<BoundsCache<F>>,
    sender: mpsc::Sender<Completion>,
    receiver: mpsc::Receiver<Completion>,
    pending: HashMap<RequestId, JoinHandle<()>>,
    next_id: RequestId,
}

impl<F: NetworkFetcher + 'static> LocationLoader<F> {
    pub fn new(cache: Arc<BoundsCache<F>>) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        Self {
            cache,
            sender,
            receiver,
            pending: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn cache(&self) -> &Arc<BoundsCache<F>> {
        &self.cache
    }

    /// Number of requests issued but not yet dispatched
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Starts a request on a background task
    ///
    /// `on_pre_load` runs before this returns. Overlapping requests are not
    /// deduplicated; each one completes on its own.
    pub fn request(
        &mut self,
        query: QueryBox,
        force: bool,
        observer: &mut impl LoadObserver,
    ) -> RequestId {
        let request = self.next_id;
        self.next_id += 1;

        observer.on_pre_load(request, &query);
        debug!(request, source = %query.data_source, force, "location request issued");

        let cache = Arc::clone(&self.cache);
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            let result = cache
                .request_locations(query.bounds, &query.data_source, force)
                .await;
            // The receiver only goes away when the loader is dropped
            let _ = sender.send(Completion { request, result }).await;
        });
        self.pending.insert(request, handle);

        request
    }

    /// Dispatches every completed request without blocking
    ///
    /// Returns the number of requests dispatched.
    pub fn poll(&mut self, observer: &mut impl LoadObserver) -> usize {
        let mut dispatched = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            if self.dispatch(completion, observer) {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Waits for the next request to complete and dispatches it
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn wait(&mut self, observer: &mut impl LoadObserver) -> Option<RequestId> {
        while !self.pending.is_empty() {
            let completion = self.receiver.recv().await?;
            let request = completion.request;
            if self.dispatch(completion, observer) {
                return Some(request);
            }
        }
        None
    }

    /// Aborts every in-flight request
    ///
    /// Each aborted request still receives `on_finish`. A fetch that already
    /// completed may have been appended to the cache.
    pub fn cancel_pending(&mut self, observer: &mut impl LoadObserver) -> usize {
        let mut cancelled: Vec<RequestId> = self.pending.keys().copied().collect();
        cancelled.sort_unstable();

        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
        for request in &cancelled {
            observer.on_finish(*request);
        }
        if !cancelled.is_empty() {
            debug!(count = cancelled.len(), "location requests cancelled");
        }
        cancelled.len()
    }

    /// Delivers one completion, skipping requests that were cancelled
    fn dispatch(&mut self, completion: Completion, observer: &mut impl LoadObserver) -> bool {
        if self.pending.remove(&completion.request).is_none() {
            return false;
        }

        match completion.result {
            Ok(result) => observer.on_success(completion.request, result),
            Err(error) => observer.on_error(completion.request, error),
        }
        observer.on_finish(completion.request);
        true
    }
}
