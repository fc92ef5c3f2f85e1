//! Application state management for DDR Finder
//!
//! This module contains the viewer state, handling keyboard input, turning
//! pans and zooms into location requests, and applying request results as they
//! arrive from the loader.

use crossterm::event::{KeyCode, KeyEvent};

use ddrfinder::data::{
    ApiError, Bounds, LatLng, LocationRecord, LocationsResult, QueryBox, SourceRecord,
};
use ddrfinder::loader::{LoadObserver, RequestId};
use ddrfinder::prefs::Preferences;
use ddrfinder::share::map_link;

/// Largest latitude span the viewer zooms out to
const MAX_LAT_SPAN: f64 = 90.0;

/// Smallest span the viewer zooms in to
const MIN_SPAN: f64 = 0.01;

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for the first request to finish
    Loading,
    /// List of locations in the current box
    LocationList,
    /// Detail view for the location with this id
    LocationDetail(i64),
}

/// Outcome shown in the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading,
    Loaded { count: usize, from_cache: bool },
    Info(String),
    Error(String),
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Box currently being viewed
    pub bounds: Bounds,
    /// Data source being queried
    pub data_source: String,
    /// Every source record seen so far, in first-seen order
    pub known_sources: Vec<SourceRecord>,
    /// Latest applied result
    pub result: Option<LocationsResult>,
    /// Index of the selected location in `visible_locations`
    pub selected_index: usize,
    /// Status line content
    pub status: Status,
    /// Whether the latest request is still running
    pub loading: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Request waiting to be issued by the main loop, with its force flag
    pending_request: Option<bool>,
    /// Most recently issued request; older results are ignored
    latest_request: Option<RequestId>,
}

impl App {
    /// Creates a new App viewing `bounds` on `data_source`
    ///
    /// The first request is queued immediately.
    pub fn new(bounds: Bounds, data_source: impl Into<String>, force: bool) -> Self {
        Self {
            state: AppState::Loading,
            bounds,
            data_source: data_source.into(),
            known_sources: Vec::new(),
            result: None,
            selected_index: 0,
            status: Status::Loading,
            loading: false,
            should_quit: false,
            show_help: false,
            pending_request: Some(force),
            latest_request: None,
        }
    }

    /// Takes the queued request, if any
    pub fn take_request(&mut self) -> Option<(QueryBox, bool)> {
        let force = self.pending_request.take()?;
        Some((QueryBox::new(self.bounds, self.data_source.clone()), force))
    }

    /// Locations of the latest result sorted by distance from the box center
    pub fn visible_locations(&self) -> Vec<&LocationRecord> {
        let Some(result) = &self.result else {
            return Vec::new();
        };
        let center = self.bounds.center();
        let mut locations: Vec<&LocationRecord> = result.locations.iter().collect();
        locations.sort_by(|a, b| {
            center
                .distance_km(a.position())
                .total_cmp(&center.distance_km(b.position()))
                .then_with(|| a.id.cmp(&b.id))
        });
        locations
    }

    /// Returns the currently selected location, if any
    pub fn selected_location(&self) -> Option<&LocationRecord> {
        self.visible_locations().get(self.selected_index).copied()
    }

    /// Looks up a location of the latest result by id
    pub fn location_by_id(&self, id: i64) -> Option<&LocationRecord> {
        self.result
            .as_ref()?
            .locations
            .iter()
            .find(|l| l.id == id)
    }

    /// Looks up the source record for a location, from the latest result
    /// first and then from every source seen so far
    pub fn source_for(&self, location: &LocationRecord) -> Option<&SourceRecord> {
        self.result
            .as_ref()
            .and_then(|r| r.source_for(location))
            .or_else(|| self.known_sources.iter().find(|s| s.key == location.source))
    }

    /// Preferences reflecting the current view
    pub fn preferences(&self) -> Preferences {
        Preferences {
            data_source: self.data_source.clone(),
            last_center: Some(self.bounds.center()),
            last_span: Some((self.bounds.lat_span(), self.bounds.lng_span())),
            saved_at: None,
        }
    }

    /// Handles a key event, updating application state
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if self.show_help {
            if matches!(key_event.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        match &self.state {
            AppState::Loading | AppState::LocationList => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.move_selection_up();
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.move_selection_down();
                }
                KeyCode::Enter => {
                    if let Some(id) = self.selected_location().map(|l| l.id) {
                        self.state = AppState::LocationDetail(id);
                    }
                }
                _ => self.handle_map_key(key_event.code),
            },
            AppState::LocationDetail(_) => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Backspace => {
                    self.state = AppState::LocationList;
                }
                _ => self.handle_map_key(key_event.code),
            },
        }
    }

    /// Keys shared by every view: moving the box, reloading, help
    fn handle_map_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('w') => self.pan(0.25, 0.0),
            KeyCode::Char('s') => self.pan(-0.25, 0.0),
            KeyCode::Char('a') => self.pan(0.0, -0.25),
            KeyCode::Char('d') => self.pan(0.0, 0.25),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(0.5),
            KeyCode::Char('-') => self.zoom(2.0),
            KeyCode::Char('r') => {
                self.pending_request = Some(true);
            }
            KeyCode::Char('n') => self.cycle_source(),
            KeyCode::Char('l') => {
                let link = map_link(self.bounds.center(), self.bounds.lat_span());
                self.status = Status::Info(format!("Link: {}", link));
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// Moves the box by fractions of its spans and queues a cached request
    fn pan(&mut self, lat_fraction: f64, lng_fraction: f64) {
        let d_lat = self.bounds.lat_span() * lat_fraction;
        let d_lng = self.bounds.lng_span() * lng_fraction;
        self.bounds = self.bounds.translated(d_lat, d_lng);
        self.leave_detail();
        self.queue_request();
    }

    /// Scales the box around its center and queues a cached request
    fn zoom(&mut self, factor: f64) {
        let new_span = self.bounds.lat_span() * factor;
        if !(MIN_SPAN..=MAX_LAT_SPAN).contains(&new_span) {
            return;
        }
        self.bounds = self.bounds.scaled(factor);
        self.leave_detail();
        self.queue_request();
    }

    /// Switches to the next known data source
    fn cycle_source(&mut self) {
        if self.known_sources.is_empty() {
            return;
        }
        let next = match self
            .known_sources
            .iter()
            .position(|s| s.key == self.data_source)
        {
            Some(i) => (i + 1) % self.known_sources.len(),
            None => 0,
        };
        let key = self.known_sources[next].key.clone();
        if key != self.data_source {
            self.data_source = key;
            self.selected_index = 0;
            self.leave_detail();
            self.queue_request();
        }
    }

    fn queue_request(&mut self) {
        // A pending forced reload stays forced
        let force = self.pending_request.unwrap_or(false);
        self.pending_request = Some(force);
    }

    fn leave_detail(&mut self) {
        if matches!(self.state, AppState::LocationDetail(_)) {
            self.state = AppState::LocationList;
        }
    }

    fn move_selection_up(&mut self) {
        let count = self.visible_locations().len();
        if count == 0 {
            return;
        }
        self.selected_index = if self.selected_index == 0 {
            count - 1
        } else {
            self.selected_index - 1
        };
    }

    fn move_selection_down(&mut self) {
        let count = self.visible_locations().len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn is_latest(&self, request: RequestId) -> bool {
        self.latest_request == Some(request)
    }

    fn remember_sources(&mut self, sources: &[SourceRecord]) {
        for source in sources {
            if !self.known_sources.iter().any(|s| s.key == source.key) {
                self.known_sources.push(source.clone());
            }
        }
    }
}

impl LoadObserver for App {
    fn on_pre_load(&mut self, request: RequestId, _query: &QueryBox) {
        self.latest_request = Some(request);
        self.loading = true;
        self.status = Status::Loading;
    }

    fn on_success(&mut self, request: RequestId, result: LocationsResult) {
        self.remember_sources(&result.sources);
        if !self.is_latest(request) {
            return;
        }
        self.status = Status::Loaded {
            count: result.locations.len(),
            from_cache: result.from_cache,
        };
        let count = result.locations.len();
        self.result = Some(result);
        if self.selected_index >= count {
            self.selected_index = 0;
        }
    }

    fn on_error(&mut self, request: RequestId, error: ApiError) {
        if !self.is_latest(request) {
            return;
        }
        if error.is_soft() {
            self.result = Some(LocationsResult {
                bounds: self.bounds,
                data_source: self.data_source.clone(),
                sources: Vec::new(),
                locations: Vec::new(),
                from_cache: false,
            });
            self.selected_index = 0;
            self.status = Status::Info(error.user_message());
        } else {
            self.status = Status::Error(error.user_message());
        }
    }

    fn on_finish(&mut self, request: RequestId) {
        if !self.is_latest(request) {
            return;
        }
        self.loading = false;
        if self.state == AppState::Loading {
            self.state = AppState::LocationList;
        }
    }
}

/// Distance in kilometres from the box center to a location
pub fn distance_from_center(bounds: &Bounds, location: &LocationRecord) -> f64 {
    bounds.center().distance_km(LatLng::new(location.lat, location.lng))
}
