//! Host callbacks invoked during a parse.

use std::fmt;
use std::sync::Arc;

use crate::ManifestError;
use crate::model::Period;

/// A region of the presentation timeline announced by the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRegion {
    pub scheme_id_uri: String,
    pub value: String,
    pub start_time: f64,
    pub end_time: f64,
    pub id: String,
}

/// Events a manifest parser may raise towards the host
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestEvent {
    TimelineRegionAdded(TimelineRegion),
}

pub type PeriodFilter = Arc<dyn Fn(&mut Period) + Send + Sync>;
pub type AllPeriodsFilter = Arc<dyn Fn(&mut [Period]) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&ManifestError) + Send + Sync>;
pub type EventCallback = Arc<dyn Fn(ManifestEvent) + Send + Sync>;
pub type TimelineRegionCallback = Arc<dyn Fn(TimelineRegion) + Send + Sync>;

/// Callbacks supplied by the host.
///
/// `filter_new_period` and then `filter_all_periods` run exactly once per
/// parse, after the presentation graph is complete, and may drop variants or
/// text streams the host cannot play. `on_error` only ever receives
/// recoverable errors. HLS playlists announce no events or timeline regions.
#[derive(Clone)]
pub struct PlayerInterface {
    pub filter_new_period: PeriodFilter,
    pub filter_all_periods: AllPeriodsFilter,
    pub on_error: ErrorCallback,
    pub on_event: EventCallback,
    pub on_timeline_region_added: TimelineRegionCallback,
}

impl Default for PlayerInterface {
    fn default() -> Self {
        Self {
            filter_new_period: Arc::new(|_: &mut Period| {}),
            filter_all_periods: Arc::new(|_: &mut [Period]| {}),
            on_error: Arc::new(|_: &ManifestError| {}),
            on_event: Arc::new(|_: ManifestEvent| {}),
            on_timeline_region_added: Arc::new(|_: TimelineRegion| {}),
        }
    }
}

impl fmt::Debug for PlayerInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerInterface").finish_non_exhaustive()
    }
}

impl PlayerInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter_new_period(
        mut self,
        filter: impl Fn(&mut Period) + Send + Sync + 'static,
    ) -> Self {
        self.filter_new_period = Arc::new(filter);
        self
    }

    pub fn with_filter_all_periods(
        mut self,
        filter: impl Fn(&mut [Period]) + Send + Sync + 'static,
    ) -> Self {
        self.filter_all_periods = Arc::new(filter);
        self
    }

    pub fn with_on_error(mut self, on_error: impl Fn(&ManifestError) + Send + Sync + 'static) -> Self {
        self.on_error = Arc::new(on_error);
        self
    }

    pub fn with_on_event(mut self, on_event: impl Fn(ManifestEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Arc::new(on_event);
        self
    }

    pub fn with_on_timeline_region_added(
        mut self,
        callback: impl Fn(TimelineRegion) + Send + Sync + 'static,
    ) -> Self {
        self.on_timeline_region_added = Arc::new(callback);
        self
    }
}
