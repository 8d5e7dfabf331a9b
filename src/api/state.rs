//! Application state for the API server

use crate::{Config, VideoAggregator};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the aggregator instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main VideoAggregator instance
    pub aggregator: Arc<VideoAggregator>,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(aggregator: Arc<VideoAggregator>, config: Arc<Config>) -> Self {
        Self { aggregator, config }
    }
}
