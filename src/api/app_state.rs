use crate::observability::AppMetrics;
use crate::services::prediction::PredictionService;
use std::sync::Arc;

/// Application state shared by every API handler
#[derive(Clone)]
pub struct AppState {
    /// Prediction service: records entries and refits on every prediction
    pub prediction_service: Arc<dyn PredictionService>,
    /// Request and prediction counters
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("prediction_service", &"Arc<dyn PredictionService>")
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(prediction_service: Arc<dyn PredictionService>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            prediction_service,
            metrics,
        }
    }
}
