//! 服务模块

pub mod prediction;

pub use prediction::{PredictionService, create_prediction_service};
