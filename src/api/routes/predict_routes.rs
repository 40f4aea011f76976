//! Predict Routes
//!
//! 定义成绩预测的 API 路由。

use crate::api::handlers::predict_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建预测路由器
pub fn create_predict_router() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}
