//! Entry Routes
//!
//! 定义观测记录相关的 API 路由。

use crate::api::handlers::entry_handler::*;
use axum::{Router, routing::get};

use crate::api::app_state::AppState;

/// 创建记录路由器
pub fn create_entry_router() -> Router<AppState> {
    Router::new().route("/entries", get(list_entries).post(create_entry))
}
