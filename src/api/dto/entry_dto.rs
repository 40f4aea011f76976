//! 观测记录 DTO

use serde::{Deserialize, Serialize};

use crate::models::observation::Observation;

/// 记录列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryListResponse {
    /// 按写入顺序排列的记录
    pub entries: Vec<Observation>,
}
