//! 预测 DTO
//!
//! 响应中的成绩保留 2 位小数，决定系数保留 4 位小数。

use serde::{Deserialize, Serialize};

use crate::models::prediction::{ModelSummary, PredictionResult};

/// 预测响应
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// 预测成绩
    pub predicted_score: f64,
    /// 模型摘要
    pub model: ModelSummary,
    /// 预测说明
    pub notes: Vec<String>,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        let mut model = result.model;
        model.r2 = model.r2.map(|r2| round_to(r2, 4));

        Self {
            predicted_score: round_to(result.predicted_score, 2),
            model,
            notes: result.notes,
        }
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
