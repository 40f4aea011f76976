use serde::{Deserialize, Serialize};

use crate::models::observation::FeatureQuery;

/// 模型类型标识
pub const MODEL_KIND: &str = "multivariate_linear_regression";

/// 线性模型系数
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Coefficients {
    pub intercept: f64,
    pub avg_glucose: f64,
    pub glucose_sd: f64,
    pub difficulty: f64,
}

impl Coefficients {
    /// 对查询特征求值
    pub fn apply(&self, query: &FeatureQuery) -> f64 {
        self.intercept
            + self.avg_glucose * query.avg_glucose
            + self.glucose_sd * query.glucose_sd
            + self.difficulty * query.difficulty
    }
}

/// 本次预测所用模型的摘要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSummary {
    #[serde(rename = "type")]
    pub kind: String,
    pub coefficients: Coefficients,
    /// 本次预测是否来自回归拟合（false 表示降级为默认值或均值）
    pub fitted: bool,
    /// 参与本次预测的历史记录数
    pub n_training_rows: usize,
    /// 训练集决定系数，未拟合或成绩无方差时为空
    pub r2: Option<f64>,
}

impl ModelSummary {
    /// 未拟合的模型：系数全为 0
    pub fn untrained(n_training_rows: usize) -> Self {
        Self {
            kind: MODEL_KIND.to_string(),
            coefficients: Coefficients::default(),
            fitted: false,
            n_training_rows,
            r2: None,
        }
    }

    pub fn from_fit(coefficients: Coefficients, n_training_rows: usize, r2: Option<f64>) -> Self {
        Self {
            coefficients,
            fitted: true,
            r2,
            ..Self::untrained(n_training_rows)
        }
    }
}

/// 预测结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    /// 预测成绩，始终位于 [0, 100]
    pub predicted_score: f64,
    pub model: ModelSummary,
    /// 预测过程说明，按产生顺序排列
    pub notes: Vec<String>,
}

impl PredictionResult {
    pub fn has_note(&self, note: &str) -> bool {
        self.notes.iter().any(|n| n == note)
    }
}
