//! 成绩预测
//!
//! 每次请求都基于当前全部历史记录重新拟合线性模型：
//!
//! ```text
//! score ≈ b0 + b1·avg_glucose + b2·glucose_sd + b3·difficulty
//! ```
//!
//! 数据不足或拟合退化时降级为均值预测并附带说明，不视为错误。
//! 只有历史记录缺少必需的数值字段时才返回错误。

pub mod ols;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PredictorConfig;
use crate::models::observation::{FeatureQuery, Observation};
use crate::models::prediction::{Coefficients, ModelSummary, PredictionResult};
use ols::solve_least_squares;

/// 回归所需的最少记录数
pub const MIN_REGRESSION_ENTRIES: usize = 3;

/// 成绩下界
pub const MIN_SCORE: f64 = 0.0;
/// 成绩上界
pub const MAX_SCORE: f64 = 100.0;

pub const NOTE_NO_DATA: &str = "No historical data available; returning a default score of 0.";
pub const NOTE_INSUFFICIENT_DATA: &str =
    "Insufficient data for regression (need at least 3 entries); using mean score.";
pub const NOTE_REGRESSION_FAILED: &str = "Regression failed (degenerate data); using mean score.";
pub const NOTE_CLAMPED: &str = "Prediction clamped to valid score range [0, 100].";

/// 预测错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictError {
    #[error("observation #{index} is missing a finite `{field}` value")]
    MalformedObservation { index: usize, field: &'static str },
}

/// 一条可参与拟合的样本
#[derive(Debug, Clone, Copy)]
struct Sample {
    avg_glucose: f64,
    glucose_sd: f64,
    difficulty: f64,
    score: f64,
}

impl Sample {
    fn from_observation(index: usize, observation: &Observation) -> Result<Self, PredictError> {
        let require = |value: Option<f64>, field: &'static str| {
            value
                .filter(|v| v.is_finite())
                .ok_or(PredictError::MalformedObservation { index, field })
        };

        Ok(Self {
            avg_glucose: require(observation.avg_glucose, "avg_glucose")?,
            glucose_sd: require(observation.glucose_sd, "glucose_sd")?,
            difficulty: require(observation.difficulty, "difficulty")?,
            score: require(observation.score, "score")?,
        })
    }
}

/// 成绩预测器
///
/// 无内部状态，可在任意并发请求间共享。
#[derive(Debug, Clone)]
pub struct Predictor {
    rank_tolerance: f64,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(&PredictorConfig::default())
    }
}

impl Predictor {
    pub fn new(config: &PredictorConfig) -> Self {
        Self {
            rank_tolerance: config.rank_tolerance,
        }
    }

    /// 基于全部历史记录预测查询特征对应的成绩
    pub fn predict(
        &self,
        observations: &[Observation],
        query: &FeatureQuery,
    ) -> Result<PredictionResult, PredictError> {
        let samples = observations
            .iter()
            .enumerate()
            .map(|(index, observation)| Sample::from_observation(index, observation))
            .collect::<Result<Vec<_>, _>>()?;
        let n = samples.len();

        let mut notes = Vec::new();
        let mut model = ModelSummary::untrained(n);
        let mut fit_note = None;

        let raw = if n == 0 {
            notes.push(NOTE_NO_DATA.to_string());
            0.0
        } else if n < MIN_REGRESSION_ENTRIES {
            notes.push(NOTE_INSUFFICIENT_DATA.to_string());
            mean_score(&samples)
        } else {
            match self.fit(&samples) {
                Some((coefficients, r2)) => {
                    let raw = coefficients.apply(query);
                    if raw.is_finite() {
                        model = ModelSummary::from_fit(coefficients, n, r2);
                        fit_note = Some(format!("Model fit using {n} historical entries."));
                        raw
                    } else {
                        warn!(n, "regression produced a non-finite prediction");
                        notes.push(NOTE_REGRESSION_FAILED.to_string());
                        mean_score(&samples)
                    }
                }
                None => {
                    notes.push(NOTE_REGRESSION_FAILED.to_string());
                    mean_score(&samples)
                }
            }
        };

        let predicted_score = raw.clamp(MIN_SCORE, MAX_SCORE);
        if predicted_score != raw {
            notes.push(NOTE_CLAMPED.to_string());
        }
        notes.extend(fit_note);

        debug!(n, raw, predicted_score, "prediction computed");
        Ok(PredictionResult {
            predicted_score,
            model,
            notes,
        })
    }

    fn fit(&self, samples: &[Sample]) -> Option<(Coefficients, Option<f64>)> {
        let x = DMatrix::from_fn(samples.len(), 4, |row, col| {
            let s = &samples[row];
            match col {
                0 => 1.0,
                1 => s.avg_glucose,
                2 => s.glucose_sd,
                _ => s.difficulty,
            }
        });
        let y = DVector::from_iterator(samples.len(), samples.iter().map(|s| s.score));

        match solve_least_squares(&x, &y, self.rank_tolerance) {
            Ok(solution) => {
                let b = &solution.beta;
                let coefficients = Coefficients {
                    intercept: b[0],
                    avg_glucose: b[1],
                    glucose_sd: b[2],
                    difficulty: b[3],
                };
                debug!(?coefficients, r2 = ?solution.r2, "regression fitted");
                Some((coefficients, solution.r2))
            }
            Err(e) => {
                warn!(error = %e, n = samples.len(), "regression degenerate, falling back to mean");
                None
            }
        }
    }
}

/// 使用默认配置预测
pub fn predict(
    observations: &[Observation],
    query: &FeatureQuery,
) -> Result<PredictionResult, PredictError> {
    Predictor::default().predict(observations, query)
}

/// 成绩算术平均
fn mean_score(samples: &[Sample]) -> f64 {
    samples.iter().map(|s| s.score).sum::<f64>() / samples.len() as f64
}
