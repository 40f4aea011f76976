//! 最小二乘求解
//!
//! 基于 SVD 求解 `min ||Xβ - y||²`。设计矩阵可能只有寥寥几行，且特征可能共线
//! （例如所有记录难度相同），因此先按相对阈值判断数值秩：秩不足时拒绝求解，
//! 而不是返回一个不唯一的最小范数解。

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// 求解失败原因
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error("design matrix is rank deficient (rank {rank}, need {required})")]
    RankDeficient { rank: usize, required: usize },

    #[error("singular value decomposition did not converge")]
    NoConvergence,

    #[error("least squares solve failed: {0}")]
    Solver(&'static str),

    #[error("least squares solution is not finite")]
    NonFinite,
}

/// 最小二乘解
#[derive(Debug, Clone)]
pub struct LeastSquares {
    /// 系数向量，与设计矩阵列一一对应
    pub beta: DVector<f64>,
    /// 训练集上的决定系数；因变量无方差时为 None
    pub r2: Option<f64>,
}

/// Solve an ordinary least squares problem using SVD.
///
/// Singular values at or below `rank_tolerance * σ_max` count as zero; the
/// system must keep full column rank under that threshold.
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    rank_tolerance: f64,
) -> Result<LeastSquares, SolveError> {
    let required = x.ncols();
    let svd = x
        .clone()
        .try_svd(true, true, f64::EPSILON, 0)
        .ok_or(SolveError::NoConvergence)?;

    let sigma_max = svd.singular_values.max();
    if !sigma_max.is_finite() || sigma_max <= 0.0 {
        return Err(SolveError::RankDeficient { rank: 0, required });
    }

    let eps = sigma_max * rank_tolerance;
    let rank = svd.rank(eps);
    if rank < required {
        return Err(SolveError::RankDeficient { rank, required });
    }

    let beta = svd.solve(y, eps).map_err(SolveError::Solver)?;
    if beta.iter().any(|v| !v.is_finite()) {
        return Err(SolveError::NonFinite);
    }

    let r2 = coefficient_of_determination(x, y, &beta);
    Ok(LeastSquares { beta, r2 })
}

fn coefficient_of_determination(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    beta: &DVector<f64>,
) -> Option<f64> {
    let fitted = x * beta;
    let ss_res = (y - fitted).norm_squared();
    let mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();

    (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot)
}
