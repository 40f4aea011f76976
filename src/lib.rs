//! Glucoscore - 基于血糖指标的考试成绩预测服务
//!
//! 记录（平均血糖, 血糖标准差, 难度, 成绩）观测，并在每次预测请求时
//! 基于全部历史记录重新拟合线性回归模型。

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod services;
pub mod storage;
