//! 核心数据模型模块
//!
//! 定义观测记录、预测查询与预测结果。

pub mod observation;
pub mod prediction;

pub use observation::*;
pub use prediction::*;
