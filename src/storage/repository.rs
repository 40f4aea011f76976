use async_trait::async_trait;

use crate::error::Result;
use crate::models::observation::{NewObservation, Observation};

/// 历史记录仓储
///
/// 只追加：没有更新和删除操作。写入串行执行，`list_all` 返回某一时刻的一致快照。
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// 追加一条记录，分配自增 ID 与创建时间
    ///
    /// 字段取值越界时返回 `AppError::InvalidFields`。
    async fn append(&self, entry: NewObservation) -> Result<Observation>;

    /// 按写入顺序（最早在前）列出全部记录
    async fn list_all(&self) -> Result<Vec<Observation>>;

    /// 统计数量
    async fn count(&self) -> Result<u64>;

    /// 存储健康检查
    async fn health_check(&self) -> Result<()>;

    /// 后端名称，用于日志与健康检查
    fn backend_name(&self) -> &'static str;
}
