//! 进程内存储
//!
//! 记录保存在读写锁保护的 `Vec` 中，进程退出后丢失。适用于测试和临时部署。

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{AppError, Result};
use crate::models::observation::{NewObservation, Observation};
use crate::storage::repository::EntryStore;

#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    entries: RwLock<Vec<Observation>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用已有记录初始化，供测试构造历史数据
    pub fn with_entries(entries: Vec<Observation>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn append(&self, entry: NewObservation) -> Result<Observation> {
        entry.validate().map_err(AppError::InvalidFields)?;

        let mut entries = self.entries.write();
        let id = entries.last().map(|e| e.id).unwrap_or(0) + 1;
        let observation = Observation::new(id, Utc::now(), entry);
        entries.push(observation.clone());
        Ok(observation)
    }

    async fn list_all(&self) -> Result<Vec<Observation>> {
        Ok(self.entries.read().clone())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.read().len() as u64)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
