//! 存储工厂模块
//!
//! 根据配置创建相应的记录仓储实例。

use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::error::{AppError, Result};
use crate::storage::memory::MemoryEntryStore;
use crate::storage::repository::EntryStore;

#[cfg(feature = "surrealdb")]
use crate::storage::surrealdb::{SurrealEntryStore, SurrealPool};

/// 存储工厂
pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建仓储实例
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn EntryStore>> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory entry store");
                Ok(Arc::new(MemoryEntryStore::new()))
            }
            #[cfg(feature = "surrealdb")]
            StorageBackend::Surrealdb => {
                let pool = SurrealPool::new(config.clone())
                    .await
                    .map_err(|e| AppError::Connection(e.to_string()))?;
                info!(url = pool.url(), "Using SurrealDB entry store");
                Ok(Arc::new(SurrealEntryStore::new(&pool)))
            }
            #[cfg(not(feature = "surrealdb"))]
            StorageBackend::Surrealdb => Err(AppError::Config(
                "SurrealDB feature is not enabled. Enable 'surrealdb' feature or use the memory backend."
                    .into(),
            )),
        }
    }
}
