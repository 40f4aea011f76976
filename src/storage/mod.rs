//! 存储层模块
//!
//! 提供历史记录的持久化服务，支持进程内存储和 SurrealDB。

pub mod factory;
pub mod memory;
pub mod repository;

#[cfg(feature = "surrealdb")]
pub mod surrealdb;

pub use factory::StorageFactory;
pub use memory::MemoryEntryStore;
pub use repository::EntryStore;
