use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::models::observation::{NewObservation, Observation};
use crate::storage::repository::EntryStore;

/// 记录表名
const ENTRY_TABLE: &str = "exam_entry";

/// SurrealDB 连接
#[derive(Clone)]
pub struct SurrealPool {
    /// 数据库连接
    db: Surreal<Any>,
    /// 连接配置
    config: DatabaseConfig,
}

impl SurrealPool {
    /// 创建新的连接
    pub async fn new(config: DatabaseConfig) -> std::result::Result<Self, surrealdb::Error> {
        let db: Surreal<Any> = connect(&config.url).await?;

        // 嵌入式引擎无需认证
        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        // 选择命名空间和数据库
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Ok(Self { db, config })
    }

    /// 获取内部数据库实例
    pub fn inner(&self) -> Surreal<Any> {
        self.db.clone()
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

/// 持久化行
///
/// 记录 ID 由 SurrealDB 管理，自增序号单独存放在 `seq` 字段。
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryRow {
    seq: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    avg_glucose: Option<f64>,
    #[serde(default)]
    glucose_sd: Option<f64>,
    #[serde(default)]
    difficulty: Option<f64>,
    #[serde(default)]
    score: Option<f64>,
}

impl From<Observation> for EntryRow {
    fn from(o: Observation) -> Self {
        Self {
            seq: o.id,
            created_at: o.created_at,
            avg_glucose: o.avg_glucose,
            glucose_sd: o.glucose_sd,
            difficulty: o.difficulty,
            score: o.score,
        }
    }
}

impl From<EntryRow> for Observation {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.seq,
            created_at: row.created_at,
            avg_glucose: row.avg_glucose,
            glucose_sd: row.glucose_sd,
            difficulty: row.difficulty,
            score: row.score,
        }
    }
}

/// SurrealDB 记录仓储
#[derive(Clone)]
pub struct SurrealEntryStore {
    db: Surreal<Any>,
    /// 串行化写入，保证序号连续
    write_lock: Arc<Mutex<()>>,
}

impl SurrealEntryStore {
    pub fn new(pool: &SurrealPool) -> Self {
        Self {
            db: pool.inner(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 获取当前最大序号
    async fn max_seq(&self) -> Result<u64> {
        let result: Vec<serde_json::Value> = self
            .db
            .query(format!(
                "SELECT seq FROM {ENTRY_TABLE} ORDER BY seq DESC LIMIT 1"
            ))
            .await?
            .take(0)?;

        Ok(result
            .first()
            .and_then(|v| v.get("seq"))
            .and_then(|s| s.as_u64())
            .unwrap_or(0))
    }
}

#[async_trait]
impl EntryStore for SurrealEntryStore {
    async fn append(&self, entry: NewObservation) -> Result<Observation> {
        entry.validate().map_err(AppError::InvalidFields)?;

        let _guard = self.write_lock.lock().await;
        let seq = self.max_seq().await? + 1;
        let row = EntryRow::from(Observation::new(seq, Utc::now(), entry));

        let created: Option<EntryRow> = self
            .db
            .create((ENTRY_TABLE, seq.to_string()))
            .content(row)
            .await?;
        debug!(seq, "entry persisted");

        created
            .map(Observation::from)
            .ok_or_else(|| AppError::Database(format!("Failed to create entry: {}", seq)))
    }

    async fn list_all(&self) -> Result<Vec<Observation>> {
        let rows: Vec<EntryRow> = self
            .db
            .query(format!(
                "SELECT seq, created_at, avg_glucose, glucose_sd, difficulty, score \
                 FROM {ENTRY_TABLE} ORDER BY seq ASC"
            ))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(Observation::from).collect())
    }

    async fn count(&self) -> Result<u64> {
        let result: Vec<serde_json::Value> = self
            .db
            .query(format!("SELECT count() FROM {ENTRY_TABLE} GROUP ALL"))
            .await?
            .take(0)?;
        Ok(result
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|c| c.as_u64())
            .unwrap_or(0))
    }

    async fn health_check(&self) -> Result<()> {
        self.db
            .health()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::FeatureQuery;
    use crate::predictor::{PredictError, predict};
    use std::time::Duration;

    async fn memory_store() -> SurrealEntryStore {
        let config = DatabaseConfig {
            url: "mem://".into(),
            namespace: "glucoscore".into(),
            database: "test".into(),
            ..Default::default()
        };
        let pool = SurrealPool::new(config).await.unwrap();
        SurrealEntryStore::new(&pool)
    }

    #[tokio::test]
    async fn test_append_and_list_in_order() {
        let store = memory_store().await;
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_all().await.unwrap().is_empty());

        for (i, score) in [88.0, 72.0, 95.0].into_iter().enumerate() {
            let stored = store
                .append(NewObservation::new(110.0 + i as f64, 20.0, 5.0, score))
                .await
                .unwrap();
            assert_eq!(stored.id, i as u64 + 1);
        }

        let all = store.list_all().await.unwrap();
        let scores: Vec<_> = all.iter().map(|o| o.score).collect();
        assert_eq!(scores, vec![Some(88.0), Some(72.0), Some(95.0)]);
        assert_eq!(store.count().await.unwrap(), 3);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_append_rejects_invalid_entry() {
        let store = memory_store().await;
        let err = store
            .append(NewObservation::new(-1.0, 20.0, 5.0, 80.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_sequence_gap_free() {
        let store = memory_store().await;

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append(NewObservation::new(100.0 + i as f64, 20.0, 5.0, 70.0))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let ids: Vec<u64> = store.list_all().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
        assert_eq!(store.count().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_row_missing_score_fails_prediction() {
        let store = memory_store().await;
        store
            .append(NewObservation::new(110.0, 20.0, 5.0, 80.0))
            .await
            .unwrap();

        store
            .db
            .query(format!(
                "CREATE {ENTRY_TABLE}:broken SET seq = 2, created_at = $created_at, \
                 avg_glucose = 120.0, glucose_sd = 25.0, difficulty = 6.0"
            ))
            .bind(("created_at", Utc::now()))
            .await
            .unwrap()
            .check()
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, 2);
        assert_eq!(all[1].score, None);
        assert_eq!(all[1].avg_glucose, Some(120.0));

        let err = predict(&all, &FeatureQuery::new(115.0, 22.0, 5.0)).unwrap_err();
        assert_eq!(
            err,
            PredictError::MalformedObservation {
                index: 1,
                field: "score",
            }
        );
    }

    #[tokio::test]
    async fn test_remote_engines_are_compiled_in() {
        for url in ["ws://127.0.0.1:1", "http://127.0.0.1:1"] {
            let config = DatabaseConfig {
                url: url.into(),
                namespace: "glucoscore".into(),
                database: "test".into(),
                ..Default::default()
            };
            // 端口不可达：连接应失败，但不能是引擎未编译
            if let Ok(Err(e)) =
                tokio::time::timeout(Duration::from_secs(5), SurrealPool::new(config)).await
            {
                assert!(!e.to_string().contains("not enabled"), "{url}: {e}");
            }
        }
    }
}
