//! 预测服务
//!
//! 组合记录仓储与预测器：每次请求读取当前全部记录并重新拟合。

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::models::observation::{FeatureQuery, NewObservation, Observation};
use crate::models::prediction::PredictionResult;
use crate::predictor::Predictor;
use crate::storage::repository::EntryStore;

/// 预测服务 trait
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// 记录一次观测
    async fn record(&self, entry: NewObservation) -> Result<Observation>;

    /// 列出全部观测
    async fn entries(&self) -> Result<Vec<Observation>>;

    /// 预测查询特征对应的成绩
    async fn predict(&self, query: &FeatureQuery) -> Result<PredictionResult>;
}

/// 预测服务实现
pub struct PredictionServiceImpl {
    store: Arc<dyn EntryStore>,
    predictor: Predictor,
}

impl PredictionServiceImpl {
    /// 创建新的服务实例
    pub fn new(store: Arc<dyn EntryStore>, predictor: Predictor) -> Self {
        Self { store, predictor }
    }
}

#[async_trait]
impl PredictionService for PredictionServiceImpl {
    async fn record(&self, entry: NewObservation) -> Result<Observation> {
        let stored = self.store.append(entry).await?;
        info!(id = stored.id, "entry recorded");
        Ok(stored)
    }

    async fn entries(&self) -> Result<Vec<Observation>> {
        self.store.list_all().await
    }

    async fn predict(&self, query: &FeatureQuery) -> Result<PredictionResult> {
        let observations = self.store.list_all().await?;
        self.predictor.predict(&observations, query).map_err(|e| {
            error!(error = %e, "stored entries are malformed");
            AppError::from(e)
        })
    }
}

/// 创建预测服务
pub fn create_prediction_service(
    store: Arc<dyn EntryStore>,
    predictor: Predictor,
) -> Arc<dyn PredictionService> {
    Arc::new(PredictionServiceImpl::new(store, predictor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{NOTE_INSUFFICIENT_DATA, NOTE_NO_DATA, PredictError};
    use crate::storage::memory::MemoryEntryStore;
    use chrono::Utc;

    fn service(store: MemoryEntryStore) -> Arc<dyn PredictionService> {
        create_prediction_service(Arc::new(store), Predictor::default())
    }

    #[tokio::test]
    async fn test_prediction_refits_after_each_append() {
        let service = service(MemoryEntryStore::new());
        let query = FeatureQuery::new(110.0, 20.0, 5.0);

        let empty = service.predict(&query).await.unwrap();
        assert!(empty.has_note(NOTE_NO_DATA));

        service
            .record(NewObservation::new(120.0, 25.0, 6.0, 80.0))
            .await
            .unwrap();
        let one = service.predict(&query).await.unwrap();
        assert_eq!(one.predicted_score, 80.0);
        assert!(one.has_note(NOTE_INSUFFICIENT_DATA));

        service
            .record(NewObservation::new(130.0, 30.0, 7.0, 60.0))
            .await
            .unwrap();
        let two = service.predict(&query).await.unwrap();
        assert_eq!(two.predicted_score, 70.0);
        assert_eq!(two.model.n_training_rows, 2);
        assert_eq!(service.entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_entry_surfaces_as_error() {
        let broken = Observation {
            id: 1,
            created_at: Utc::now(),
            avg_glucose: Some(120.0),
            glucose_sd: Some(25.0),
            difficulty: Some(6.0),
            score: None,
        };
        let service = service(MemoryEntryStore::with_entries(vec![broken]));

        let err = service
            .predict(&FeatureQuery::new(110.0, 20.0, 5.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedObservation(PredictError::MalformedObservation {
                index: 0,
                field: "score"
            })
        ));
    }
}
