use axum::{Json, body::Bytes, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{
        app_state::AppState,
        dto::{PredictResponse, json_fields},
    },
    error::AppError,
    models::observation::FeatureQuery,
};

pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let query = FeatureQuery::parse(&json_fields(&body)).map_err(|errors| {
        debug!(?errors, "Rejected prediction query");
        AppError::InvalidFields(errors)
    })?;
    debug!(?query, "Predicting score");

    let result = state.prediction_service.predict(&query).await?;
    state.metrics.record_prediction(!result.model.fitted);

    Ok(Json(PredictResponse::from(result)))
}
