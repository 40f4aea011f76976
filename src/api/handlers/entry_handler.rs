use axum::{Json, body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{
        app_state::AppState,
        dto::{EntryListResponse, json_fields},
    },
    error::AppError,
    models::observation::NewObservation,
};

pub async fn list_entries(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let entries = state.prediction_service.entries().await?;
    debug!("Listing {} entries", entries.len());

    Ok(Json(EntryListResponse { entries }))
}

pub async fn create_entry(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entry = NewObservation::parse(&json_fields(&body)).map_err(|errors| {
        debug!(?errors, "Rejected entry");
        AppError::InvalidFields(errors)
    })?;

    let stored = state.prediction_service.record(entry).await?;
    state.metrics.record_entry();

    Ok((StatusCode::CREATED, Json(stored)))
}
