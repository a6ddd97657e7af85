//! Saving-study route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::requests::{CreateStudyRequest, FinishStudyRequest, ListSuggestedRatesQuery};
use super::responses::{StudyResponse, SuggestedRateResponse, SuggestedRatesResponse};
use super::services::SuggestedRateFilter;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/studies", post(create_study))
        .route("/studies/:id", get(get_study))
        .route(
            "/studies/:id/suggested-rates",
            post(generate_suggested_rates).get(list_suggested_rates),
        )
        .route("/studies/:id/finish", post(finish_study))
        .route("/studies/:id/duplicate", post(duplicate_study))
}

async fn create_study(
    State(state): State<AppState>,
    Json(request): Json<CreateStudyRequest>,
) -> Result<(StatusCode, Json<StudyResponse>)> {
    let study = state.studies.create_study(request.into_new_study()?).await?;
    Ok((StatusCode::CREATED, Json(StudyResponse::from(&study))))
}

async fn get_study(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudyResponse>> {
    let study = state.studies.get_study(id).await?;
    Ok(Json(StudyResponse::from(&study)))
}

async fn generate_suggested_rates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuggestedRatesResponse>> {
    let study = state.studies.get_study(id).await?;
    let catalog = state
        .cache
        .get_or_load(&state.db, study.energy_type())
        .await?;

    let suggestions = state
        .studies
        .generate_suggested_rates(id, &catalog)
        .await?;

    Ok(Json(SuggestedRatesResponse {
        study_id: id,
        suggested_rates: suggestions.iter().map(SuggestedRateResponse::from).collect(),
    }))
}

async fn list_suggested_rates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListSuggestedRatesQuery>,
) -> Result<Json<SuggestedRatesResponse>> {
    let filter = SuggestedRateFilter::from(query);
    let suggestions = state.studies.list_suggested_rates(id, &filter).await?;

    Ok(Json(SuggestedRatesResponse {
        study_id: id,
        suggested_rates: suggestions.iter().map(SuggestedRateResponse::from).collect(),
    }))
}

async fn finish_study(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FinishStudyRequest>,
) -> Result<Json<StudyResponse>> {
    let study = state
        .studies
        .finish_study(id, request.suggested_rate_id)
        .await?;
    Ok(Json(StudyResponse::from(&study)))
}

async fn duplicate_study(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<StudyResponse>)> {
    let study = state.studies.duplicate_study(id).await?;
    Ok((StatusCode::CREATED, Json(StudyResponse::from(&study))))
}
