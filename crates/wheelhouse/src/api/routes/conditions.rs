use axum::{
    extract::{Path, Query, State},
    response::ErrorResponse,
    Json,
};
use log::error;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{ConditionCompletion, GameConditionCompletion, Progress},
    startup::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantBody {
    pub email: String,
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<Progress>, ErrorResponse> {
    state
        .coordinator
        .get_progress(campaign_id, &query.email)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error getting progress: {:?}", e);
            e.into()
        })
}

pub async fn complete_condition(
    State(state): State<Arc<AppState>>,
    Path((campaign_id, condition_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ParticipantBody>,
) -> Result<Json<ConditionCompletion>, ErrorResponse> {
    state
        .coordinator
        .complete_condition(campaign_id, &body.email, condition_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error completing condition: {:?}", e);
            e.into()
        })
}

pub async fn complete_game_condition(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<ParticipantBody>,
) -> Result<Json<GameConditionCompletion>, ErrorResponse> {
    state
        .coordinator
        .complete_game_condition(campaign_id, &body.email)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error completing game condition: {:?}", e);
            e.into()
        })
}
