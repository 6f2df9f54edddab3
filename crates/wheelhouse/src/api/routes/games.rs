use axum::{
    extract::{Path, State},
    response::ErrorResponse,
    Json,
};
use log::error;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{CampaignPublic, PlayOutcome, PlayRequest, WinnerView},
    startup::AppState,
};

pub async fn get_campaign_public(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignPublic>, ErrorResponse> {
    state
        .coordinator
        .get_campaign_public(campaign_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error getting public campaign: {:?}", e);
            e.into()
        })
}

pub async fn play_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<PlayRequest>,
) -> Result<Json<PlayOutcome>, ErrorResponse> {
    state
        .coordinator
        .play(campaign_id, body.email, body.name)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error playing campaign: {:?}", e);
            e.into()
        })
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub claim_code: String,
}

pub async fn claim_prize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClaimRequest>,
) -> Result<Json<WinnerView>, ErrorResponse> {
    state
        .coordinator
        .claim_prize(&body.claim_code)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error claiming prize: {:?}", e);
            e.into()
        })
}
