use axum::{
    extract::{Path, State},
    response::ErrorResponse,
    Json,
};
use log::error;
use std::sync::Arc;
use uuid::Uuid;
use wheelhouse_core::CreateCampaign;

use crate::{
    domain::{CampaignDetail, CreateStore, Store, WinnerView},
    startup::AppState,
};

pub async fn create_store(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateStore>,
) -> Result<Json<Store>, ErrorResponse> {
    state
        .coordinator
        .create_store(body.name)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error creating store: {:?}", e);
            e.into()
        })
}

pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCampaign>,
) -> Result<Json<CampaignDetail>, ErrorResponse> {
    state
        .coordinator
        .create_campaign(body)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error creating campaign: {:?}", e);
            e.into()
        })
}

pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignDetail>, ErrorResponse> {
    state
        .coordinator
        .get_campaign_detail(campaign_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error getting campaign: {:?}", e);
            e.into()
        })
}

pub async fn activate_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignDetail>, ErrorResponse> {
    state
        .coordinator
        .set_campaign_active(campaign_id, true)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error activating campaign: {:?}", e);
            e.into()
        })
}

pub async fn deactivate_campaign(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignDetail>, ErrorResponse> {
    state
        .coordinator
        .set_campaign_active(campaign_id, false)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error deactivating campaign: {:?}", e);
            e.into()
        })
}

pub async fn get_campaign_winners(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<WinnerView>>, ErrorResponse> {
    state
        .coordinator
        .list_winners(campaign_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!("error listing winners: {:?}", e);
            e.into()
        })
}
