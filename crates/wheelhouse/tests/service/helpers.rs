use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use uuid::Uuid;
use wheelhouse::{
    CampaignStore, Coordinator, DBConnection, DatabasePoolConfig, DatabaseType, PlayerStore,
};
use wheelhouse_core::{
    ConditionType, CreateCampaign, CreateCondition, CreatePrize, GameSpec, SegmentSpec,
};

/// Coordinator over fresh in-memory databases with a pinned RNG seed.
pub async fn spawn_coordinator() -> Arc<Coordinator> {
    let test_id = Uuid::now_v7();

    let campaigns_db = DBConnection::new(
        "./test-data",
        &format!("campaigns_{}", test_id),
        DatabasePoolConfig::testing(),
        DatabaseType::Campaigns,
    )
    .await
    .expect("campaigns test db");
    let players_db = DBConnection::new(
        "./test-data",
        &format!("players_{}", test_id),
        DatabasePoolConfig::testing(),
        DatabaseType::Players,
    )
    .await
    .expect("players test db");

    Arc::new(Coordinator::new(
        CampaignStore::new(campaigns_db),
        PlayerStore::new(players_db),
        ChaCha20Rng::seed_from_u64(0x57484545),
        5,
    ))
}

pub fn prize(name: &str, probability: f64, quantity: i64) -> CreatePrize {
    CreatePrize {
        name: name.to_string(),
        probability,
        quantity,
    }
}

pub fn condition(
    condition_type: ConditionType,
    display_order: u32,
    enables_game: bool,
) -> CreateCondition {
    CreateCondition {
        condition_type,
        display_order,
        enables_game,
    }
}

/// One winning segment per prize plus a single losing segment.
pub fn wheel_for(prizes: &[CreatePrize]) -> GameSpec {
    let mut segments: Vec<SegmentSpec> = prizes
        .iter()
        .enumerate()
        .map(|(index, prize)| SegmentSpec {
            label: prize.name.clone(),
            prize_index: Some(index),
        })
        .collect();
    segments.push(SegmentSpec {
        label: "Try again".to_string(),
        prize_index: None,
    });
    GameSpec::Wheel { segments }
}

pub fn campaign_payload(
    store_id: Uuid,
    conditions: Vec<CreateCondition>,
    prizes: Vec<CreatePrize>,
) -> CreateCampaign {
    let game = wheel_for(&prizes);
    CreateCampaign {
        store_id,
        name: "Test campaign".to_string(),
        max_participants: None,
        prize_claim_expiry_days: None,
        conditions,
        prizes,
        game,
    }
}
