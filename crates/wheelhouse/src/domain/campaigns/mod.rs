mod coordinator;
mod store;

pub use coordinator::*;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
pub use store::*;
use time::OffsetDateTime;
use uuid::Uuid;
use wheelhouse_core::{ConditionSnapshot, ConditionType, GameConfig, GameSpec};

use crate::infra::db::{parse_required_datetime, parse_required_json, parse_uuid};

/// A physical store location campaigns belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl FromRow<'_, SqliteRow> for Store {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Store {
            id: parse_uuid(row, "id")?,
            name: row.get("name"),
            created_at: parse_required_datetime(row, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStore {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub max_participants: Option<i64>,
    pub prize_claim_expiry_days: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl FromRow<'_, SqliteRow> for Campaign {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Campaign {
            id: parse_uuid(row, "id")?,
            store_id: parse_uuid(row, "store_id")?,
            name: row.get("name"),
            is_active: row.get("is_active"),
            max_participants: row.get("max_participants"),
            prize_claim_expiry_days: row.get("prize_claim_expiry_days"),
            created_at: parse_required_datetime(row, "created_at")?,
            updated_at: parse_required_datetime(row, "updated_at")?,
        })
    }
}

/// An ordered step a participant completes before the game unlocks.
/// Immutable once the campaign is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub condition_type: ConditionType,
    pub display_order: i64,
    pub enables_game: bool,
}

impl Condition {
    pub fn snapshot(&self) -> ConditionSnapshot {
        ConditionSnapshot {
            id: self.id,
            display_order: self.display_order as u32,
            condition_type: self.condition_type,
            enables_game: self.enables_game,
        }
    }
}

impl FromRow<'_, SqliteRow> for Condition {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let condition_type: String = row.get("condition_type");
        Ok(Condition {
            id: parse_uuid(row, "id")?,
            campaign_id: parse_uuid(row, "campaign_id")?,
            condition_type: condition_type
                .parse()
                .map_err(|e| sqlx::Error::ColumnDecode {
                    index: "condition_type".to_string(),
                    source: Box::new(e),
                })?,
            display_order: row.get("display_order"),
            enables_game: row.get("enables_game"),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prize {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub probability: f64,
    pub quantity: i64,
    pub remaining: i64,
    pub display_order: i64,
}

impl FromRow<'_, SqliteRow> for Prize {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Prize {
            id: parse_uuid(row, "id")?,
            campaign_id: parse_uuid(row, "campaign_id")?,
            name: row.get("name"),
            probability: row.get("probability"),
            quantity: row.get("quantity"),
            remaining: row.get("remaining"),
            display_order: row.get("display_order"),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub config: GameConfig,
}

impl FromRow<'_, SqliteRow> for Game {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Game {
            id: parse_uuid(row, "id")?,
            campaign_id: parse_uuid(row, "campaign_id")?,
            config: parse_required_json(row, "config")?,
        })
    }
}

/// Full campaign with its child rows, the management view.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    pub campaign: Campaign,
    pub conditions: Vec<Condition>,
    pub prizes: Vec<Prize>,
    pub game: Game,
}

/// What anonymous players get to see: no probabilities, no stock levels.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignPublic {
    pub id: Uuid,
    pub name: String,
    pub store_name: String,
    pub is_active: bool,
    pub conditions: Vec<Condition>,
    pub prizes: Vec<PublicPrize>,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicPrize {
    pub id: Uuid,
    pub name: String,
}

impl From<&Prize> for PublicPrize {
    fn from(prize: &Prize) -> Self {
        PublicPrize {
            id: prize.id,
            name: prize.name.clone(),
        }
    }
}

/// Resolve a creation-time game spec (prizes referenced by index) into the
/// stored config (prizes referenced by id). Callers validate the payload
/// first, so every index is in range.
pub(crate) fn resolve_game_config(spec: &GameSpec, prize_ids: &[Uuid]) -> GameConfig {
    match spec {
        GameSpec::Wheel { segments } => GameConfig::Wheel {
            segments: segments
                .iter()
                .map(|segment| wheelhouse_core::WheelSegment {
                    id: Uuid::now_v7(),
                    label: segment.label.clone(),
                    prize_id: segment.prize_index.map(|index| prize_ids[index]),
                })
                .collect(),
        },
        GameSpec::SlotMachine { symbols, patterns } => GameConfig::SlotMachine {
            symbols: symbols.clone(),
            patterns: patterns
                .iter()
                .map(|pattern| wheelhouse_core::SlotPattern {
                    combination: pattern.combination.clone(),
                    prize_id: prize_ids[pattern.prize_index],
                })
                .collect(),
        },
    }
}
