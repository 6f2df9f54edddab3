mod progress;
mod store;

pub use progress::*;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
pub use store::*;
use time::OffsetDateTime;
use uuid::Uuid;
use wheelhouse_core::ConditionType;

use crate::infra::db::{
    parse_optional_datetime, parse_required_datetime, parse_required_json, parse_uuid,
};

/// One participant's state within one campaign, keyed by (campaign, email).
/// Append-only audit trail: rows are created lazily and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Condition ids in completion order
    pub completed_condition_ids: Vec<Uuid>,
    /// Cursor into the campaign's ordered condition list
    pub current_condition_order: i64,
    pub has_played: bool,
    pub play_count: i64,
    /// Condition ids whose game grant was already spent
    pub played_condition_ids: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl FromRow<'_, SqliteRow> for Participant {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Participant {
            id: parse_uuid(row, "id")?,
            campaign_id: parse_uuid(row, "campaign_id")?,
            email: row.get("email"),
            name: row.get("name"),
            completed_condition_ids: parse_required_json(row, "completed_condition_ids")?,
            current_condition_order: row.get("current_condition_order"),
            has_played: row.get("has_played"),
            play_count: row.get("play_count"),
            played_condition_ids: parse_required_json(row, "played_condition_ids")?,
            created_at: parse_required_datetime(row, "created_at")?,
            updated_at: parse_required_datetime(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerStatus {
    Pending,
    Claimed,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Winner {
    pub id: Uuid,
    pub prize_id: Uuid,
    pub campaign_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub claim_code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub claimed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expired_at: Option<OffsetDateTime>,
}

impl Winner {
    /// Status is derived, never stored: a pending row turns expired the
    /// moment `expires_at` passes, whether or not the sweep has stamped it.
    pub fn status(&self) -> WinnerStatus {
        if self.claimed_at.is_some() {
            return WinnerStatus::Claimed;
        }
        if self.expired_at.is_some() || OffsetDateTime::now_utc() > self.expires_at {
            return WinnerStatus::Expired;
        }
        WinnerStatus::Pending
    }

    pub fn is_claimable(&self) -> bool {
        matches!(self.status(), WinnerStatus::Pending)
    }
}

impl FromRow<'_, SqliteRow> for Winner {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Winner {
            id: parse_uuid(row, "id")?,
            prize_id: parse_uuid(row, "prize_id")?,
            campaign_id: parse_uuid(row, "campaign_id")?,
            email: row.get("email"),
            name: row.get("name"),
            claim_code: row.get("claim_code"),
            created_at: parse_required_datetime(row, "created_at")?,
            expires_at: parse_required_datetime(row, "expires_at")?,
            claimed_at: parse_optional_datetime(row, "claimed_at")?,
            expired_at: parse_optional_datetime(row, "expired_at")?,
        })
    }
}

/// Input for the winner row written during a play.
#[derive(Debug, Clone)]
pub struct NewWinner {
    pub prize_id: Uuid,
    pub expires_at: OffsetDateTime,
}

/// Store-level play consumption recorded alongside a play.
#[derive(Debug, Clone)]
pub struct PlayUnlock {
    pub store_id: Uuid,
    pub condition_id: Uuid,
    pub condition_type: ConditionType,
}

/// Everything the play transaction writes, gathered up front.
#[derive(Debug, Clone)]
pub struct RecordPlay {
    pub campaign_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub max_participants: Option<i64>,
    pub unlocking: Option<PlayUnlock>,
    pub winner: Option<NewWinner>,
    /// Claim code candidates, tried in order until one is unique
    pub claim_codes: Vec<String>,
}

/// What the play transaction produced.
#[derive(Debug, Clone)]
pub struct PlayRecord {
    pub participant_id: Uuid,
    pub winner_id: Option<Uuid>,
    pub claim_code: Option<String>,
}
