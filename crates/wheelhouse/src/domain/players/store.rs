use std::collections::HashSet;

use anyhow::anyhow;
use log::debug;
use time::OffsetDateTime;
use uuid::Uuid;
use wheelhouse_core::ConditionType;

use crate::{
    domain::Error,
    infra::db::{format_datetime, DBConnection},
};

use super::{Participant, PlayRecord, RecordPlay, Winner};

#[derive(Debug, Clone)]
pub struct PlayerStore {
    db_connection: DBConnection,
}

impl PlayerStore {
    pub fn new(db_connection: DBConnection) -> Self {
        Self { db_connection }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.db_connection.ping().await
    }

    pub async fn get_participant(
        &self,
        campaign_id: Uuid,
        email: &str,
    ) -> Result<Option<Participant>, Error> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT
                id,
                campaign_id,
                email,
                name,
                completed_condition_ids,
                current_condition_order,
                has_played,
                play_count,
                played_condition_ids,
                created_at,
                updated_at
            FROM participants
            WHERE campaign_id = ? AND email = ?",
        )
        .bind(campaign_id.to_string())
        .bind(email)
        .fetch_optional(self.db_connection.read())
        .await?;

        Ok(participant)
    }

    /// Fetch or lazily create the participant row. The conflict clause makes
    /// concurrent first reads converge on one row.
    pub async fn get_or_create_participant(
        &self,
        campaign_id: Uuid,
        email: &str,
    ) -> Result<Participant, Error> {
        let now = format_datetime(OffsetDateTime::now_utc());

        sqlx::query(
            "INSERT INTO participants (
                id,
                campaign_id,
                email,
                completed_condition_ids,
                current_condition_order,
                has_played,
                play_count,
                played_condition_ids,
                created_at,
                updated_at
            ) VALUES (?, ?, ?, '[]', 0, 0, 0, '[]', ?, ?)
            ON CONFLICT (campaign_id, email) DO NOTHING",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(campaign_id.to_string())
        .bind(email)
        .bind(&now)
        .bind(&now)
        .execute(self.db_connection.write())
        .await?;

        self.get_participant(campaign_id, email)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "participant not found for campaign {}: {}",
                    campaign_id, email
                ))
            })
    }

    /// Persist a recomputed (completed set, cursor) pair.
    pub async fn update_progress(
        &self,
        campaign_id: Uuid,
        email: &str,
        completed_condition_ids: &[Uuid],
        current_condition_order: i64,
    ) -> Result<(), Error> {
        let completed_json = serde_json::to_string(completed_condition_ids)?;
        let now = format_datetime(OffsetDateTime::now_utc());

        let result = sqlx::query(
            "UPDATE participants
            SET completed_condition_ids = ?,
                current_condition_order = ?,
                updated_at = ?
            WHERE campaign_id = ? AND email = ?",
        )
        .bind(&completed_json)
        .bind(current_condition_order)
        .bind(&now)
        .bind(campaign_id.to_string())
        .bind(email)
        .execute(self.db_connection.write())
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "participant not found for campaign {}: {}",
                campaign_id, email
            )));
        }

        Ok(())
    }

    /// Condition types this email has verified at this store, across all
    /// campaigns.
    pub async fn store_completed_types(
        &self,
        email: &str,
        store_id: Uuid,
    ) -> Result<HashSet<ConditionType>, Error> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT condition_type FROM store_condition_completions
            WHERE email = ? AND store_id = ?",
        )
        .bind(email)
        .bind(store_id.to_string())
        .fetch_all(self.db_connection.read())
        .await?;

        parse_condition_types(rows)
    }

    /// Record a verified condition type at the store level. The raw upsert
    /// leans on sqlite's conflict clause so repeat completions only refresh
    /// the timestamp.
    pub async fn upsert_store_completion(
        &self,
        email: &str,
        store_id: Uuid,
        condition_type: ConditionType,
    ) -> Result<(), Error> {
        let now = format_datetime(OffsetDateTime::now_utc());

        sqlx::query(
            "INSERT INTO store_condition_completions (email, store_id, condition_type, completed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (email, store_id, condition_type)
            DO UPDATE SET completed_at = excluded.completed_at",
        )
        .bind(email)
        .bind(store_id.to_string())
        .bind(condition_type.as_str())
        .bind(&now)
        .execute(self.db_connection.write())
        .await?;

        Ok(())
    }

    /// Condition types whose play grant was already spent at this store.
    pub async fn consumed_play_types(
        &self,
        email: &str,
        store_id: Uuid,
    ) -> Result<HashSet<ConditionType>, Error> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT condition_type FROM store_played_games
            WHERE email = ? AND store_id = ?",
        )
        .bind(email)
        .bind(store_id.to_string())
        .fetch_all(self.db_connection.read())
        .await?;

        parse_condition_types(rows)
    }

    pub async fn count_participants(&self, campaign_id: Uuid) -> Result<i64, Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE campaign_id = ?")
                .bind(campaign_id.to_string())
                .fetch_one(self.db_connection.read())
                .await?;
        Ok(count)
    }

    /// The play write, all in one transaction:
    ///
    /// 1. participant upsert guarded by `has_played = 0`; a participant who
    ///    already played updates zero rows and the whole play is rejected;
    /// 2. participant count checked against the cap after the insert, so two
    ///    racing plays cannot both slip under it;
    /// 3. the unlocking condition type claimed in `store_played_games`,
    ///    where the primary key rejects a second spend of the same type;
    /// 4. the winner row written with the first claim code candidate that
    ///    clears the unique constraint.
    pub async fn record_play(&self, record: RecordPlay) -> Result<PlayRecord, Error> {
        let now = format_datetime(OffsetDateTime::now_utc());
        let unlock_condition_id = record
            .unlocking
            .as_ref()
            .map(|unlock| unlock.condition_id.to_string());
        let played_ids: Vec<Uuid> = record
            .unlocking
            .iter()
            .map(|unlock| unlock.condition_id)
            .collect();
        let played_json = serde_json::to_string(&played_ids)?;

        let mut tx = self.db_connection.write().begin().await?;

        let upserted = sqlx::query(
            "INSERT INTO participants (
                id,
                campaign_id,
                email,
                name,
                completed_condition_ids,
                current_condition_order,
                has_played,
                play_count,
                played_condition_ids,
                created_at,
                updated_at
            ) VALUES (?, ?, ?, ?, '[]', 0, 1, 1, ?, ?, ?)
            ON CONFLICT (campaign_id, email) DO UPDATE SET
                has_played = 1,
                play_count = participants.play_count + 1,
                name = COALESCE(participants.name, excluded.name),
                played_condition_ids = CASE
                    WHEN ? IS NULL THEN participants.played_condition_ids
                    ELSE json_insert(participants.played_condition_ids, '$[#]', ?)
                END,
                updated_at = excluded.updated_at
            WHERE participants.has_played = 0",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(record.campaign_id.to_string())
        .bind(&record.email)
        .bind(&record.name)
        .bind(&played_json)
        .bind(&now)
        .bind(&now)
        .bind(&unlock_condition_id)
        .bind(&unlock_condition_id)
        .execute(&mut *tx)
        .await?;

        if upserted.rows_affected() == 0 {
            return Err(Error::BadRequest(
                "already participated in this campaign".to_string(),
            ));
        }

        let participant_id: String =
            sqlx::query_scalar("SELECT id FROM participants WHERE campaign_id = ? AND email = ?")
                .bind(record.campaign_id.to_string())
                .bind(&record.email)
                .fetch_one(&mut *tx)
                .await?;
        let participant_id = Uuid::parse_str(&participant_id)
            .map_err(|e| Error::Internal(anyhow!("stored participant id is not a uuid: {}", e)))?;

        if let Some(max) = record.max_participants {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE campaign_id = ?")
                    .bind(record.campaign_id.to_string())
                    .fetch_one(&mut *tx)
                    .await?;
            if count > max {
                return Err(Error::BadRequest(
                    "campaign has reached its maximum number of participants".to_string(),
                ));
            }
        }

        if let Some(unlock) = &record.unlocking {
            sqlx::query(
                "INSERT INTO store_played_games (email, store_id, condition_type, played_at)
                VALUES (?, ?, ?, ?)",
            )
            .bind(&record.email)
            .bind(unlock.store_id.to_string())
            .bind(unlock.condition_type.as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::BadRequest(
                        "a play for this condition type was already used at this store"
                            .to_string(),
                    )
                } else {
                    Error::DbError(e)
                }
            })?;
        }

        let mut winner_row: Option<(Uuid, String)> = None;
        if let Some(winner) = &record.winner {
            for code in &record.claim_codes {
                let winner_id = Uuid::now_v7();
                let inserted = sqlx::query(
                    "INSERT INTO winners (
                        id,
                        prize_id,
                        campaign_id,
                        email,
                        name,
                        claim_code,
                        created_at,
                        expires_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(winner_id.to_string())
                .bind(winner.prize_id.to_string())
                .bind(record.campaign_id.to_string())
                .bind(&record.email)
                .bind(&record.name)
                .bind(code)
                .bind(&now)
                .bind(format_datetime(winner.expires_at))
                .execute(&mut *tx)
                .await;

                match inserted {
                    Ok(_) => {
                        winner_row = Some((winner_id, code.clone()));
                        break;
                    }
                    Err(e) if is_unique_violation(&e) => {
                        debug!("claim code collision on {}, trying next candidate", code);
                        continue;
                    }
                    Err(e) => return Err(Error::DbError(e)),
                }
            }

            if winner_row.is_none() {
                return Err(Error::Internal(anyhow!(
                    "exhausted {} claim code candidates",
                    record.claim_codes.len()
                )));
            }
        }

        tx.commit().await?;

        let (winner_id, claim_code) = match winner_row {
            Some((id, code)) => (Some(id), Some(code)),
            None => (None, None),
        };

        Ok(PlayRecord {
            participant_id,
            winner_id,
            claim_code,
        })
    }

    pub async fn winners_for_campaign(&self, campaign_id: Uuid) -> Result<Vec<Winner>, Error> {
        let winners = sqlx::query_as::<_, Winner>(
            "SELECT
                id,
                prize_id,
                campaign_id,
                email,
                name,
                claim_code,
                created_at,
                expires_at,
                claimed_at,
                expired_at
            FROM winners
            WHERE campaign_id = ?
            ORDER BY created_at ASC",
        )
        .bind(campaign_id.to_string())
        .fetch_all(self.db_connection.read())
        .await?;

        Ok(winners)
    }

    pub async fn find_winner_by_code(&self, claim_code: &str) -> Result<Option<Winner>, Error> {
        let winner = sqlx::query_as::<_, Winner>(
            "SELECT
                id,
                prize_id,
                campaign_id,
                email,
                name,
                claim_code,
                created_at,
                expires_at,
                claimed_at,
                expired_at
            FROM winners
            WHERE claim_code = ?",
        )
        .bind(claim_code)
        .fetch_optional(self.db_connection.read())
        .await?;

        Ok(winner)
    }

    /// Stamp the claim. Conditional on the row still being unclaimed, so two
    /// racing claims resolve to one winner.
    pub async fn mark_claimed(&self, claim_code: &str) -> Result<bool, Error> {
        let now = format_datetime(OffsetDateTime::now_utc());

        let result = sqlx::query(
            "UPDATE winners SET claimed_at = ? WHERE claim_code = ? AND claimed_at IS NULL",
        )
        .bind(&now)
        .bind(claim_code)
        .execute(self.db_connection.write())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reconciliation pass: stamp pending winners whose window has closed.
    /// Reads always compute expiry from `expires_at`, so this only makes the
    /// state explicit for reporting.
    pub async fn sweep_expired(&self, now: OffsetDateTime) -> Result<u64, Error> {
        let now = format_datetime(now);

        let result = sqlx::query(
            "UPDATE winners
            SET expired_at = ?
            WHERE claimed_at IS NULL AND expired_at IS NULL AND expires_at < ?",
        )
        .bind(&now)
        .bind(&now)
        .execute(self.db_connection.write())
        .await?;

        Ok(result.rows_affected())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn parse_condition_types(rows: Vec<String>) -> Result<HashSet<ConditionType>, Error> {
    rows.into_iter()
        .map(|raw| {
            raw.parse::<ConditionType>()
                .map_err(wheelhouse_core::CoreError::into)
        })
        .collect()
}
