use time::OffsetDateTime;
use uuid::Uuid;
use wheelhouse_core::{validate_campaign, CreateCampaign};

use crate::{
    domain::Error,
    infra::db::{format_datetime, DBConnection},
};

use super::{
    resolve_game_config, Campaign, CampaignDetail, CampaignPublic, Condition, Game, Prize,
    PublicPrize, Store,
};

#[derive(Debug, Clone)]
pub struct CampaignStore {
    db_connection: DBConnection,
}

impl CampaignStore {
    pub fn new(db_connection: DBConnection) -> Self {
        Self { db_connection }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.db_connection.ping().await
    }

    pub async fn create_store(&self, name: String) -> Result<Store, Error> {
        let id = Uuid::now_v7();
        let now = format_datetime(OffsetDateTime::now_utc());

        sqlx::query("INSERT INTO stores (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(&name)
            .bind(&now)
            .execute(self.db_connection.write())
            .await?;

        self.get_store(id).await
    }

    pub async fn get_store(&self, store_id: Uuid) -> Result<Store, Error> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, name, created_at FROM stores WHERE id = ?",
        )
        .bind(store_id.to_string())
        .fetch_optional(self.db_connection.read())
        .await?;

        store.ok_or_else(|| Error::NotFound(format!("store not found: {}", store_id)))
    }

    /// Create a campaign with its conditions, prizes and game in one
    /// transaction. The game spec's prize indexes are resolved into the ids
    /// minted here, so every stored outcome carries an explicit reference.
    pub async fn create_campaign(&self, payload: CreateCampaign) -> Result<CampaignDetail, Error> {
        validate_campaign(&payload)?;
        // Fails early with NOT_FOUND before anything is written
        self.get_store(payload.store_id).await?;

        let campaign_id = Uuid::now_v7();
        let now = format_datetime(OffsetDateTime::now_utc());
        let expiry_days = payload.prize_claim_expiry_days.unwrap_or(30);
        let prize_ids: Vec<Uuid> = payload.prizes.iter().map(|_| Uuid::now_v7()).collect();
        let game_config = resolve_game_config(&payload.game, &prize_ids);
        let game_config_json = serde_json::to_string(&game_config)?;

        let mut tx = self.db_connection.write().begin().await?;

        sqlx::query(
            "INSERT INTO campaigns (
                id,
                store_id,
                name,
                is_active,
                max_participants,
                prize_claim_expiry_days,
                created_at,
                updated_at
            ) VALUES (?, ?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(campaign_id.to_string())
        .bind(payload.store_id.to_string())
        .bind(&payload.name)
        .bind(payload.max_participants)
        .bind(expiry_days)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for condition in &payload.conditions {
            sqlx::query(
                "INSERT INTO conditions (id, campaign_id, condition_type, display_order, enables_game)
                VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::now_v7().to_string())
            .bind(campaign_id.to_string())
            .bind(condition.condition_type.as_str())
            .bind(condition.display_order as i64)
            .bind(condition.enables_game)
            .execute(&mut *tx)
            .await?;
        }

        for (index, prize) in payload.prizes.iter().enumerate() {
            sqlx::query(
                "INSERT INTO prizes (id, campaign_id, name, probability, quantity, remaining, display_order)
                VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(prize_ids[index].to_string())
            .bind(campaign_id.to_string())
            .bind(&prize.name)
            .bind(prize.probability)
            .bind(prize.quantity)
            .bind(prize.quantity)
            .bind(index as i64)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO games (id, campaign_id, config) VALUES (?, ?, ?)")
            .bind(Uuid::now_v7().to_string())
            .bind(campaign_id.to_string())
            .bind(&game_config_json)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_campaign_detail(campaign_id).await
    }

    pub async fn get_campaign(&self, campaign_id: Uuid) -> Result<Campaign, Error> {
        let campaign = sqlx::query_as::<_, Campaign>(
            "SELECT
                id,
                store_id,
                name,
                is_active,
                max_participants,
                prize_claim_expiry_days,
                created_at,
                updated_at
            FROM campaigns
            WHERE id = ?",
        )
        .bind(campaign_id.to_string())
        .fetch_optional(self.db_connection.read())
        .await?;

        campaign.ok_or_else(|| Error::NotFound(format!("campaign not found: {}", campaign_id)))
    }

    pub async fn get_campaign_detail(&self, campaign_id: Uuid) -> Result<CampaignDetail, Error> {
        let campaign = self.get_campaign(campaign_id).await?;
        let conditions = self.conditions_for(campaign_id).await?;
        let prizes = self.prizes_for(campaign_id).await?;
        let game = self.game_for(campaign_id).await?;

        Ok(CampaignDetail {
            campaign,
            conditions,
            prizes,
            game,
        })
    }

    pub async fn get_campaign_public(&self, campaign_id: Uuid) -> Result<CampaignPublic, Error> {
        let campaign = self.get_campaign(campaign_id).await?;
        let store = self.get_store(campaign.store_id).await?;
        let conditions = self.conditions_for(campaign_id).await?;
        let prizes = self.prizes_for(campaign_id).await?;
        let game = self.game_for(campaign_id).await?;

        Ok(CampaignPublic {
            id: campaign.id,
            name: campaign.name,
            store_name: store.name,
            is_active: campaign.is_active,
            conditions,
            prizes: prizes.iter().map(PublicPrize::from).collect(),
            game: game.config,
        })
    }

    /// Flip the active flag. Activation trips the partial unique index when
    /// another campaign is already active for the same store.
    pub async fn set_active(&self, campaign_id: Uuid, active: bool) -> Result<Campaign, Error> {
        let now = format_datetime(OffsetDateTime::now_utc());

        let result = sqlx::query(
            "UPDATE campaigns SET is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(active)
        .bind(&now)
        .bind(campaign_id.to_string())
        .execute(self.db_connection.write())
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false)
            {
                Error::BadRequest(
                    "another campaign is already active for this store".to_string(),
                )
            } else {
                Error::DbError(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "campaign not found: {}",
                campaign_id
            )));
        }

        self.get_campaign(campaign_id).await
    }

    pub async fn conditions_for(&self, campaign_id: Uuid) -> Result<Vec<Condition>, Error> {
        let conditions = sqlx::query_as::<_, Condition>(
            "SELECT id, campaign_id, condition_type, display_order, enables_game
            FROM conditions
            WHERE campaign_id = ?
            ORDER BY display_order ASC",
        )
        .bind(campaign_id.to_string())
        .fetch_all(self.db_connection.read())
        .await?;

        Ok(conditions)
    }

    pub async fn prizes_for(&self, campaign_id: Uuid) -> Result<Vec<Prize>, Error> {
        let prizes = sqlx::query_as::<_, Prize>(
            "SELECT id, campaign_id, name, probability, quantity, remaining, display_order
            FROM prizes
            WHERE campaign_id = ?
            ORDER BY display_order ASC",
        )
        .bind(campaign_id.to_string())
        .fetch_all(self.db_connection.read())
        .await?;

        Ok(prizes)
    }

    /// Prizes still in stock, in draw order.
    pub async fn available_prizes(&self, campaign_id: Uuid) -> Result<Vec<Prize>, Error> {
        let prizes = sqlx::query_as::<_, Prize>(
            "SELECT id, campaign_id, name, probability, quantity, remaining, display_order
            FROM prizes
            WHERE campaign_id = ? AND remaining > 0
            ORDER BY display_order ASC",
        )
        .bind(campaign_id.to_string())
        .fetch_all(self.db_connection.read())
        .await?;

        Ok(prizes)
    }

    pub async fn game_for(&self, campaign_id: Uuid) -> Result<Game, Error> {
        let game = sqlx::query_as::<_, Game>(
            "SELECT id, campaign_id, config FROM games WHERE campaign_id = ?",
        )
        .bind(campaign_id.to_string())
        .fetch_optional(self.db_connection.read())
        .await?;

        game.ok_or_else(|| {
            Error::NotFound(format!("no game configured for campaign {}", campaign_id))
        })
    }

    /// Take one unit of stock. Returns false when the prize ran out in the
    /// meantime, which the caller turns into a no-win.
    pub async fn decrement_prize(&self, prize_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE prizes SET remaining = remaining - 1 WHERE id = ? AND remaining > 0",
        )
        .bind(prize_id.to_string())
        .execute(self.db_connection.write())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Put one unit of stock back after a failed winner write.
    pub async fn restore_prize(&self, prize_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            "UPDATE prizes SET remaining = remaining + 1 WHERE id = ? AND remaining < quantity",
        )
        .bind(prize_id.to_string())
        .execute(self.db_connection.write())
        .await?;

        Ok(())
    }
}
