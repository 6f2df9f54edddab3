use std::collections::HashSet;

use log::debug;
use serde::Serialize;
use uuid::Uuid;
use wheelhouse_core::{auto_completable, completed_prefix, next_playable, ConditionType};

use crate::domain::{
    campaigns::{Campaign, CampaignStore, Condition},
    Error,
};

use super::{Participant, PlayerStore};

/// Snapshot returned to the UI on every progress read.
#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub conditions: Vec<Condition>,
    pub participant: Participant,
    pub current_condition: Option<Condition>,
    pub completed_condition_ids: Vec<Uuid>,
    pub all_conditions_completed: bool,
    pub can_play: bool,
    pub next_playable_condition_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionCompletion {
    pub success: bool,
    pub can_play: bool,
    pub enables_game: bool,
    pub next_condition_order: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameConditionCompletion {
    pub success: bool,
    pub has_game_condition: bool,
}

/// Tracks which ordered conditions a participant has completed in a
/// campaign, with the store-level shortcut: a condition type already
/// verified at the same store auto-completes on every read, so returning
/// participants never repeat a step they satisfied at a sibling campaign.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    campaigns: CampaignStore,
    players: PlayerStore,
}

struct ProgressContext {
    campaign: Campaign,
    conditions: Vec<Condition>,
    participant: Participant,
    completed: Vec<Uuid>,
    cursor: i64,
    consumed_types: HashSet<ConditionType>,
}

impl ProgressTracker {
    pub fn new(campaigns: CampaignStore, players: PlayerStore) -> Self {
        Self { campaigns, players }
    }

    pub async fn get_progress(&self, campaign_id: Uuid, email: &str) -> Result<Progress, Error> {
        let ctx = self.load(campaign_id, email).await?;
        Ok(self.build_progress(ctx))
    }

    pub async fn complete_condition(
        &self,
        campaign_id: Uuid,
        email: &str,
        condition_id: Uuid,
    ) -> Result<ConditionCompletion, Error> {
        let mut ctx = self.load(campaign_id, email).await?;

        let condition = ctx
            .conditions
            .iter()
            .find(|c| c.id == condition_id)
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "condition {} not found in campaign {}",
                    condition_id, campaign_id
                ))
            })?;

        self.apply_completion(&mut ctx, &condition, email).await?;

        let completed_set: HashSet<Uuid> = ctx.completed.iter().copied().collect();
        let snapshots: Vec<_> = ctx.conditions.iter().map(|c| c.snapshot()).collect();
        let can_play =
            next_playable(&snapshots, &completed_set, &ctx.consumed_types).is_some();

        Ok(ConditionCompletion {
            success: true,
            can_play,
            enables_game: condition.enables_game,
            next_condition_order: ctx.cursor,
        })
    }

    /// Complete the campaign's `play_game` step, reported by the UI after
    /// the participant finished a game round. A campaign without such a
    /// step answers with `has_game_condition = false` and changes nothing.
    pub async fn complete_game_condition(
        &self,
        campaign_id: Uuid,
        email: &str,
    ) -> Result<GameConditionCompletion, Error> {
        let mut ctx = self.load(campaign_id, email).await?;

        let game_conditions: Vec<Condition> = ctx
            .conditions
            .iter()
            .filter(|c| c.condition_type == ConditionType::PlayGame)
            .cloned()
            .collect();

        if game_conditions.is_empty() {
            return Ok(GameConditionCompletion {
                success: false,
                has_game_condition: false,
            });
        }

        let completed_set: HashSet<Uuid> = ctx.completed.iter().copied().collect();
        let target = game_conditions
            .into_iter()
            .find(|c| !completed_set.contains(&c.id))
            .ok_or_else(|| Error::BadRequest("game condition already completed".to_string()))?;

        self.apply_completion(&mut ctx, &target, email).await?;

        Ok(GameConditionCompletion {
            success: true,
            has_game_condition: true,
        })
    }

    /// Load campaign and participant state with the store-level auto-skip
    /// already applied and persisted.
    async fn load(&self, campaign_id: Uuid, email: &str) -> Result<ProgressContext, Error> {
        validate_email(email)?;

        let campaign = self.campaigns.get_campaign(campaign_id).await?;
        let conditions = self.campaigns.conditions_for(campaign_id).await?;
        let participant = self
            .players
            .get_or_create_participant(campaign_id, email)
            .await?;

        let satisfied_types = self
            .players
            .store_completed_types(email, campaign.store_id)
            .await?;
        let consumed_types = self
            .players
            .consumed_play_types(email, campaign.store_id)
            .await?;

        let snapshots: Vec<_> = conditions.iter().map(|c| c.snapshot()).collect();
        let mut completed = participant.completed_condition_ids.clone();
        let mut completed_set: HashSet<Uuid> = completed.iter().copied().collect();

        let auto = auto_completable(&snapshots, &completed_set, &satisfied_types);
        if !auto.is_empty() {
            debug!(
                "auto-completing {} conditions for {} in campaign {}",
                auto.len(),
                email,
                campaign_id
            );
            for condition_id in auto {
                completed.push(condition_id);
                completed_set.insert(condition_id);
            }
        }

        let cursor = completed_prefix(&snapshots, &completed_set) as i64;
        if completed.len() != participant.completed_condition_ids.len()
            || cursor != participant.current_condition_order
        {
            self.players
                .update_progress(campaign_id, email, &completed, cursor)
                .await?;
        }

        Ok(ProgressContext {
            campaign,
            conditions,
            participant,
            completed,
            cursor,
            consumed_types,
        })
    }

    /// Validate and persist one explicit completion: strictly in order,
    /// never twice, mirrored into the store-level completion table.
    async fn apply_completion(
        &self,
        ctx: &mut ProgressContext,
        condition: &Condition,
        email: &str,
    ) -> Result<(), Error> {
        if ctx.completed.contains(&condition.id) {
            return Err(Error::BadRequest("condition already completed".to_string()));
        }
        if condition.display_order != ctx.cursor {
            return Err(Error::BadRequest(format!(
                "conditions must be completed in order, expected order {} but got {}",
                ctx.cursor, condition.display_order
            )));
        }

        ctx.completed.push(condition.id);
        let completed_set: HashSet<Uuid> = ctx.completed.iter().copied().collect();
        let snapshots: Vec<_> = ctx.conditions.iter().map(|c| c.snapshot()).collect();
        ctx.cursor = completed_prefix(&snapshots, &completed_set) as i64;

        self.players
            .update_progress(ctx.campaign.id, email, &ctx.completed, ctx.cursor)
            .await?;
        self.players
            .upsert_store_completion(email, ctx.campaign.store_id, condition.condition_type)
            .await?;

        Ok(())
    }

    fn build_progress(&self, ctx: ProgressContext) -> Progress {
        let completed_set: HashSet<Uuid> = ctx.completed.iter().copied().collect();
        let snapshots: Vec<_> = ctx.conditions.iter().map(|c| c.snapshot()).collect();

        let playable = next_playable(&snapshots, &completed_set, &ctx.consumed_types);
        let current_condition = ctx
            .conditions
            .iter()
            .find(|c| c.display_order == ctx.cursor)
            .cloned();

        let mut participant = ctx.participant;
        participant.completed_condition_ids = ctx.completed.clone();
        participant.current_condition_order = ctx.cursor;

        Progress {
            all_conditions_completed: ctx.cursor as usize >= ctx.conditions.len(),
            can_play: playable.is_some(),
            next_playable_condition_id: playable.map(|c| c.id),
            current_condition,
            completed_condition_ids: ctx.completed,
            conditions: ctx.conditions,
            participant,
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), Error> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(Error::BadRequest(format!(
            "invalid participant email: {}",
            email
        )));
    }
    Ok(())
}
