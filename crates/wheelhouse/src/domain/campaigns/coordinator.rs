use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use log::{error, info};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wheelhouse_core::{
    draw_prize, generate_claim_code, slot_outcome, wheel_outcome, CreateCampaign, GameConfig,
};

use crate::domain::{
    players::{
        validate_email, ConditionCompletion, GameConditionCompletion, NewWinner, PlayUnlock,
        PlayerStore, Progress, ProgressTracker, RecordPlay, Winner, WinnerStatus,
    },
    Error,
};

use super::{CampaignDetail, CampaignPublic, CampaignStore, PublicPrize, Store};

/// Response for a play request. The visual outcome mirrors the draw: the
/// wheel id or slot combination always corresponds to the prize actually
/// won (or to a losing outcome).
#[derive(Debug, Clone, Serialize)]
pub struct PlayOutcome {
    pub has_won: bool,
    pub prize: Option<PublicPrize>,
    pub participant_id: Uuid,
    pub claim_code: Option<String>,
    pub winning_segment_id: Option<Uuid>,
    pub winning_combination: Option<Vec<String>>,
}

/// Winner row with its derived status, the reporting view.
#[derive(Debug, Clone, Serialize)]
pub struct WinnerView {
    #[serde(flatten)]
    pub winner: Winner,
    pub status: WinnerStatus,
}

impl From<Winner> for WinnerView {
    fn from(winner: Winner) -> Self {
        let status = winner.status();
        Self { winner, status }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayRequest {
    pub email: String,
    pub name: Option<String>,
}

/// Orchestrates the campaign flows over the two stores. Constructed once at
/// startup and shared behind an `Arc`; holds no per-request state beyond
/// the seedable RNG used for draws, codes and outcome sampling.
pub struct Coordinator {
    campaigns: CampaignStore,
    players: PlayerStore,
    tracker: ProgressTracker,
    rng: Mutex<ChaCha20Rng>,
    claim_code_attempts: u32,
}

impl Coordinator {
    pub fn new(
        campaigns: CampaignStore,
        players: PlayerStore,
        rng: ChaCha20Rng,
        claim_code_attempts: u32,
    ) -> Self {
        let tracker = ProgressTracker::new(campaigns.clone(), players.clone());
        Self {
            campaigns,
            players,
            tracker,
            rng: Mutex::new(rng),
            claim_code_attempts: claim_code_attempts.max(1),
        }
    }

    pub async fn ping(&self) -> Result<(), Error> {
        self.campaigns.ping().await?;
        self.players.ping().await?;
        Ok(())
    }

    pub async fn create_store(&self, name: String) -> Result<Store, Error> {
        if name.trim().is_empty() {
            return Err(Error::BadRequest("store name cannot be empty".to_string()));
        }
        self.campaigns.create_store(name).await
    }

    pub async fn create_campaign(&self, payload: CreateCampaign) -> Result<CampaignDetail, Error> {
        let detail = self.campaigns.create_campaign(payload).await?;
        info!(
            "created campaign {} for store {}",
            detail.campaign.id, detail.campaign.store_id
        );
        Ok(detail)
    }

    pub async fn get_campaign_detail(&self, campaign_id: Uuid) -> Result<CampaignDetail, Error> {
        self.campaigns.get_campaign_detail(campaign_id).await
    }

    pub async fn get_campaign_public(&self, campaign_id: Uuid) -> Result<CampaignPublic, Error> {
        self.campaigns.get_campaign_public(campaign_id).await
    }

    pub async fn set_campaign_active(
        &self,
        campaign_id: Uuid,
        active: bool,
    ) -> Result<CampaignDetail, Error> {
        let campaign = self.campaigns.set_active(campaign_id, active).await?;
        info!(
            "campaign {} is now {}",
            campaign.id,
            if campaign.is_active { "active" } else { "inactive" }
        );
        self.campaigns.get_campaign_detail(campaign_id).await
    }

    pub async fn get_progress(&self, campaign_id: Uuid, email: &str) -> Result<Progress, Error> {
        self.tracker.get_progress(campaign_id, email).await
    }

    pub async fn complete_condition(
        &self,
        campaign_id: Uuid,
        email: &str,
        condition_id: Uuid,
    ) -> Result<ConditionCompletion, Error> {
        self.tracker
            .complete_condition(campaign_id, email, condition_id)
            .await
    }

    pub async fn complete_game_condition(
        &self,
        campaign_id: Uuid,
        email: &str,
    ) -> Result<GameConditionCompletion, Error> {
        self.tracker.complete_game_condition(campaign_id, email).await
    }

    /// Run one play: eligibility, draw, persistence, visual outcome.
    pub async fn play(
        &self,
        campaign_id: Uuid,
        email: String,
        name: Option<String>,
    ) -> Result<PlayOutcome, Error> {
        validate_email(&email)?;

        let campaign = self.campaigns.get_campaign(campaign_id).await?;
        if !campaign.is_active {
            return Err(Error::BadRequest("campaign is not active".to_string()));
        }

        let conditions = self.campaigns.conditions_for(campaign_id).await?;

        // A campaign with game-enabling conditions gates plays on them;
        // without any, the game is open to every first-time participant.
        let unlocking = if conditions.iter().any(|c| c.enables_game) {
            let progress = self.tracker.get_progress(campaign_id, &email).await?;
            let condition_id = progress.next_playable_condition_id.ok_or_else(|| {
                Error::BadRequest(
                    "no play available: complete a game-enabling condition first".to_string(),
                )
            })?;
            let condition = conditions
                .iter()
                .find(|c| c.id == condition_id)
                .ok_or_else(|| anyhow!("playable condition {} vanished", condition_id))?;
            Some(PlayUnlock {
                store_id: campaign.store_id,
                condition_id: condition.id,
                condition_type: condition.condition_type,
            })
        } else {
            None
        };

        let prizes = self.campaigns.available_prizes(campaign_id).await?;
        let odds: Vec<f64> = prizes.iter().map(|p| p.probability).collect();

        let (drawn_index, claim_codes) = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| anyhow!("draw rng lock poisoned"))?;
            let drawn = draw_prize(&odds, &mut *rng);
            let codes: Vec<String> = (0..self.claim_code_attempts)
                .map(|_| generate_claim_code(&mut *rng))
                .collect();
            (drawn, codes)
        };

        // The conditional decrement is what keeps `remaining` non-negative;
        // losing the race to the last unit degrades the draw to a no-win.
        let mut won_prize = drawn_index.map(|index| prizes[index].clone());
        let mut decremented = false;
        if let Some(prize) = &won_prize {
            if self.campaigns.decrement_prize(prize.id).await? {
                decremented = true;
            } else {
                info!("prize {} ran out mid-draw, degrading to no-win", prize.id);
                won_prize = None;
            }
        }

        let winner = won_prize.as_ref().map(|prize| NewWinner {
            prize_id: prize.id,
            expires_at: OffsetDateTime::now_utc()
                + time::Duration::days(campaign.prize_claim_expiry_days),
        });

        let record = RecordPlay {
            campaign_id,
            email: email.clone(),
            name,
            max_participants: campaign.max_participants,
            unlocking,
            claim_codes: if winner.is_some() { claim_codes } else { vec![] },
            winner,
        };

        let play = match self.players.record_play(record).await {
            Ok(play) => play,
            Err(e) => {
                if decremented {
                    if let Some(prize) = &won_prize {
                        if let Err(restore_err) = self.campaigns.restore_prize(prize.id).await {
                            error!(
                                "failed to restore prize {} after rejected play: {}",
                                prize.id, restore_err
                            );
                        }
                    }
                }
                return Err(e);
            }
        };

        let game = self.campaigns.game_for(campaign_id).await?;
        let won_prize_id = won_prize.as_ref().map(|prize| prize.id);
        let (winning_segment_id, winning_combination) = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| anyhow!("draw rng lock poisoned"))?;
            match &game.config {
                GameConfig::Wheel { segments } => {
                    let segment_id = wheel_outcome(segments, won_prize_id, &mut *rng)
                        .ok_or_else(|| anyhow!("no wheel segment maps to the drawn prize"))?;
                    (Some(segment_id), None)
                }
                GameConfig::SlotMachine { symbols, patterns } => {
                    let combination = slot_outcome(symbols, patterns, won_prize_id, &mut *rng)
                        .ok_or_else(|| anyhow!("no slot combination maps to the drawn prize"))?;
                    (None, Some(combination))
                }
            }
        };

        info!(
            "play recorded for campaign {}: participant {}, won: {}",
            campaign_id,
            play.participant_id,
            won_prize.is_some()
        );

        Ok(PlayOutcome {
            has_won: won_prize.is_some(),
            prize: won_prize.as_ref().map(PublicPrize::from),
            participant_id: play.participant_id,
            claim_code: play.claim_code,
            winning_segment_id,
            winning_combination,
        })
    }

    pub async fn list_winners(&self, campaign_id: Uuid) -> Result<Vec<WinnerView>, Error> {
        // Surface the campaign's 404 before an empty winner list would
        self.campaigns.get_campaign(campaign_id).await?;
        let winners = self.players.winners_for_campaign(campaign_id).await?;
        Ok(winners.into_iter().map(WinnerView::from).collect())
    }

    /// Claim a won prize by code. Expiry is evaluated here, at claim time,
    /// from `expires_at`; the background sweep only reconciles bookkeeping.
    pub async fn claim_prize(&self, claim_code: &str) -> Result<WinnerView, Error> {
        let winner = self
            .players
            .find_winner_by_code(claim_code)
            .await?
            .ok_or_else(|| Error::NotFound(format!("claim code not found: {}", claim_code)))?;

        match winner.status() {
            WinnerStatus::Claimed => {
                return Err(Error::BadRequest("prize already claimed".to_string()))
            }
            WinnerStatus::Expired => {
                return Err(Error::BadRequest("claim code expired".to_string()))
            }
            WinnerStatus::Pending => {}
        }

        if !self.players.mark_claimed(claim_code).await? {
            return Err(Error::BadRequest("prize already claimed".to_string()));
        }

        let claimed = self
            .players
            .find_winner_by_code(claim_code)
            .await?
            .ok_or_else(|| anyhow!("winner vanished after claim: {}", claim_code))?;
        Ok(WinnerView::from(claimed))
    }

    pub async fn expire_winners(&self) -> Result<u64, Error> {
        self.players.sweep_expired(OffsetDateTime::now_utc()).await
    }
}

/// Periodic reconciliation of winner expiry. Reads derive expiry from
/// `expires_at` on their own; this loop only stamps `expired_at` so reports
/// and exports see an explicit state.
pub struct WinnerExpiryWatcher {
    coordinator: Arc<Coordinator>,
    sync_interval: Duration,
    cancel_token: CancellationToken,
}

impl WinnerExpiryWatcher {
    pub fn new(
        coordinator: Arc<Coordinator>,
        cancel_token: CancellationToken,
        sync_interval: Duration,
    ) -> Self {
        Self {
            coordinator,
            sync_interval,
            cancel_token,
        }
    }

    pub async fn watch(&self) -> Result<(), anyhow::Error> {
        info!("Starting winner expiry watcher");

        loop {
            if self.cancel_token.is_cancelled() {
                info!("Winner expiry watcher received cancellation");
                break;
            }

            match self.coordinator.expire_winners().await {
                Ok(0) => {}
                Ok(count) => info!("marked {} winners as expired", count),
                Err(e) => error!("Winner expiry sweep error: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.sync_interval) => {}
                _ = self.cancel_token.cancelled() => {
                    info!("Winner expiry watcher received cancellation");
                    break;
                }
            }
        }

        Ok(())
    }
}
