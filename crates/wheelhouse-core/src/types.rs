use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// The kinds of steps a campaign can ask a participant to complete before
/// the game unlocks. Stored as text, so variants map 1:1 to a stable string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    GoogleReview,
    InstagramFollow,
    FacebookFollow,
    TiktokFollow,
    NewsletterSignup,
    PlayGame,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::GoogleReview => "google_review",
            ConditionType::InstagramFollow => "instagram_follow",
            ConditionType::FacebookFollow => "facebook_follow",
            ConditionType::TiktokFollow => "tiktok_follow",
            ConditionType::NewsletterSignup => "newsletter_signup",
            ConditionType::PlayGame => "play_game",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_review" => Ok(ConditionType::GoogleReview),
            "instagram_follow" => Ok(ConditionType::InstagramFollow),
            "facebook_follow" => Ok(ConditionType::FacebookFollow),
            "tiktok_follow" => Ok(ConditionType::TiktokFollow),
            "newsletter_signup" => Ok(ConditionType::NewsletterSignup),
            "play_game" => Ok(ConditionType::PlayGame),
            other => Err(CoreError::Validation(format!(
                "unknown condition type: {}",
                other
            ))),
        }
    }
}

/// The slice of a condition the progress arithmetic needs. The service
/// builds these from its stored conditions, sorted by `display_order`.
#[derive(Debug, Clone)]
pub struct ConditionSnapshot {
    pub id: Uuid,
    pub display_order: u32,
    pub condition_type: ConditionType,
    pub enables_game: bool,
}

/// Stored game configuration. Every visual outcome carries an explicit
/// `prize_id` reference; a `None` prize marks a losing outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "game_type", rename_all = "snake_case")]
pub enum GameConfig {
    Wheel {
        segments: Vec<WheelSegment>,
    },
    SlotMachine {
        symbols: Vec<String>,
        patterns: Vec<SlotPattern>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelSegment {
    pub id: Uuid,
    pub label: String,
    pub prize_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotPattern {
    pub combination: Vec<String>,
    pub prize_id: Uuid,
}

/// Campaign creation payload. Game outcomes reference prizes by index into
/// `prizes` because prize ids do not exist yet; the service resolves the
/// indexes into explicit ids before anything is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub store_id: Uuid,
    pub name: String,
    pub max_participants: Option<i64>,
    /// Days a won prize stays claimable. Defaults to 30 when omitted.
    pub prize_claim_expiry_days: Option<i64>,
    pub conditions: Vec<CreateCondition>,
    pub prizes: Vec<CreatePrize>,
    pub game: GameSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCondition {
    pub condition_type: ConditionType,
    pub display_order: u32,
    pub enables_game: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrize {
    pub name: String,
    /// Win probability in percent, 0 to 100. Probabilities are not
    /// normalized; the shortfall to 100 is the no-win gap.
    pub probability: f64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "game_type", rename_all = "snake_case")]
pub enum GameSpec {
    Wheel {
        segments: Vec<SegmentSpec>,
    },
    SlotMachine {
        symbols: Vec<String>,
        patterns: Vec<PatternSpec>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub label: String,
    /// Index into the campaign's prize list, or None for a losing segment.
    pub prize_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub combination: Vec<String>,
    pub prize_index: usize,
}
