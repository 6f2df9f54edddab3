pub mod claim_code;
pub mod draw;
pub mod errors;
pub mod outcome;
pub mod progress;
pub mod types;
pub mod validation;

pub use claim_code::generate_claim_code;
pub use draw::{draw_prize, pick_prize};
pub use errors::CoreError;
pub use outcome::{slot_outcome, wheel_outcome};
pub use progress::{auto_completable, completed_prefix, next_playable};
pub use types::{
    ConditionSnapshot, ConditionType, CreateCampaign, CreateCondition, CreatePrize, GameConfig,
    GameSpec, PatternSpec, SegmentSpec, SlotPattern, WheelSegment,
};
pub use validation::validate_campaign;
