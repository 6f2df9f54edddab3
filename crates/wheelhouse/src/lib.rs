pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod startup;

pub use config::*;
pub use domain::{
    CampaignStore, Coordinator, Error as CoordinatorError, PlayOutcome, PlayerStore, Progress,
    ProgressTracker, WinnerExpiryWatcher, WinnerStatus, WinnerView,
};
pub use infra::db::*;
pub use startup::*;
