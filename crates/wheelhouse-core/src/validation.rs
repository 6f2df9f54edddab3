//! Campaign creation validation.
//!
//! Everything here runs before any row is written, so a stored campaign can
//! be trusted downstream: orders are dense, outcome references resolve, and
//! every prize is reachable from the game configuration.

use itertools::Itertools;

use crate::types::{CreateCampaign, GameSpec, PatternSpec, SegmentSpec};
use crate::CoreError;

pub fn validate_campaign(payload: &CreateCampaign) -> Result<(), CoreError> {
    if payload.name.trim().is_empty() {
        return Err(CoreError::Validation("campaign name cannot be empty".into()));
    }

    if let Some(max) = payload.max_participants {
        if max < 1 {
            return Err(CoreError::Validation(
                "max_participants must be at least 1".into(),
            ));
        }
    }

    if let Some(days) = payload.prize_claim_expiry_days {
        if days < 1 {
            return Err(CoreError::Validation(
                "prize_claim_expiry_days must be at least 1".into(),
            ));
        }
    }

    validate_conditions(payload)?;
    validate_prizes(payload)?;
    validate_game(&payload.game, payload.prizes.len())
}

fn validate_conditions(payload: &CreateCampaign) -> Result<(), CoreError> {
    let orders: Vec<u32> = payload
        .conditions
        .iter()
        .map(|c| c.display_order)
        .sorted()
        .collect();

    if !payload
        .conditions
        .iter()
        .map(|c| c.display_order)
        .all_unique()
    {
        return Err(CoreError::Validation(
            "condition display_order values must be unique".into(),
        ));
    }

    // Dense orders starting at 0, so the cursor can walk them as a prefix
    for (expected, order) in orders.iter().enumerate() {
        if *order != expected as u32 {
            return Err(CoreError::Validation(format!(
                "condition orders must be contiguous from 0, missing order {}",
                expected
            )));
        }
    }

    Ok(())
}

fn validate_prizes(payload: &CreateCampaign) -> Result<(), CoreError> {
    for prize in &payload.prizes {
        if prize.name.trim().is_empty() {
            return Err(CoreError::Validation("prize name cannot be empty".into()));
        }
        if !prize.probability.is_finite() || !(0.0..=100.0).contains(&prize.probability) {
            return Err(CoreError::Validation(format!(
                "prize '{}' probability must be between 0 and 100",
                prize.name
            )));
        }
        if prize.quantity < 1 {
            return Err(CoreError::Validation(format!(
                "prize '{}' quantity must be at least 1",
                prize.name
            )));
        }
    }
    Ok(())
}

fn validate_game(game: &GameSpec, prize_count: usize) -> Result<(), CoreError> {
    match game {
        GameSpec::Wheel { segments } => validate_wheel(segments, prize_count),
        GameSpec::SlotMachine { symbols, patterns } => {
            validate_slot_machine(symbols, patterns, prize_count)
        }
    }
}

fn validate_wheel(segments: &[SegmentSpec], prize_count: usize) -> Result<(), CoreError> {
    if segments.len() < 2 {
        return Err(CoreError::InvalidGame(
            "wheel needs at least two segments".into(),
        ));
    }

    if !segments.iter().any(|s| s.prize_index.is_none()) {
        return Err(CoreError::InvalidGame(
            "wheel needs at least one losing segment".into(),
        ));
    }

    for segment in segments {
        if let Some(index) = segment.prize_index {
            if index >= prize_count {
                return Err(CoreError::InvalidGame(format!(
                    "segment '{}' references prize index {} but only {} prizes are defined",
                    segment.label, index, prize_count
                )));
            }
        }
    }

    for index in 0..prize_count {
        if !segments.iter().any(|s| s.prize_index == Some(index)) {
            return Err(CoreError::InvalidGame(format!(
                "prize index {} has no wheel segment",
                index
            )));
        }
    }

    Ok(())
}

fn validate_slot_machine(
    symbols: &[String],
    patterns: &[PatternSpec],
    prize_count: usize,
) -> Result<(), CoreError> {
    if symbols.len() < 2 {
        return Err(CoreError::InvalidGame(
            "slot machine needs at least two symbols".into(),
        ));
    }
    if !symbols.iter().all_unique() {
        return Err(CoreError::InvalidGame(
            "slot machine symbols must be unique".into(),
        ));
    }
    if patterns.is_empty() {
        return Err(CoreError::InvalidGame(
            "slot machine needs at least one winning pattern".into(),
        ));
    }

    let reels = patterns[0].combination.len();
    if reels == 0 {
        return Err(CoreError::InvalidGame(
            "slot machine patterns cannot be empty".into(),
        ));
    }

    for pattern in patterns {
        if pattern.combination.len() != reels {
            return Err(CoreError::InvalidGame(
                "slot machine patterns must all have the same length".into(),
            ));
        }
        if pattern.prize_index >= prize_count {
            return Err(CoreError::InvalidGame(format!(
                "pattern references prize index {} but only {} prizes are defined",
                pattern.prize_index, prize_count
            )));
        }
        for symbol in &pattern.combination {
            if !symbols.contains(symbol) {
                return Err(CoreError::InvalidGame(format!(
                    "pattern symbol '{}' is not in the symbol list",
                    symbol
                )));
            }
        }
    }

    for index in 0..prize_count {
        if !patterns.iter().any(|p| p.prize_index == index) {
            return Err(CoreError::InvalidGame(format!(
                "prize index {} has no slot pattern",
                index
            )));
        }
    }

    // A losing combination must exist for the no-win animation
    let total_combinations = (symbols.len() as u64).checked_pow(reels as u32);
    if let Some(total) = total_combinations {
        let distinct_winning = patterns
            .iter()
            .map(|p| p.combination.clone())
            .unique()
            .count() as u64;
        if distinct_winning >= total {
            return Err(CoreError::InvalidGame(
                "every combination wins, no losing outcome is possible".into(),
            ));
        }
    }

    Ok(())
}
