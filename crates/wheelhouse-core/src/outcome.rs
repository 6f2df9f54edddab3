//! Visual game outcome mapping.
//!
//! The draw decides the prize; these functions decide what the UI animation
//! lands on. Outcomes reference prizes by explicit id, so a won prize maps
//! to a random outcome among those configured for it and a lost draw maps
//! to a losing outcome.

use rand::Rng;
use uuid::Uuid;

use crate::types::{SlotPattern, WheelSegment};

/// Pick the wheel segment the animation should stop on.
///
/// Candidates are the segments whose `prize_id` matches the drawn prize
/// (`None` selects among losing segments). Returns `None` only for a game
/// configuration with no matching segment, which campaign validation rules
/// out.
pub fn wheel_outcome<R: Rng + ?Sized>(
    segments: &[WheelSegment],
    prize_id: Option<Uuid>,
    rng: &mut R,
) -> Option<Uuid> {
    let candidates: Vec<&WheelSegment> = segments
        .iter()
        .filter(|segment| segment.prize_id == prize_id)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let index = rng.random_range(0..candidates.len());
    Some(candidates[index].id)
}

/// Attempts at sampling a losing combination before giving up. Validation
/// guarantees at least one non-winning combination exists, so in practice
/// the loop terminates far earlier.
const LOSS_SAMPLE_ATTEMPTS: usize = 64;

/// Pick the symbol combination a slot machine should show.
///
/// A win picks uniformly among the patterns configured for the prize. A
/// loss samples random symbols and rejects winning combinations.
pub fn slot_outcome<R: Rng + ?Sized>(
    symbols: &[String],
    patterns: &[SlotPattern],
    prize_id: Option<Uuid>,
    rng: &mut R,
) -> Option<Vec<String>> {
    match prize_id {
        Some(id) => {
            let candidates: Vec<&SlotPattern> = patterns
                .iter()
                .filter(|pattern| pattern.prize_id == id)
                .collect();
            if candidates.is_empty() {
                return None;
            }
            let index = rng.random_range(0..candidates.len());
            Some(candidates[index].combination.clone())
        }
        None => {
            let reels = patterns.first().map(|p| p.combination.len()).unwrap_or(3);
            if symbols.is_empty() {
                return None;
            }
            for _ in 0..LOSS_SAMPLE_ATTEMPTS {
                let combination: Vec<String> = (0..reels)
                    .map(|_| symbols[rng.random_range(0..symbols.len())].clone())
                    .collect();
                if !patterns.iter().any(|p| p.combination == combination) {
                    return Some(combination);
                }
            }
            None
        }
    }
}
