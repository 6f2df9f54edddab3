//! Weighted prize selection.
//!
//! A draw rolls a uniform value in `[0, 100)` and walks the prize list
//! accumulating probabilities. The gap between the probability total and 100
//! is the no-win band; a roll landing in it returns no prize.

use rand::Rng;

/// Pick a prize index for a fixed roll.
///
/// `odds` are per-prize probabilities in percent, in list order, already
/// filtered by the caller to prizes with stock remaining. Returns the first
/// index whose cumulative probability reaches `roll`, or `None` when the
/// roll lands past the total. Totals above 100 are accepted as-is; the list
/// order decides boundary ties.
pub fn pick_prize(odds: &[f64], roll: f64) -> Option<usize> {
    let total: f64 = odds.iter().sum();
    if roll > total {
        return None;
    }

    let mut cumulative = 0.0;
    for (index, probability) in odds.iter().enumerate() {
        cumulative += probability;
        if cumulative >= roll {
            return Some(index);
        }
    }

    None
}

/// Roll and pick in one step.
pub fn draw_prize<R: Rng + ?Sized>(odds: &[f64], rng: &mut R) -> Option<usize> {
    if odds.is_empty() {
        return None;
    }
    let roll = rng.random_range(0.0..100.0);
    pick_prize(odds, roll)
}
