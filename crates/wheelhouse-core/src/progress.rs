//! Condition progression arithmetic.
//!
//! A participant's position in a campaign is the pair (completed set,
//! cursor). The cursor is always the length of the longest contiguous run
//! of completed conditions from order 0, so completing or auto-skipping a
//! condition out of band never strands it.
//!
//! All functions expect `conditions` sorted ascending by `display_order`.

use std::collections::HashSet;

use uuid::Uuid;

use crate::types::{ConditionSnapshot, ConditionType};

/// Length of the completed prefix, which doubles as the order of the next
/// condition to complete.
pub fn completed_prefix(conditions: &[ConditionSnapshot], completed: &HashSet<Uuid>) -> u32 {
    let mut cursor = 0;
    for condition in conditions {
        if completed.contains(&condition.id) {
            cursor += 1;
        } else {
            break;
        }
    }
    cursor
}

/// Conditions this participant has not completed in this campaign but whose
/// type is already verified at the store level, in display order. These are
/// completed automatically on every progress read.
pub fn auto_completable(
    conditions: &[ConditionSnapshot],
    completed: &HashSet<Uuid>,
    satisfied_types: &HashSet<ConditionType>,
) -> Vec<Uuid> {
    conditions
        .iter()
        .filter(|c| !completed.contains(&c.id) && satisfied_types.contains(&c.condition_type))
        .map(|c| c.id)
        .collect()
}

/// First completed game-enabling condition whose type has not yet been
/// consumed by a play at this store. `None` means no play is available.
pub fn next_playable<'a>(
    conditions: &'a [ConditionSnapshot],
    completed: &HashSet<Uuid>,
    consumed_types: &HashSet<ConditionType>,
) -> Option<&'a ConditionSnapshot> {
    conditions.iter().find(|c| {
        c.enables_game && completed.contains(&c.id) && !consumed_types.contains(&c.condition_type)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(order: u32, condition_type: ConditionType, enables_game: bool) -> ConditionSnapshot {
        ConditionSnapshot {
            id: Uuid::now_v7(),
            display_order: order,
            condition_type,
            enables_game,
        }
    }

    fn fixture() -> Vec<ConditionSnapshot> {
        vec![
            snapshot(0, ConditionType::GoogleReview, true),
            snapshot(1, ConditionType::InstagramFollow, false),
            snapshot(2, ConditionType::PlayGame, false),
        ]
    }

    #[test]
    fn test_prefix_empty() {
        let conditions = fixture();
        assert_eq!(completed_prefix(&conditions, &HashSet::new()), 0);
    }

    #[test]
    fn test_prefix_stops_at_first_gap() {
        let conditions = fixture();
        // Orders 0 and 2 done, 1 missing: cursor stays at 1
        let completed: HashSet<Uuid> = [conditions[0].id, conditions[2].id].into_iter().collect();
        assert_eq!(completed_prefix(&conditions, &completed), 1);
    }

    #[test]
    fn test_prefix_all_completed() {
        let conditions = fixture();
        let completed: HashSet<Uuid> = conditions.iter().map(|c| c.id).collect();
        assert_eq!(completed_prefix(&conditions, &completed), 3);
    }

    #[test]
    fn test_auto_completable_matches_store_types() {
        let conditions = fixture();
        let satisfied: HashSet<ConditionType> =
            [ConditionType::GoogleReview, ConditionType::PlayGame]
                .into_iter()
                .collect();

        let auto = auto_completable(&conditions, &HashSet::new(), &satisfied);
        assert_eq!(auto, vec![conditions[0].id, conditions[2].id]);
    }

    #[test]
    fn test_auto_completable_skips_already_completed() {
        let conditions = fixture();
        let satisfied: HashSet<ConditionType> =
            [ConditionType::GoogleReview].into_iter().collect();
        let completed: HashSet<Uuid> = [conditions[0].id].into_iter().collect();

        assert!(auto_completable(&conditions, &completed, &satisfied).is_empty());
    }

    #[test]
    fn test_next_playable_requires_completion() {
        let conditions = fixture();
        assert!(next_playable(&conditions, &HashSet::new(), &HashSet::new()).is_none());

        let completed: HashSet<Uuid> = [conditions[0].id].into_iter().collect();
        let playable = next_playable(&conditions, &completed, &HashSet::new()).unwrap();
        assert_eq!(playable.id, conditions[0].id);
    }

    #[test]
    fn test_next_playable_skips_consumed_types() {
        let mut conditions = fixture();
        conditions[1].enables_game = true;
        let completed: HashSet<Uuid> = conditions.iter().map(|c| c.id).collect();

        let consumed: HashSet<ConditionType> =
            [ConditionType::GoogleReview].into_iter().collect();
        let playable = next_playable(&conditions, &completed, &consumed).unwrap();
        assert_eq!(playable.condition_type, ConditionType::InstagramFollow);

        let consumed: HashSet<ConditionType> =
            [ConditionType::GoogleReview, ConditionType::InstagramFollow]
                .into_iter()
                .collect();
        assert!(next_playable(&conditions, &completed, &consumed).is_none());
    }
}
