use time::{Duration, OffsetDateTime};
use wheelhouse::CoordinatorError;
use wheelhouse_core::{ConditionType, GameConfig, PatternSpec, GameSpec};

use crate::helpers::{campaign_payload, condition, prize, spawn_coordinator};

#[tokio::test]
async fn test_winning_play_decrements_and_creates_winner() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    // Probability 100 on the only prize makes every draw a win
    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![],
            vec![prize("Gift", 100.0, 5)],
        ))
        .await
        .unwrap();
    let campaign_id = detail.campaign.id;
    coordinator
        .set_campaign_active(campaign_id, true)
        .await
        .unwrap();

    let outcome = coordinator
        .play(campaign_id, "winner@example.com".into(), Some("Win".into()))
        .await
        .unwrap();

    assert!(outcome.has_won);
    let won = outcome.prize.unwrap();
    assert_eq!(won.name, "Gift");
    let code = outcome.claim_code.unwrap();
    assert_eq!(code.len(), 11);
    assert!(!code.contains(['I', 'O', '0', '1']));

    // The wheel lands on the segment wired to the won prize
    let detail = coordinator.get_campaign_detail(campaign_id).await.unwrap();
    let GameConfig::Wheel { segments } = &detail.game.config else {
        panic!("expected wheel");
    };
    let landed = outcome.winning_segment_id.unwrap();
    let segment = segments.iter().find(|s| s.id == landed).unwrap();
    assert_eq!(segment.prize_id, Some(won.id));

    // Stock decremented, winner recorded with the default 30 day window
    assert_eq!(detail.prizes[0].remaining, 4);
    let winners = coordinator.list_winners(campaign_id).await.unwrap();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].winner.claim_code, code);
    let window = winners[0].winner.expires_at - OffsetDateTime::now_utc();
    assert!(window > Duration::days(29) && window <= Duration::days(30));
}

#[tokio::test]
async fn test_losing_play_writes_no_winner() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    // Probability 0 means every roll above zero lands in the no-win band
    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![],
            vec![prize("Gift", 0.0, 5)],
        ))
        .await
        .unwrap();
    let campaign_id = detail.campaign.id;
    coordinator
        .set_campaign_active(campaign_id, true)
        .await
        .unwrap();

    let outcome = coordinator
        .play(campaign_id, "loser@example.com".into(), None)
        .await
        .unwrap();

    assert!(!outcome.has_won);
    assert!(outcome.prize.is_none());
    assert!(outcome.claim_code.is_none());

    // The animation lands on a losing segment
    let detail = coordinator.get_campaign_detail(campaign_id).await.unwrap();
    let GameConfig::Wheel { segments } = &detail.game.config else {
        panic!("expected wheel");
    };
    let landed = outcome.winning_segment_id.unwrap();
    let segment = segments.iter().find(|s| s.id == landed).unwrap();
    assert_eq!(segment.prize_id, None);

    assert_eq!(detail.prizes[0].remaining, 5);
    assert!(coordinator.list_winners(campaign_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_one_play_per_participant_per_campaign() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![],
            vec![prize("Gift", 0.0, 5)],
        ))
        .await
        .unwrap();
    let campaign_id = detail.campaign.id;
    coordinator
        .set_campaign_active(campaign_id, true)
        .await
        .unwrap();

    coordinator
        .play(campaign_id, "repeat@example.com".into(), None)
        .await
        .unwrap();
    let second = coordinator
        .play(campaign_id, "repeat@example.com".into(), None)
        .await;

    match second {
        Err(CoordinatorError::BadRequest(message)) => {
            assert!(message.contains("already participated"))
        }
        other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_max_participants_cap() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    let mut payload = campaign_payload(store.id, vec![], vec![prize("Gift", 0.0, 5)]);
    payload.max_participants = Some(2);
    let detail = coordinator.create_campaign(payload).await.unwrap();
    let campaign_id = detail.campaign.id;
    coordinator
        .set_campaign_active(campaign_id, true)
        .await
        .unwrap();

    coordinator
        .play(campaign_id, "a@example.com".into(), None)
        .await
        .unwrap();
    coordinator
        .play(campaign_id, "b@example.com".into(), None)
        .await
        .unwrap();
    let third = coordinator.play(campaign_id, "c@example.com".into(), None).await;

    assert!(matches!(third, Err(CoordinatorError::BadRequest(_))));
}

#[tokio::test]
async fn test_inactive_and_missing_campaigns_are_rejected() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![],
            vec![prize("Gift", 50.0, 5)],
        ))
        .await
        .unwrap();

    // Created campaigns start inactive
    let inactive = coordinator
        .play(detail.campaign.id, "a@example.com".into(), None)
        .await;
    assert!(matches!(inactive, Err(CoordinatorError::BadRequest(_))));

    let missing = coordinator
        .play(uuid::Uuid::now_v7(), "a@example.com".into(), None)
        .await;
    assert!(matches!(missing, Err(CoordinatorError::NotFound(_))));
}

#[tokio::test]
async fn test_gated_campaign_requires_completed_condition() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![condition(ConditionType::GoogleReview, 0, true)],
            vec![prize("Gift", 0.0, 5)],
        ))
        .await
        .unwrap();
    let campaign_id = detail.campaign.id;
    coordinator
        .set_campaign_active(campaign_id, true)
        .await
        .unwrap();

    let blocked = coordinator
        .play(campaign_id, "a@example.com".into(), None)
        .await;
    assert!(matches!(blocked, Err(CoordinatorError::BadRequest(_))));

    coordinator
        .complete_condition(campaign_id, "a@example.com", detail.conditions[0].id)
        .await
        .unwrap();
    coordinator
        .play(campaign_id, "a@example.com".into(), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_two_condition_types_grant_two_plays_across_campaigns() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();
    let email = "serial@example.com";

    let gated_conditions = || {
        vec![
            condition(ConditionType::GoogleReview, 0, true),
            condition(ConditionType::InstagramFollow, 1, true),
        ]
    };

    let first = coordinator
        .create_campaign(campaign_payload(
            store.id,
            gated_conditions(),
            vec![prize("Gift", 0.0, 5)],
        ))
        .await
        .unwrap();
    coordinator
        .set_campaign_active(first.campaign.id, true)
        .await
        .unwrap();

    coordinator
        .complete_condition(first.campaign.id, email, first.conditions[0].id)
        .await
        .unwrap();
    coordinator
        .complete_condition(first.campaign.id, email, first.conditions[1].id)
        .await
        .unwrap();
    coordinator
        .play(first.campaign.id, email.into(), None)
        .await
        .unwrap();

    // Second campaign at the same store: both conditions auto-skip and the
    // remaining condition type still grants one play
    coordinator
        .set_campaign_active(first.campaign.id, false)
        .await
        .unwrap();
    let second = coordinator
        .create_campaign(campaign_payload(
            store.id,
            gated_conditions(),
            vec![prize("Gift", 0.0, 5)],
        ))
        .await
        .unwrap();
    coordinator
        .set_campaign_active(second.campaign.id, true)
        .await
        .unwrap();

    let progress = coordinator
        .get_progress(second.campaign.id, email)
        .await
        .unwrap();
    assert!(progress.all_conditions_completed);
    assert!(progress.can_play);
    coordinator
        .play(second.campaign.id, email.into(), None)
        .await
        .unwrap();

    // Both types are consumed at this store now, a third campaign offers
    // no play
    coordinator
        .set_campaign_active(second.campaign.id, false)
        .await
        .unwrap();
    let third = coordinator
        .create_campaign(campaign_payload(
            store.id,
            gated_conditions(),
            vec![prize("Gift", 0.0, 5)],
        ))
        .await
        .unwrap();
    coordinator
        .set_campaign_active(third.campaign.id, true)
        .await
        .unwrap();

    let progress = coordinator
        .get_progress(third.campaign.id, email)
        .await
        .unwrap();
    assert!(progress.all_conditions_completed);
    assert!(!progress.can_play);

    let blocked = coordinator.play(third.campaign.id, email.into(), None).await;
    assert!(matches!(blocked, Err(CoordinatorError::BadRequest(_))));
}

#[tokio::test]
async fn test_slot_machine_outcomes_match_draw() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    let slot_game = GameSpec::SlotMachine {
        symbols: vec!["cherry".into(), "bell".into(), "seven".into()],
        patterns: vec![PatternSpec {
            combination: vec!["seven".into(), "seven".into(), "seven".into()],
            prize_index: 0,
        }],
    };

    let mut payload = campaign_payload(store.id, vec![], vec![prize("Jackpot", 100.0, 3)]);
    payload.game = slot_game.clone();
    let winning = coordinator.create_campaign(payload).await.unwrap();
    coordinator
        .set_campaign_active(winning.campaign.id, true)
        .await
        .unwrap();

    let outcome = coordinator
        .play(winning.campaign.id, "slots@example.com".into(), None)
        .await
        .unwrap();
    assert!(outcome.has_won);
    assert!(outcome.winning_segment_id.is_none());
    assert_eq!(
        outcome.winning_combination.unwrap(),
        vec!["seven", "seven", "seven"]
    );

    // A losing draw never shows a winning combination
    coordinator
        .set_campaign_active(winning.campaign.id, false)
        .await
        .unwrap();
    let mut payload = campaign_payload(store.id, vec![], vec![prize("Jackpot", 0.0, 3)]);
    payload.game = slot_game;
    let losing = coordinator.create_campaign(payload).await.unwrap();
    coordinator
        .set_campaign_active(losing.campaign.id, true)
        .await
        .unwrap();

    let outcome = coordinator
        .play(losing.campaign.id, "slots@example.com".into(), None)
        .await
        .unwrap();
    assert!(!outcome.has_won);
    let combination = outcome.winning_combination.unwrap();
    assert_eq!(combination.len(), 3);
    assert_ne!(combination, vec!["seven", "seven", "seven"]);
}
