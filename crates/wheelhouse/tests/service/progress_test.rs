use wheelhouse::CoordinatorError;
use wheelhouse_core::ConditionType;

use crate::helpers::{campaign_payload, condition, prize, spawn_coordinator};

#[tokio::test]
async fn test_progress_lazily_creates_participant() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![
                condition(ConditionType::GoogleReview, 0, true),
                condition(ConditionType::InstagramFollow, 1, false),
            ],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();

    let progress = coordinator
        .get_progress(detail.campaign.id, "new@example.com")
        .await
        .unwrap();

    assert_eq!(progress.participant.email, "new@example.com");
    assert_eq!(progress.participant.current_condition_order, 0);
    assert!(progress.completed_condition_ids.is_empty());
    assert!(!progress.can_play);
    assert!(!progress.all_conditions_completed);
    assert_eq!(
        progress.current_condition.as_ref().unwrap().id,
        detail.conditions[0].id
    );

    // Reading twice converges on the same participant row
    let again = coordinator
        .get_progress(detail.campaign.id, "new@example.com")
        .await
        .unwrap();
    assert_eq!(again.participant.id, progress.participant.id);
}

#[tokio::test]
async fn test_conditions_complete_strictly_in_order() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();
    let email = "ordered@example.com";

    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![
                condition(ConditionType::GoogleReview, 0, true),
                condition(ConditionType::InstagramFollow, 1, false),
                condition(ConditionType::NewsletterSignup, 2, false),
            ],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();
    let campaign_id = detail.campaign.id;

    // Order 1 before order 0 is rejected
    let skipped = coordinator
        .complete_condition(campaign_id, email, detail.conditions[1].id)
        .await;
    assert!(matches!(skipped, Err(CoordinatorError::BadRequest(_))));

    let first = coordinator
        .complete_condition(campaign_id, email, detail.conditions[0].id)
        .await
        .unwrap();
    assert!(first.success);
    assert!(first.enables_game);
    assert!(first.can_play);
    assert_eq!(first.next_condition_order, 1);

    // Completing the same condition twice is rejected
    let repeat = coordinator
        .complete_condition(campaign_id, email, detail.conditions[0].id)
        .await;
    assert!(matches!(repeat, Err(CoordinatorError::BadRequest(_))));

    // A condition from another campaign is not found
    let foreign = coordinator
        .complete_condition(campaign_id, email, uuid::Uuid::now_v7())
        .await;
    assert!(matches!(foreign, Err(CoordinatorError::NotFound(_))));

    let second = coordinator
        .complete_condition(campaign_id, email, detail.conditions[1].id)
        .await
        .unwrap();
    assert!(!second.enables_game);
    assert_eq!(second.next_condition_order, 2);

    coordinator
        .complete_condition(campaign_id, email, detail.conditions[2].id)
        .await
        .unwrap();
    let progress = coordinator.get_progress(campaign_id, email).await.unwrap();
    assert!(progress.all_conditions_completed);
    assert!(progress.current_condition.is_none());
}

#[tokio::test]
async fn test_store_level_completion_skips_repeat_conditions() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();
    let email = "returning@example.com";

    let first = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![condition(ConditionType::GoogleReview, 0, true)],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();
    coordinator
        .complete_condition(first.campaign.id, email, first.conditions[0].id)
        .await
        .unwrap();

    // New campaign at the same store with the same condition type at order
    // 0 plus a new step: the review auto-completes on the first read
    let second = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![
                condition(ConditionType::GoogleReview, 0, true),
                condition(ConditionType::NewsletterSignup, 1, false),
            ],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();

    let progress = coordinator
        .get_progress(second.campaign.id, email)
        .await
        .unwrap();
    assert_eq!(progress.participant.current_condition_order, 1);
    assert_eq!(
        progress.completed_condition_ids,
        vec![second.conditions[0].id]
    );
    assert_eq!(
        progress.current_condition.as_ref().unwrap().id,
        second.conditions[1].id
    );

    // A different store shares nothing
    let other_store = coordinator.create_store("Other Cafe".into()).await.unwrap();
    let elsewhere = coordinator
        .create_campaign(campaign_payload(
            other_store.id,
            vec![condition(ConditionType::GoogleReview, 0, true)],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();
    let progress = coordinator
        .get_progress(elsewhere.campaign.id, email)
        .await
        .unwrap();
    assert!(progress.completed_condition_ids.is_empty());
}

#[tokio::test]
async fn test_complete_game_condition() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();
    let email = "gamer@example.com";

    // Campaign without a play_game step reports that and changes nothing
    let plain = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![condition(ConditionType::GoogleReview, 0, true)],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();
    let result = coordinator
        .complete_game_condition(plain.campaign.id, email)
        .await
        .unwrap();
    assert!(!result.success);
    assert!(!result.has_game_condition);

    // Campaign where playing the game is itself the first step
    let gamed = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![
                condition(ConditionType::PlayGame, 0, false),
                condition(ConditionType::InstagramFollow, 1, false),
            ],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();

    let result = coordinator
        .complete_game_condition(gamed.campaign.id, email)
        .await
        .unwrap();
    assert!(result.success);
    assert!(result.has_game_condition);

    let progress = coordinator
        .get_progress(gamed.campaign.id, email)
        .await
        .unwrap();
    assert_eq!(progress.participant.current_condition_order, 1);

    // The only game step is done, a second report is rejected
    let repeat = coordinator
        .complete_game_condition(gamed.campaign.id, email)
        .await;
    assert!(matches!(repeat, Err(CoordinatorError::BadRequest(_))));
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

    let detail = coordinator
        .create_campaign(campaign_payload(
            store.id,
            vec![condition(ConditionType::GoogleReview, 0, true)],
            vec![prize("Gift", 10.0, 5)],
        ))
        .await
        .unwrap();

    let empty = coordinator.get_progress(detail.campaign.id, "  ").await;
    assert!(matches!(empty, Err(CoordinatorError::BadRequest(_))));

    let malformed = coordinator
        .get_progress(detail.campaign.id, "not-an-email")
        .await;
    assert!(matches!(malformed, Err(CoordinatorError::BadRequest(_))));
}
