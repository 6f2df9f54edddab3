use wheelhouse::{CoordinatorError, WinnerStatus};

use crate::helpers::{campaign_payload, prize, spawn_coordinator};

#[tokio::test]
async fn test_claim_lifecycle() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

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
    let code = outcome.claim_code.unwrap();

    let winners = coordinator.list_winners(campaign_id).await.unwrap();
    assert_eq!(winners[0].status, WinnerStatus::Pending);

    let claimed = coordinator.claim_prize(&code).await.unwrap();
    assert_eq!(claimed.status, WinnerStatus::Claimed);
    assert!(claimed.winner.claimed_at.is_some());

    let again = coordinator.claim_prize(&code).await;
    match again {
        Err(CoordinatorError::BadRequest(message)) => {
            assert!(message.contains("already claimed"))
        }
        other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
    }

    let unknown = coordinator.claim_prize("ZZZ-ZZZ-ZZZ").await;
    assert!(matches!(unknown, Err(CoordinatorError::NotFound(_))));
}

#[tokio::test]
async fn test_winner_listing_requires_campaign() {
    let coordinator = spawn_coordinator().await;

    let missing = coordinator.list_winners(uuid::Uuid::now_v7()).await;
    assert!(matches!(missing, Err(CoordinatorError::NotFound(_))));
}

#[tokio::test]
async fn test_expiry_sweep_leaves_fresh_winners_alone() {
    let coordinator = spawn_coordinator().await;
    let store = coordinator.create_store("Corner Cafe".into()).await.unwrap();

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
    coordinator
        .play(campaign_id, "winner@example.com".into(), None)
        .await
        .unwrap();

    assert_eq!(coordinator.expire_winners().await.unwrap(), 0);

    let winners = coordinator.list_winners(campaign_id).await.unwrap();
    assert_eq!(winners[0].status, WinnerStatus::Pending);
    assert!(winners[0].winner.expired_at.is_none());
}
