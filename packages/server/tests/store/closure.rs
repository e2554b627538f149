use common::RoundStatus;
use engine::closure::plan_closure;
use engine::model::{
    ClosurePlan, ClosureSnapshot, FinalRating, LedgerUpdate, Submission, Winner,
};
use engine::scoring::{ManualRating, ManualRatings};
use engine::store::{ArenaStore, StoreError};

use crate::common::{TestDb, at, new_round, scored};

#[tokio::test]
async fn closure_commits_ratings_ledgers_and_winner_together() {
    let test = TestDb::spawn().await;
    let alice = test.participant("alice").await;
    let bob = test.participant("bob").await;
    let carol = test.participant("carol").await;
    let round = test.open_round().await;

    test.vote(round.id, bob.id, alice.id, 7).await;
    test.vote(round.id, carol.id, alice.id, 9).await;
    test.vote(round.id, alice.id, bob.id, 2).await;

    let manual = ManualRatings::from_entries(&[ManualRating {
        participant_id: bob.id,
        stars: 5,
    }])
    .unwrap();
    let planner = move |snapshot: &ClosureSnapshot| plan_closure(snapshot, &manual);

    let detail = test
        .store
        .close_round(round.id, at(9), &planner)
        .await
        .unwrap();
    assert_eq!(detail.round.status, RoundStatus::Closed);
    assert_eq!(detail.round.winner_id, Some(bob.id));
    assert_eq!(detail.round.winner_points, 10);
    assert_eq!(detail.round.closed_at, Some(at(9)));
    assert_eq!(detail.votes.len(), 3);

    let mut stored = test.store.round_ratings(round.id).await.unwrap();
    stored.sort_by_key(|r| r.participant_id);
    assert_eq!(
        stored,
        [
            FinalRating {
                participant_id: alice.id,
                stars: 4,
                points: 8,
            },
            FinalRating {
                participant_id: bob.id,
                stars: 5,
                points: 10,
            },
        ]
    );

    let a = test.ledger(alice.id).await;
    assert_eq!(
        (a.total_points, a.total_votes_received, a.streak, a.latest_rating),
        (8, 2, 1, 4)
    );
    assert_eq!(a.last_participated_round_end, Some(at(9)));
    let b = test.ledger(bob.id).await;
    assert_eq!((b.total_points, b.total_votes_received, b.latest_rating), (10, 1, 5));
    let c = test.ledger(carol.id).await;
    assert_eq!((c.total_points, c.streak, c.latest_rating), (0, 0, 0));
}

#[tokio::test]
async fn second_close_fails_without_touching_ledgers() {
    let test = TestDb::spawn().await;
    let alice = test.participant("alice").await;
    let bob = test.participant("bob").await;
    let round = test.open_round().await;
    test.vote(round.id, bob.id, alice.id, 10).await;

    test.store.close_round(round.id, at(9), &scored).await.unwrap();
    let before = test.ledger(alice.id).await;

    let err = test
        .store
        .close_round(round.id, at(10), &scored)
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::RoundNotActive(round.id));

    assert_eq!(test.ledger(alice.id).await, before);
    assert_eq!(before.total_points, 10);
    assert_eq!(test.store.round_ratings(round.id).await.unwrap().len(), 1);
    let closed = test.store.find_round(round.id).await.unwrap().unwrap();
    assert_eq!(closed.closed_at, Some(at(9)));
}

#[tokio::test]
async fn earliest_submission_wins_a_tie() {
    let test = TestDb::spawn().await;
    let alice = test.participant("alice").await;
    let bob = test.participant("bob").await;
    let carol = test.participant("carol").await;
    let round = test.open_round().await;

    test.vote(round.id, carol.id, alice.id, 8).await;
    test.vote(round.id, carol.id, bob.id, 8).await;
    for (participant_id, day) in [(alice.id, 6), (bob.id, 5)] {
        test.store
            .upsert_submission(
                round.id,
                Submission {
                    participant_id,
                    url: format!("https://example.com/{participant_id}"),
                    updated_at: at(day),
                },
            )
            .await
            .unwrap();
    }

    let detail = test.store.close_round(round.id, at(9), &scored).await.unwrap();
    assert_eq!(detail.round.winner_id, Some(bob.id));
    assert_eq!(detail.submissions.len(), 2);
}

#[tokio::test]
async fn failed_closure_rolls_back_every_write() {
    let test = TestDb::spawn().await;
    let alice = test.participant("alice").await;
    let round = test.open_round().await;

    let alice_id = alice.id;
    let planner = move |_: &ClosureSnapshot| ClosurePlan {
        ratings: vec![FinalRating {
            participant_id: alice_id,
            stars: 5,
            points: 10,
        }],
        ledger: vec![
            LedgerUpdate {
                participant_id: alice_id,
                total_points: 99,
                total_votes_received: 3,
                streak: 4,
                latest_rating: 5,
                last_participated_round_end: Some(at(9)),
            },
            LedgerUpdate {
                participant_id: 9999,
                total_points: 10,
                total_votes_received: 0,
                streak: 1,
                latest_rating: 5,
                last_participated_round_end: Some(at(9)),
            },
        ],
        winner: Some(Winner {
            participant_id: alice_id,
            points: 10,
        }),
    };

    let err = test
        .store
        .close_round(round.id, at(9), &planner)
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::ParticipantNotFound(9999));

    let after = test.store.find_round(round.id).await.unwrap().unwrap();
    assert_eq!(after.status, RoundStatus::Active);
    assert_eq!(after.winner_id, None);
    assert!(test.store.round_ratings(round.id).await.unwrap().is_empty());
    let untouched = test.ledger(alice.id).await;
    assert_eq!(
        (untouched.total_points, untouched.streak, untouched.latest_rating),
        (0, 0, 0)
    );
    assert_eq!(untouched.last_participated_round_end, None);

    // The slot is still held and the round still closes normally.
    assert_eq!(
        test.store
            .insert_round_if_none_active(new_round("Other"))
            .await
            .unwrap_err(),
        StoreError::ActiveRoundExists
    );
    let detail = test.store.close_round(round.id, at(9), &scored).await.unwrap();
    assert_eq!(detail.round.status, RoundStatus::Closed);
}
