use crate::common::{TestApp, routes, token_for};
use common::Role;
use serde_json::json;

const START: &str = "2024-06-03T09:00:00Z";
const END: &str = "2024-06-09T18:00:00Z";

mod round_creation {
    use super::*;

    #[tokio::test]
    async fn admin_can_open_a_round() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(
                routes::ROUNDS,
                &json!({
                    "title": "June build",
                    "description": "Ship a CLI",
                    "start_date": START,
                    "end_date": END,
                }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "June build");
        assert_eq!(res.body["status"], "active");
        assert_eq!(res.body["winner_points"], 0);
        assert!(res.body["winner_id"].is_null());
    }

    #[tokio::test]
    async fn accepts_camel_case_dates() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(
                routes::ROUNDS,
                &json!({
                    "title": "Camel",
                    "description": "desc",
                    "startDate": START,
                    "endDate": END,
                }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn second_active_round_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.create_round("First", START, END).await;

        let res = app
            .post_with_token(
                routes::ROUNDS,
                &json!({
                    "title": "Second",
                    "description": "desc",
                    "start_date": START,
                    "end_date": END,
                }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn end_before_start_is_an_invalid_range() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(
                routes::ROUNDS,
                &json!({
                    "title": "Backwards",
                    "description": "desc",
                    "start_date": END,
                    "end_date": START,
                }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_RANGE");
    }

    #[tokio::test]
    async fn missing_title_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(
                routes::ROUNDS,
                &json!({ "description": "desc", "start_date": START, "end_date": END }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_raw_with_token(routes::ROUNDS, "{not json", &app.admin_token())
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn participant_cannot_open_a_round() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;

        let res = app
            .post_with_token(
                routes::ROUNDS,
                &json!({
                    "title": "Mine",
                    "description": "desc",
                    "start_date": START,
                    "end_date": END,
                }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn requests_without_token_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ACTIVE_ROUND).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get_with_token(routes::ACTIVE_ROUND, "garbage").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod voting {
    use super::*;

    #[tokio::test]
    async fn revote_replaces_the_earlier_rating() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let round_id = app.create_round("June", START, END).await;

        app.vote(round_id, &alice, bob.id, 3).await;
        app.vote(round_id, &alice, bob.id, 9).await;

        let res = app
            .get_with_token(&routes::aggregate(round_id, bob.id), &app.admin_token())
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, json!({ "sum": 9, "count": 1 }));
    }

    #[tokio::test]
    async fn self_vote_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let round_id = app.create_round("June", START, END).await;

        let res = app
            .post_with_token(
                &routes::vote(round_id),
                &json!({ "candidate_id": alice.id, "rating": 8 }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn out_of_scale_rating_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let round_id = app.create_round("June", START, END).await;

        for rating in [0, 11] {
            let res = app
                .post_with_token(
                    &routes::vote(round_id),
                    &json!({ "candidate_id": bob.id, "rating": rating }),
                    &alice.token,
                )
                .await;
            assert_eq!(res.status, 400);
        }
    }

    #[tokio::test]
    async fn vote_for_unknown_candidate_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let round_id = app.create_round("June", START, END).await;

        let res = app
            .post_with_token(
                &routes::vote(round_id),
                &json!({ "candidate_id": 4242, "rating": 5 }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn aggregate_requires_round_manage() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let round_id = app.create_round("June", START, END).await;

        let res = app
            .get_with_token(&routes::aggregate(round_id, alice.id), &alice.token)
            .await;
        assert_eq!(res.status, 403);
    }
}

mod closure {
    use super::*;

    #[tokio::test]
    async fn close_scores_participants_and_picks_winner() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let carol = app.create_participant("carol").await;
        let round_id = app.create_round("June", START, END).await;

        app.vote(round_id, &bob, alice.id, 7).await;
        app.vote(round_id, &carol, alice.id, 9).await;
        app.vote(round_id, &alice, bob.id, 2).await;

        let res = app
            .post_with_token(
                &routes::close(round_id),
                &json!({ "ratings": [{ "user_id": bob.id, "stars": 5 }] }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "closed");
        assert_eq!(res.body["winner_id"], bob.id);
        assert_eq!(res.body["winner_points"], 10);
        assert_eq!(res.body["ratings"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["votes"].as_array().unwrap().len(), 3);

        let me = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(me.body["total_points"], 8);
        assert_eq!(me.body["total_votes_received"], 2);
        assert_eq!(me.body["streak"], 1);
        assert_eq!(me.body["latest_rating"], 4);

        let me = app.get_with_token(routes::ME, &carol.token).await;
        assert_eq!(me.body["total_points"], 0);
        assert_eq!(me.body["streak"], 0);
        assert_eq!(me.body["latest_rating"], 0);
    }

    #[tokio::test]
    async fn second_close_is_an_invalid_state() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let round_id = app.create_round("June", START, END).await;
        app.vote(round_id, &bob, alice.id, 10).await;

        let first = app
            .post_with_token(&routes::close(round_id), &json!({}), &app.admin_token())
            .await;
        assert_eq!(first.status, 200, "{}", first.text);

        let second = app
            .post_with_token(
                &routes::close(round_id),
                &json!({ "ratings": [{ "user_id": alice.id, "stars": 1 }] }),
                &app.admin_token(),
            )
            .await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "INVALID_STATE");

        let me = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(me.body["total_points"], 10);
        assert_eq!(me.body["latest_rating"], 5);
    }

    #[tokio::test]
    async fn stars_above_five_are_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let round_id = app.create_round("June", START, END).await;

        let res = app
            .post_with_token(
                &routes::close(round_id),
                &json!({ "ratings": [{ "userId": alice.id, "stars": 6 }] }),
                &app.admin_token(),
            )
            .await;
        assert_eq!(res.status, 400);

        let round = app.get_with_token(&routes::round(round_id), &alice.token).await;
        assert_eq!(round.body["status"], "active");
    }

    #[tokio::test]
    async fn closed_round_rejects_votes_and_submissions() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let round_id = app.create_round("June", START, END).await;
        app.post_with_token(&routes::close(round_id), &json!({}), &app.admin_token())
            .await;

        let res = app
            .post_with_token(
                &routes::vote(round_id),
                &json!({ "candidate_id": bob.id, "rating": 5 }),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "INVALID_STATE");

        let res = app
            .post_with_token(
                &routes::submit(round_id),
                &json!({ "url": "https://example.com/alice" }),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn active_view_shows_latest_winner() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let round_id = app.create_round("June", START, END).await;
        app.post_with_token(
            &routes::close(round_id),
            &json!({ "ratings": [{ "user_id": alice.id, "stars": 3 }] }),
            &app.admin_token(),
        )
        .await;

        let res = app.get_with_token(routes::ACTIVE_ROUND, &alice.token).await;
        assert_eq!(res.status, 200);
        assert!(res.body["round"].is_null());
        assert_eq!(res.body["latest_winner"]["id"], round_id);
        assert_eq!(res.body["latest_winner"]["winner_name"], "alice");
    }
}

mod editing {
    use super::*;

    #[tokio::test]
    async fn submission_is_recorded_and_replaced() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let round_id = app.create_round("June", START, END).await;

        for url in ["https://example.com/v1", "https://example.com/v2"] {
            let res = app
                .post_with_token(&routes::submit(round_id), &json!({ "url": url }), &alice.token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let res = app.get_with_token(&routes::round(round_id), &alice.token).await;
        let submissions = res.body["submissions"].as_array().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0]["url"], "https://example.com/v2");
    }

    #[tokio::test]
    async fn update_keeps_blank_fields() {
        let app = TestApp::spawn().await;
        let round_id = app.create_round("June", START, END).await;

        let res = app
            .put_with_token(
                &routes::round(round_id),
                &json!({ "title": "  ", "description": "New brief" }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "June");
        assert_eq!(res.body["description"], "New brief");
    }

    #[tokio::test]
    async fn deleted_round_is_gone_but_points_remain() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let round_id = app.create_round("June", START, END).await;
        app.post_with_token(
            &routes::close(round_id),
            &json!({ "ratings": [{ "user_id": alice.id, "stars": 4 }] }),
            &app.admin_token(),
        )
        .await;

        let res = app
            .delete_with_token(&routes::round(round_id), &app.admin_token())
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::round(round_id), &alice.token).await;
        assert_eq!(res.status, 404);

        let me = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(me.body["total_points"], 8);
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_winner_names() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let first = app
            .create_round("First", "2024-06-03T09:00:00Z", "2024-06-09T18:00:00Z")
            .await;
        app.post_with_token(
            &routes::close(first),
            &json!({ "ratings": [{ "user_id": alice.id, "stars": 2 }] }),
            &app.admin_token(),
        )
        .await;
        let second = app
            .create_round("Second", "2024-06-10T09:00:00Z", "2024-06-16T18:00:00Z")
            .await;

        let res = app.get_with_token(routes::ROUNDS, &app.admin_token()).await;
        assert_eq!(res.status, 200);
        let rounds = res.body.as_array().unwrap();
        assert_eq!(rounds[0]["id"], second);
        assert_eq!(rounds[1]["id"], first);
        assert_eq!(rounds[1]["winner_name"], "alice");

        let participant_token = token_for(alice.id, "alice", Role::Participant);
        let res = app.get_with_token(routes::ROUNDS, &participant_token).await;
        assert_eq!(res.status, 403);
    }
}
