use crate::common::{TestApp, routes};
use serde_json::json;

mod registration {
    use super::*;

    #[tokio::test]
    async fn admin_registers_participant_with_empty_ledger() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(
                routes::PARTICIPANTS,
                &json!({ "name": "Ada", "email": "Ada@Example.com" }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Ada");
        assert_eq!(res.body["email"], "ada@example.com");
        assert_eq!(res.body["role"], "participant");
        assert_eq!(res.body["total_points"], 0);
        assert_eq!(res.body["streak"], 0);
        assert!(res.body["last_participated_round_end"].is_null());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.create_participant("ada").await;

        let res = app
            .post_with_token(
                routes::PARTICIPANTS,
                &json!({ "name": "Other Ada", "email": "ADA@example.com" }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(
                routes::PARTICIPANTS,
                &json!({ "name": "Ada", "email": "not-an-email" }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn participant_cannot_register_others() {
        let app = TestApp::spawn().await;
        let ada = app.create_participant("ada").await;

        let res = app
            .post_with_token(
                routes::PARTICIPANTS,
                &json!({ "name": "Bob", "email": "bob@example.com" }),
                &ada.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn participants_are_sorted_by_name() {
        let app = TestApp::spawn().await;
        let carol = app.create_participant("carol").await;
        app.create_participant("alice").await;
        app.create_participant("bob").await;

        let res = app.get_with_token(routes::PARTICIPANTS, &carol.token).await;

        assert_eq!(res.status, 200);
        let names: Vec<_> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_points() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let carol = app.create_participant("carol").await;
        let round_id = app
            .create_round("June", "2024-06-03T09:00:00Z", "2024-06-09T18:00:00Z")
            .await;
        app.post_with_token(
            &format!("/api/v1/rounds/{round_id}/close"),
            &json!({ "ratings": [
                { "user_id": bob.id, "stars": 5 },
                { "user_id": carol.id, "stars": 2 },
            ] }),
            &app.admin_token(),
        )
        .await;

        let res = app.get_with_token(routes::LEADERBOARD, &alice.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let board = res.body.as_array().unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board[0]["name"], "bob");
        assert_eq!(board[0]["rank"], 1);
        assert_eq!(board[0]["total_points"], 10);
        assert_eq!(board[1]["name"], "carol");
        assert_eq!(board[2]["name"], "alice");
        assert_eq!(board[2]["rank"], 3);
    }

    #[tokio::test]
    async fn stats_reflect_active_round() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        app.create_participant("bob").await;
        app.create_round("June", "2024-06-03T09:00:00Z", "2024-06-09T18:00:00Z")
            .await;

        let res = app.get_with_token(routes::STATS, &alice.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(
            res.body,
            json!({
                "participant_count": 2,
                "round_count": 1,
                "has_active": true,
                "active_title": "June",
            })
        );
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_participant() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;

        let res = app
            .delete_with_token(&routes::participant(alice.id), &app.admin_token())
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(routes::ME, &alice.token).await;
        assert_eq!(res.status, 404);

        let res = app
            .delete_with_token(&routes::participant(alice.id), &app.admin_token())
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn bulk_delete_reports_count() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;
        let bob = app.create_participant("bob").await;
        let carol = app.create_participant("carol").await;

        let res = app
            .post_with_token(
                routes::BULK_DELETE,
                &json!({ "ids": [alice.id, bob.id, 999] }),
                &app.admin_token(),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["deleted"], 2);

        let res = app.get_with_token(routes::PARTICIPANTS, &carol.token).await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bulk_delete_requires_participant_manage() {
        let app = TestApp::spawn().await;
        let alice = app.create_participant("alice").await;

        let res = app
            .post_with_token(routes::BULK_DELETE, &json!({ "ids": [alice.id] }), &alice.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}
