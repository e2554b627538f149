use std::net::SocketAddr;
use std::sync::Arc;

use common::Role;
use engine::{MemoryStore, TracingNotifier};
use reqwest::Client;
use serde_json::Value;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ReminderConfig, ServerConfig,
};
use server::state::AppState;
use server::utils::jwt;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

/// Participant id carried by the admin token. Admins are not scored, so the
/// id does not need a registry row.
pub const ADMIN_ID: i32 = 10_000;

pub mod routes {
    pub const ROUNDS: &str = "/api/v1/rounds";
    pub const ACTIVE_ROUND: &str = "/api/v1/rounds/active";
    pub const PARTICIPANTS: &str = "/api/v1/participants";
    pub const ME: &str = "/api/v1/participants/me";
    pub const STATS: &str = "/api/v1/participants/stats";
    pub const BULK_DELETE: &str = "/api/v1/participants/bulk-delete";
    pub const LEADERBOARD: &str = "/api/v1/leaderboard";

    pub fn round(id: i32) -> String {
        format!("/api/v1/rounds/{id}")
    }

    pub fn close(id: i32) -> String {
        format!("/api/v1/rounds/{id}/close")
    }

    pub fn vote(id: i32) -> String {
        format!("/api/v1/rounds/{id}/vote")
    }

    pub fn submit(id: i32) -> String {
        format!("/api/v1/rounds/{id}/submit")
    }

    pub fn aggregate(id: i32, candidate_id: i32) -> String {
        format!("/api/v1/rounds/{id}/candidates/{candidate_id}/aggregate")
    }

    pub fn participant(id: i32) -> String {
        format!("/api/v1/participants/{id}")
    }
}

/// A running test server backed by an in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// A registered participant and a token issued for them.
pub struct TestParticipant {
    pub id: i32,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "unused".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            reminder: ReminderConfig {
                enabled: false,
                ..Default::default()
            },
        };

        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TracingNotifier),
            app_config,
        );
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_token(&self) -> String {
        token_for(ADMIN_ID, "admin", Role::Admin)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw_with_token(&self, path: &str, body: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Register a participant via the API and issue them a token.
    pub async fn create_participant(&self, name: &str) -> TestParticipant {
        let res = self
            .post_with_token(
                routes::PARTICIPANTS,
                &serde_json::json!({
                    "name": name,
                    "email": format!("{name}@example.com"),
                }),
                &self.admin_token(),
            )
            .await;
        assert_eq!(res.status, 201, "create_participant failed: {}", res.text);

        let id = res.id();
        TestParticipant {
            id,
            token: token_for(id, name, Role::Participant),
        }
    }

    /// Open a round via the API and return its `id`.
    pub async fn create_round(&self, title: &str, start: &str, end: &str) -> i32 {
        let res = self
            .post_with_token(
                routes::ROUNDS,
                &serde_json::json!({
                    "title": title,
                    "description": "Build a small tool",
                    "start_date": start,
                    "end_date": end,
                }),
                &self.admin_token(),
            )
            .await;
        assert_eq!(res.status, 201, "create_round failed: {}", res.text);
        res.id()
    }

    /// Cast a vote and assert it was accepted.
    pub async fn vote(&self, round_id: i32, voter: &TestParticipant, candidate_id: i32, rating: i32) {
        let res = self
            .post_with_token(
                &routes::vote(round_id),
                &serde_json::json!({ "candidate_id": candidate_id, "rating": rating }),
                &voter.token,
            )
            .await;
        assert_eq!(res.status, 204, "vote failed: {}", res.text);
    }
}

pub fn token_for(participant_id: i32, name: &str, role: Role) -> String {
    jwt::sign(
        JWT_SECRET,
        participant_id,
        name,
        role,
        role.default_permissions(),
    )
    .expect("Failed to sign test token")
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
