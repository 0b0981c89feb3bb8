pub mod contacts;
pub mod conversations;
pub mod messages;
pub mod system;

use crate::common::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(system::config))
        .route("/system/errors", get(system::recent_errors))
        .route(
            "/conversations",
            get(conversations::fetch_all).post(conversations::start),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            get(messages::fetch_all).post(messages::send),
        )
        .route(
            "/conversations/{conversation_id}/messages/check",
            post(messages::check),
        )
        .route(
            "/conversations/{conversation_id}/read",
            post(messages::mark_all_read),
        )
        .route("/messages/{message_id}/read", post(messages::mark_read))
        .route("/contacts", get(contacts::fetch_all))
}

#[cfg(test)]
mod tests {
    use crate::api;
    use crate::common::state::AppState;
    use crate::common::testing::{self, ADMIN_TOKEN, MENTOR_ID, MENTOR_TOKEN, STUDENT_TOKEN};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
    }

    impl TestApp {
        async fn new() -> Self {
            let state = testing::state().await;
            let router = api::router().with_state(state.clone());
            Self { router, state }
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        async fn start_conversation(&self) -> String {
            let (status, body) = self
                .call(
                    "POST",
                    "/api/v1/conversations",
                    Some(STUDENT_TOKEN),
                    Some(json!({ "counterpart_id": MENTOR_ID })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["conversation_id"].as_str().unwrap().to_owned()
        }
    }

    #[tokio::test]
    async fn index_reports_the_service() {
        let app = TestApp::new().await;
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("Running mentor-chat-service"));
    }

    #[tokio::test]
    async fn requests_without_a_session_are_rejected() {
        let app = TestApp::new().await;
        for token in [None, Some("bogus")] {
            let (status, body) = app.call("GET", "/api/v1/conversations", token, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["code"], "unauthorized");
        }
    }

    #[tokio::test]
    async fn config_exposes_the_limits() {
        let app = TestApp::new().await;
        let (status, body) = app.call("GET", "/api/v1/config", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["max_length"], 120);
        assert_eq!(
            body["preset_messages"][0],
            "I'm interested in booking a conversation"
        );
    }

    #[tokio::test]
    async fn gated_conversation_over_http() {
        let app = TestApp::new().await;
        let id = app.start_conversation().await;
        let messages_uri = format!("/api/v1/conversations/{id}/messages");

        let (status, body) = app
            .call(
                "POST",
                &format!("{messages_uri}/check"),
                Some(STUDENT_TOKEN),
                Some(json!({ "content": "Hi there, can we talk?" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allowed"], false);
        assert_eq!(body["code"], "messages.payment_required");

        let (status, body) = app
            .call(
                "POST",
                &messages_uri,
                Some(STUDENT_TOKEN),
                Some(json!({ "content": "Hi there, can we talk?" })),
            )
            .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["code"], "messages.payment_required");

        let (status, sent) = app
            .call(
                "POST",
                &messages_uri,
                Some(STUDENT_TOKEN),
                Some(json!({
                    "content": "I'm interested in booking a conversation",
                    "is_preset": true,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sent["is_preset"], true);

        let (status, body) = app
            .call("POST", &messages_uri, Some(MENTOR_TOKEN), Some(json!({ "content": "x".repeat(121) })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "messages.too_long");

        let (_, contacts) = app.call("GET", "/api/v1/contacts", Some(MENTOR_TOKEN), None).await;
        assert_eq!(contacts[0]["unread_count"], 1);

        let message_id = sent["message_id"].as_i64().unwrap();
        let read_uri = format!("/api/v1/messages/{message_id}/read");
        let (status, body) = app.call("POST", &read_uri, Some(STUDENT_TOKEN), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "messages.not_recipient");
        let (status, body) = app.call("POST", &read_uri, Some(MENTOR_TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["read_at"].is_string());

        let (_, contacts) = app.call("GET", "/api/v1/contacts", Some(MENTOR_TOKEN), None).await;
        assert_eq!(contacts[0]["unread_count"], 0);
    }

    #[tokio::test]
    async fn messages_can_be_fetched_after_a_cursor() {
        let app = TestApp::new().await;
        let id = app.start_conversation().await;
        let messages_uri = format!("/api/v1/conversations/{id}/messages");
        let mut ids = vec![];
        for content in ["first", "second"] {
            let (_, sent) = app
                .call("POST", &messages_uri, Some(MENTOR_TOKEN), Some(json!({ "content": content })))
                .await;
            ids.push(sent["message_id"].as_i64().unwrap());
        }

        let (status, body) = app
            .call("GET", &format!("{messages_uri}?after={}", ids[0]), Some(STUDENT_TOKEN), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["content"], "second");

        let (status, body) = app
            .call(
                "GET",
                &format!("{messages_uri}?after={}&wait_ms=20", ids[1]),
                Some(STUDENT_TOKEN),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = app
            .call("POST", &format!("/api/v1/conversations/{id}/read"), Some(STUDENT_TOKEN), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["marked"], 2);
    }

    #[tokio::test]
    async fn students_cannot_open_free_conversations() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call(
                "POST",
                "/api/v1/conversations",
                Some(STUDENT_TOKEN),
                Some(json!({ "counterpart_id": MENTOR_ID, "engagement": "free" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payment_status"], "pending");

        let id = body["conversation_id"].as_str().unwrap();
        let (status, body) = app
            .call(
                "POST",
                &format!("/api/v1/conversations/{id}/messages"),
                Some(STUDENT_TOKEN),
                Some(json!({ "content": "Hi there, can we talk?" })),
            )
            .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["code"], "messages.payment_required");
    }

    #[tokio::test]
    async fn recent_errors_need_the_admin_token() {
        let app = TestApp::new().await;
        for (token, expected) in [
            (None, StatusCode::UNAUTHORIZED),
            (Some(STUDENT_TOKEN), StatusCode::FORBIDDEN),
            (Some(MENTOR_TOKEN), StatusCode::FORBIDDEN),
        ] {
            let (status, _) = app.call("GET", "/api/v1/system/errors", token, None).await;
            assert_eq!(status, expected);
        }

        let (status, body) = app
            .call("GET", "/api/v1/system/errors", Some(ADMIN_TOKEN), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert!(app.state.error_log.recent().is_empty());
    }
}
