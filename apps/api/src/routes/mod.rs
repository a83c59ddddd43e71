pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::review::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_end_session),
        )
        .route(
            "/api/v1/sessions/:id/credential",
            put(handlers::handle_set_credential),
        )
        // Review intake and analysis
        .route(
            "/api/v1/sessions/:id/reviews",
            post(handlers::handle_submit_review),
        )
        .route(
            "/api/v1/sessions/:id/analyze",
            post(handlers::handle_analyze),
        )
        .route(
            "/api/v1/sessions/:id/analysis",
            get(handlers::handle_get_analysis),
        )
        .route(
            "/api/v1/sessions/:id/analysis/export.csv",
            get(handlers::handle_export_csv),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt; // for `oneshot`

    use super::*;
    use crate::config::Config;
    use crate::review::analysis::tests::{ScriptedModel, SAMPLE_REPLY};
    use crate::review::session::SUBMISSION_CAP;

    fn setup_app(model: ScriptedModel, default_api_key: Option<&str>) -> Router {
        let config = Config {
            default_api_key: default_api_key.map(str::to_string),
            ..Config::default()
        };
        build_router(AppState::new(Arc::new(model), config))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body")
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).expect("Should parse JSON")
    }

    async fn create_session(app: &Router, body: Value) -> String {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/sessions", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn submit(app: &Router, id: &str, text: &str) -> Response {
        app.clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/sessions/{id}/reviews"),
                json!({ "text": text }),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = setup_app(ScriptedModel::replying(SAMPLE_REPLY), None);
        let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_full_flow_table_score_tags_and_csv() {
        let app = setup_app(ScriptedModel::replying(SAMPLE_REPLY), None);
        let id = create_session(&app, json!({ "api_key": "sk-test" })).await;

        for text in ["great food, slow service", "not about food at all"] {
            let response = submit(&app, &id, text).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["accepted"], true);
        }

        let response = app
            .clone()
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/analyze")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        assert_eq!(report["score"], 5.0);
        assert_eq!(report["records"].as_array().unwrap().len(), 1);
        assert_eq!(report["records"][0]["tags"], "food, service");
        assert_eq!(report["tags"]["blob"], "food service");
        assert_eq!(report["breakdown"]["positive"], 1);

        let response = app
            .clone()
            .oneshot(empty_request(
                "GET",
                &format!("/api/v1/sessions/{id}/analysis/export.csv"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"review_analysis.csv\""
        );
        let csv = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(csv, "Sentiment,Keywords,Tags\nPositive,food,\"food, service\"\n");
    }

    #[tokio::test]
    async fn test_submission_cap_returns_429() {
        let app = setup_app(ScriptedModel::replying(SAMPLE_REPLY), None);
        let id = create_session(&app, json!({})).await;

        for i in 0..SUBMISSION_CAP {
            let response = submit(&app, &id, &format!("review {i}")).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = submit(&app, &id, "one too many").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "SUBMISSION_REJECTED"
        );

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/sessions/{id}")))
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["submission_count"], SUBMISSION_CAP);
        assert_eq!(status["submission_phase"], "limited");
    }

    #[tokio::test]
    async fn test_empty_submission_not_accepted() {
        let app = setup_app(ScriptedModel::replying(SAMPLE_REPLY), None);
        let id = create_session(&app, json!({})).await;
        let body = body_json(submit(&app, &id, "").await).await;
        assert_eq!(body["accepted"], false);
        assert_eq!(body["submission_count"], 0);

        let body = body_json(submit(&app, &id, "   ").await).await;
        assert_eq!(body["accepted"], true);
        assert_eq!(body["submission_count"], 1);
    }

    #[tokio::test]
    async fn test_analyze_without_reviews_is_empty_input() {
        let app = setup_app(ScriptedModel::replying(SAMPLE_REPLY), Some("sk-default"));
        let id = create_session(&app, json!({})).await;
        let response = app
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/analyze")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "EMPTY_INPUT");
    }

    #[tokio::test]
    async fn test_model_failure_then_new_credential() {
        let app = setup_app(ScriptedModel::failing(401), Some("sk-default"));
        let id = create_session(&app, json!({})).await;
        submit(&app, &id, "great food").await;

        let response = app
            .clone()
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/analyze")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "MODEL_UNAVAILABLE");

        let response = app
            .clone()
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/analyze")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/sessions/{id}/credential"),
                json!({ "api_key": "sk-fresh" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        assert_eq!(status["ready"], true);
        assert_eq!(status["reviews"][0], "great food");
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_unprocessable() {
        let app = setup_app(ScriptedModel::replying("Sorry, I can't help with that."), None);
        let id = create_session(&app, json!({ "api_key": "sk-test" })).await;
        submit(&app, &id, "great food").await;

        let response = app
            .clone()
            .oneshot(empty_request("POST", &format!("/api/v1/sessions/{id}/analyze")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["code"], "NO_VALID_RECORDS");

        let response = app
            .oneshot(empty_request("GET", &format!("/api/v1/sessions/{id}/analysis")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ended_session_is_gone() {
        let app = setup_app(ScriptedModel::replying(SAMPLE_REPLY), None);
        let id = create_session(&app, json!({})).await;

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/api/v1/sessions/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = submit(&app, &id, "hello?").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_idle_session_returns_404() {
        let config = Config {
            session_idle_minutes: 0,
            ..Config::default()
        };
        let app = build_router(AppState::new(
            Arc::new(ScriptedModel::replying(SAMPLE_REPLY)),
            config,
        ));
        let id = create_session(&app, json!({})).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let response = app
            .oneshot(empty_request("GET", &format!("/api/v1/sessions/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }
}
