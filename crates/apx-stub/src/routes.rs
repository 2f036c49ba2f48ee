//! Route definitions for the portal stub.
//!
//! Implements the endpoints `apx-client` calls. Each list endpoint answers
//! with a different envelope, as the portal backend does:
//!
//! | Route | Envelope |
//! |-------|----------|
//! | `GET /api-definitions/:id/publish-records` | `{code, data: {content, totalElements}}` |
//! | `GET /api-definitions/:id/publish-history` | `{content, totalElements}` |
//! | `GET /gateways` | `{data: [..]}` |
//! | `POST /api-definitions/:id/publish` | `{code, data: record}` |
//! | `DELETE /api-definitions/:id/publish/:record_id` | `{code, data: record}` |
//!
//! Errors are `{code, message}` with a matching HTTP status.

use apx_core::ApiDefinitionId;
use apx_publish::PublishRequest;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::store::{AppState, StubError};

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/gateways", get(list_gateways))
        .route("/api-definitions/:api_id/publish-records", get(list_records))
        .route("/api-definitions/:api_id/publish-history", get(list_history))
        .route("/api-definitions/:api_id/publish", post(publish))
        .route("/api-definitions/:api_id/publish/:record_id", delete(unpublish))
        .fallback(not_implemented)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::UnknownGateway(_) | Self::UnknownRecord(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::InvalidRequest(_) | Self::Core(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::GatewayFailure(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
        };
        tracing::debug!(%status, error = %self, "request rejected");
        (status, Json(json!({"code": code, "message": self.to_string()}))).into_response()
    }
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> StatusCode {
    StatusCode::OK
}

// ── Listing ─────────────────────────────────────────────────────────

/// Zero-based page query.
#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: usize,
    #[serde(default = "default_size")]
    size: usize,
}

fn default_size() -> usize {
    10
}

impl PageQuery {
    fn slice<T: Clone>(&self, all: &[T]) -> Vec<T> {
        let size = self.size.max(1);
        all.iter().skip(self.page.saturating_mul(size)).take(size).cloned().collect()
    }
}

fn api_id(raw: &str) -> Result<ApiDefinitionId, StubError> {
    Ok(ApiDefinitionId::new(raw)?)
}

fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({"code": "SUCCESS", "data": data}))
}

async fn list_gateways(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Json<Value> {
    let gateways = query.slice(&state.gateways());
    Json(json!({ "data": gateways }))
}

async fn list_records(
    State(state): State<AppState>,
    Path(api_id_raw): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, StubError> {
    let api = api_id(&api_id_raw)?;
    let records = state.records(&api);
    Ok(success(json!({
        "content": query.slice(&records),
        "totalElements": records.len(),
    })))
}

async fn list_history(
    State(state): State<AppState>,
    Path(api_id_raw): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, StubError> {
    let api = api_id(&api_id_raw)?;
    let history = state.history(&api);
    Ok(Json(json!({
        "content": query.slice(&history),
        "totalElements": history.len(),
    })))
}

// ── Actions ─────────────────────────────────────────────────────────

async fn publish(
    State(state): State<AppState>,
    Path(api_id_raw): Path<String>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<Value>, StubError> {
    let api = api_id(&api_id_raw)?;
    let record = state.publish(&api, body)?;
    Ok(success(record))
}

async fn unpublish(
    State(state): State<AppState>,
    Path((api_id_raw, record_id)): Path<(String, String)>,
) -> Result<Json<Value>, StubError> {
    let api = api_id(&api_id_raw)?;
    let record = state.unpublish(&api, &record_id)?;
    Ok(success(record))
}

async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::default_gateways;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app() -> Router {
        router(AppState::with_gateways(default_gateways()))
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn publish_req(api: &str, gateway: &str, base_path: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(format!("/api-definitions/{api}/publish"))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_string(&json!({
                    "gatewayId": gateway,
                    "publishConfig": {
                        "gatewayId": gateway,
                        "basePath": base_path,
                        "domains": ["a.com", "b.com"]
                    },
                    "comment": "v1"
                }))
                .unwrap(),
            ))
            .unwrap()
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_returns_200() {
        let resp = test_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn gateways_use_data_array_envelope() {
        let resp = test_app().oneshot(get("/gateways?page=0&size=100")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let gateways = body["data"].as_array().unwrap();
        assert_eq!(gateways.len(), default_gateways().len());
        assert!(gateways.iter().any(|g| g["gatewayType"] == "HIGRESS"));
    }

    #[tokio::test]
    async fn publish_lifecycle_over_http() {
        let app = test_app();

        let resp = app.clone().oneshot(publish_req("api-1", "gw-higress", "/v1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await;
        assert_eq!(created["code"], "SUCCESS");
        assert_eq!(created["data"]["status"], "ACTIVE");
        let record_id = created["data"]["recordId"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(get("/api-definitions/api-1/publish-records?page=0&size=10"))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["totalElements"], 1);
        assert_eq!(body["data"]["content"][0]["recordId"], record_id.as_str());

        let req = axum::http::Request::builder()
            .method("DELETE")
            .uri(format!("/api-definitions/api-1/publish/{record_id}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"]["status"], "INACTIVE");

        let resp = app
            .clone()
            .oneshot(get("/api-definitions/api-1/publish-history?page=0&size=10"))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["totalElements"], 2);
        assert_eq!(body["content"][0]["action"], "UNPUBLISH");
        assert_eq!(body["content"][1]["action"], "PUBLISH");
        assert_eq!(body["content"][1]["snapshot"]["basePath"], "/v1");
    }

    #[tokio::test]
    async fn second_publish_returns_409() {
        let app = test_app();
        app.clone().oneshot(publish_req("api-1", "gw-higress", "/")).await.unwrap();
        let resp = app.clone().oneshot(publish_req("api-1", "gw-apig", "/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = body_json(resp).await;
        assert_eq!(body["code"], "CONFLICT");
        assert!(body["message"].as_str().unwrap().contains("Higress Edge"));
    }

    #[tokio::test]
    async fn unknown_gateway_returns_404() {
        let resp = test_app().oneshot(publish_req("api-1", "gw-none", "/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn relative_base_path_returns_422() {
        let resp = test_app().oneshot(publish_req("api-1", "gw-higress", "v1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn failing_gateway_returns_502_and_records_failure() {
        let app = test_app();
        let resp = app.clone().oneshot(publish_req("api-1", "fail-gateway", "/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("rejected the route"));

        let resp = app
            .clone()
            .oneshot(get("/api-definitions/api-1/publish-records"))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["content"][0]["status"], "FAILED");
    }

    #[tokio::test]
    async fn unpublish_unknown_record_returns_404() {
        let req = axum::http::Request::builder()
            .method("DELETE")
            .uri("/api-definitions/api-1/publish/nope")
            .body(Body::empty())
            .unwrap();
        let resp = test_app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pagination_slices_history() {
        let app = test_app();
        let created = body_json(app.clone().oneshot(publish_req("api-1", "gw-higress", "/")).await.unwrap()).await;
        let record_id = created["data"]["recordId"].as_str().unwrap().to_string();
        let req = axum::http::Request::builder()
            .method("DELETE")
            .uri(format!("/api-definitions/api-1/publish/{record_id}"))
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(req).await.unwrap();

        let resp = app
            .clone()
            .oneshot(get("/api-definitions/api-1/publish-history?page=1&size=1"))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["totalElements"], 2);
        assert_eq!(body["content"].as_array().unwrap().len(), 1);
        assert_eq!(body["content"][0]["action"], "PUBLISH");
    }

    #[tokio::test]
    async fn unknown_path_returns_501() {
        let resp = test_app().oneshot(get("/some/unknown/path")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
