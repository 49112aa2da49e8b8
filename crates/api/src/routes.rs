use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use grantscout_core::advisory::{AdvisoryComposer, AdvisoryResult};
use grantscout_core::grants::GrantsSearch;
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, EMPTY_QUERY_MESSAGE};

#[derive(Clone)]
pub struct AppState {
    pub grants: Arc<dyn GrantsSearch>,
    pub advisory: AdvisoryComposer,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/opportunities", post(search_opportunities))
        .route("/api/search-grants", post(search_grants))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn search_opportunities(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(criteria) =
        body.map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e.body_text())))?;

    let data = state
        .grants
        .search(&criteria)
        .await
        .map_err(ApiError::from_forwarder)?;

    Ok(Json(data))
}

#[derive(Debug, Deserialize)]
struct SearchGrantsRequest {
    #[serde(default)]
    query: Option<Value>,
}

async fn search_grants(
    State(state): State<AppState>,
    body: Result<Json<SearchGrantsRequest>, JsonRejection>,
) -> Result<Json<AdvisoryResult>, ApiError> {
    let Ok(Json(req)) = body else {
        return Err(ApiError::bad_request(EMPTY_QUERY_MESSAGE));
    };

    let query = req.query.as_ref().and_then(Value::as_str);
    let result = state.advisory.compose(query).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use grantscout_core::advisory::AdvisoryOptions;
    use grantscout_core::error::{Upstream, UpstreamError};
    use grantscout_core::llm::{ChatMessage, CompletionClient, Provider};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    enum Reply {
        Json(Value),
        Status(u16, &'static str),
        Transport,
    }

    struct FakeGrants {
        reply: Reply,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl GrantsSearch for FakeGrants {
        async fn search(&self, _criteria: &Value) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Json(v) => Ok(v.clone()),
                Reply::Status(status, body) => Err(UpstreamError {
                    upstream: Upstream::GrantsGov,
                    status: reqwest_status(*status),
                    body: body.to_string(),
                }
                .into()),
                Reply::Transport => anyhow::bail!("dns error: no such host api.grants.gov"),
            }
        }
    }

    struct FakeLlm {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CompletionClient for FakeLlm {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        async fn complete(&self, _messages: Vec<ChatMessage>) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("secret-internal-detail: connection reset by peer");
            }
            Ok("  Apply to Solar Futures first.  ".to_string())
        }
    }

    fn reqwest_status(code: u16) -> grantscout_core::error::StatusCode {
        grantscout_core::error::StatusCode::from_u16(code).unwrap()
    }

    fn two_hits() -> Value {
        json!({"errorcode": 0, "data": {"hitCount": 2, "oppHits": [
            {"id": "1001", "title": "Solar Futures", "agency": "DOE", "openDate": "01/01/2026", "closeDate": "05/01/2026"},
            {"id": "1002", "title": "Wind Research", "agency": "NSF", "openDate": "12/15/2025"}
        ]}})
    }

    fn app(grants: Arc<FakeGrants>, llm: Option<Arc<FakeLlm>>) -> Router {
        let llm = llm.map(|l| l as Arc<dyn CompletionClient>);
        let advisory = AdvisoryComposer::new(
            grants.clone(),
            llm,
            AdvisoryOptions {
                rows: 5,
                include_close_date: true,
            },
        );
        router(AppState { grants, advisory })
    }

    fn grants(reply: Reply) -> Arc<FakeGrants> {
        Arc::new(FakeGrants {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    fn llm(fail: bool) -> Arc<FakeLlm> {
        Arc::new(FakeLlm {
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_body(resp: axum::http::Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let resp = app(grants(Reply::Json(json!({}))), None)
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn opportunities_passes_upstream_body_through() {
        let upstream = two_hits();
        let resp = app(grants(Reply::Json(upstream.clone())), None)
            .oneshot(post_json("/api/opportunities", r#"{"keyword":"solar","rows":10}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_body(resp).await, upstream);
    }

    #[tokio::test]
    async fn opportunities_relays_upstream_status_and_text() {
        let resp = app(grants(Reply::Status(400, "rows must be <= 5000")), None)
            .oneshot(post_json("/api/opportunities", r#"{"rows":99999}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_body(resp).await,
            json!({"error": "Grants.gov API error: rows must be <= 5000"})
        );
    }

    #[tokio::test]
    async fn opportunities_transport_failure_is_generic_500() {
        let resp = app(grants(Reply::Transport), None)
            .oneshot(post_json("/api/opportunities", "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_body(resp).await,
            json!({"error": "Server error while contacting Grants.gov"})
        );
    }

    #[tokio::test]
    async fn opportunities_rejects_malformed_json_with_json_error() {
        let fake = grants(Reply::Json(json!({})));
        let resp = app(fake.clone(), None)
            .oneshot(post_json("/api/opportunities", "{not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(read_body(resp).await["error"].is_string());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_grants_rejects_empty_query_without_outbound_calls() {
        for body in [r#"{"query":""}"#, r#"{"query":"   "}"#, "{}", r#"{"query":42}"#] {
            let fake_grants = grants(Reply::Json(two_hits()));
            let fake_llm = llm(false);
            let resp = app(fake_grants.clone(), Some(fake_llm.clone()))
                .oneshot(post_json("/api/search-grants", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(
                read_body(resp).await,
                json!({"error": "Missing or empty query"})
            );
            assert_eq!(fake_grants.calls.load(Ordering::SeqCst), 0);
            assert_eq!(fake_llm.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn search_grants_returns_grants_and_suggestions() {
        let resp = app(grants(Reply::Json(two_hits())), Some(llm(false)))
            .oneshot(post_json("/api/search-grants", r#"{"query":"clean energy"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = read_body(resp).await;
        let grants = body["grants"].as_array().unwrap();
        assert_eq!(grants.len(), 2);
        assert_eq!(
            grants[0],
            json!({
                "id": "1001",
                "title": "Solar Futures",
                "agency": "DOE",
                "openDate": "01/01/2026",
                "closeDate": "05/01/2026",
                "link": "https://www.grants.gov/search-results-detail/1001",
            })
        );
        assert_eq!(body["aiSuggestions"], "Apply to Solar Futures first.");
    }

    #[tokio::test]
    async fn search_grants_propagates_upstream_status() {
        let fake_llm = llm(false);
        let resp = app(
            grants(Reply::Status(503, "Service Unavailable")),
            Some(fake_llm.clone()),
        )
        .oneshot(post_json("/api/search-grants", r#"{"query":"water"}"#))
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = read_body(resp).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Service Unavailable"));
        assert_eq!(fake_llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_grants_transport_failure_is_generic_500() {
        let resp = app(grants(Reply::Transport), Some(llm(false)))
            .oneshot(post_json("/api/search-grants", r#"{"query":"water"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_body(resp).await, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn search_grants_completion_failure_does_not_leak_cause() {
        let resp = app(grants(Reply::Json(two_hits())), Some(llm(true)))
            .oneshot(post_json("/api/search-grants", r#"{"query":"water"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body(resp).await;
        assert_eq!(body, json!({"error": "Internal server error"}));
        assert!(!body.to_string().contains("secret-internal-detail"));
    }

    #[tokio::test]
    async fn search_grants_without_completion_client_omits_suggestions() {
        let resp = app(grants(Reply::Json(two_hits())), None)
            .oneshot(post_json("/api/search-grants", r#"{"query":"water"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_body(resp).await;
        assert_eq!(body["grants"].as_array().unwrap().len(), 2);
        assert!(body.get("aiSuggestions").is_none());
    }
}
