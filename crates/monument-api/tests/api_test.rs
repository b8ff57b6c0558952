//! End-to-end tests through the `axum` router (spec §8's concrete
//! scenarios), backed by a `tempfile`-rooted store.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use monument_api::{build_router, AppState, Registry, RegistryConfig};
use monument_engine::NamespaceConfig;
use monument_store::NamespaceDefaults;
use monument_world::Visibility;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_SECRET: &str = "admin-s3cret";

fn router(scoring_interval: u64) -> axum::Router {
    router_with_epoch(scoring_interval, 1_000_000)
}

fn router_with_epoch(scoring_interval: u64, epoch: u64) -> axum::Router {
    let dir = tempfile::tempdir().unwrap();
    let registry_config = RegistryConfig {
        data_dir: dir.path().to_path_buf(),
        busy_timeout: Duration::from_secs(1),
        defaults: NamespaceDefaults {
            width: 4,
            height: 4,
            epoch,
            visibility: Visibility::FullGrid,
            points_enabled: false,
        },
        namespace_config: NamespaceConfig {
            collect_timeout: Duration::from_secs(30),
            scoring_interval,
            chat_length: 10,
        },
    };
    // Leak the tempdir so the store file outlives the test function; the
    // OS reclaims it on process exit.
    std::mem::forget(dir);
    let state = AppState::new(Registry::new(registry_config), ADMIN_SECRET, 10, 5);
    build_router(state)
}

async fn call(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn register_body(id: &str, secret: &str, x: i32, y: i32, scopes: &[&str]) -> Value {
    json!({
        "id": id,
        "secret": secret,
        "x": x,
        "y": y,
        "facing": "N",
        "scopes": scopes,
        "custom_instructions": "",
    })
}

async fn register_actor(app: &axum::Router, ns: &str, id: &str, secret: &str, x: i32, y: i32, scopes: &[&str]) {
    let req = Request::builder()
        .method("POST")
        .uri(format!("/sim/{ns}/admin/actors"))
        .header("content-type", "application/json")
        .header("X-Admin-Secret", ADMIN_SECRET)
        .body(Body::from(register_body(id, secret, x, y, scopes).to_string()))
        .unwrap();
    let (status, body) = call(app, req).await;
    assert_eq!(status, StatusCode::OK, "register_actor failed: {body:?}");
}

async fn get_context(app: &axum::Router, ns: &str, id: &str, secret: &str) -> Value {
    let req = Request::builder()
        .method("GET")
        .uri(format!("/sim/{ns}/agent/{id}/context"))
        .header("X-Agent-Secret", secret)
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app, req).await;
    assert_eq!(status, StatusCode::OK, "get_context failed: {body:?}");
    body
}

async fn post_action(
    app: &axum::Router,
    ns: &str,
    id: &str,
    secret: &str,
    supertick_id: u64,
    context_hash: &str,
    action: &str,
) -> (StatusCode, Value) {
    let body = json!({
        "namespace": ns,
        "supertick_id": supertick_id,
        "context_hash": context_hash,
        "action": action,
    });
    let req = Request::builder()
        .method("POST")
        .uri(format!("/sim/{ns}/agent/{id}/action"))
        .header("content-type", "application/json")
        .header("X-Agent-Secret", secret)
        .body(Body::from(body.to_string()))
        .unwrap();
    call(app, req).await
}

#[tokio::test]
async fn liveness_probe_returns_ok() {
    let app = router(0);
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn admin_endpoints_reject_missing_secret() {
    let app = router(0);
    let req = Request::builder()
        .method("POST")
        .uri("/sim/arena/admin/actors")
        .header("content-type", "application/json")
        .body(Body::from(register_body("a", "s", 0, 0, &["WAIT"]).to_string()))
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unregistered_actor_context_is_not_found() {
    let app = router(0);
    let req = Request::builder()
        .method("GET")
        .uri("/sim/arena/agent/ghost/context")
        .header("X-Agent-Secret", "whatever")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scope_denied_action_returns_forbidden() {
    let app = router(0);
    register_actor(&app, "arena", "sup", "sup-secret", 0, 0, &["SPEAK", "WAIT", "SKIP"]).await;
    let ctx = get_context(&app, "arena", "sup", "sup-secret").await;
    let supertick_id = ctx["supertick_id"].as_u64().unwrap();
    let context_hash = ctx["context_hash"].as_str().unwrap();

    let (status, body) =
        post_action(&app, "arena", "sup", "sup-secret", supertick_id, context_hash, "PAINT #000000 0 0").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["detail"].as_str().unwrap().contains("ScopeDenied"));
}

#[tokio::test]
async fn duplicate_submission_in_the_same_tick_is_rejected() {
    let app = router(0);
    register_actor(&app, "arena", "a", "a-secret", 0, 0, &["WAIT"]).await;
    register_actor(&app, "arena", "b", "b-secret", 1, 1, &["WAIT"]).await;

    let ctx = get_context(&app, "arena", "a", "a-secret").await;
    let supertick_id = ctx["supertick_id"].as_u64().unwrap();
    let context_hash = ctx["context_hash"].as_str().unwrap();

    let (status, _) = post_action(&app, "arena", "a", "a-secret", supertick_id, context_hash, "WAIT").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_action(&app, "arena", "a", "a-secret", supertick_id, context_hash, "WAIT").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("already submitted"));
}

#[tokio::test]
async fn stale_supertick_after_tick_advance_is_rejected() {
    let app = router(0);
    register_actor(&app, "arena", "solo", "solo-secret", 0, 0, &["MOVE"]).await;

    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    let supertick_id = ctx["supertick_id"].as_u64().unwrap();
    let context_hash = ctx["context_hash"].as_str().unwrap();

    // Sole active actor: this submission resolves the tick immediately.
    let (status, _) = post_action(&app, "arena", "solo", "solo-secret", supertick_id, context_hash, "MOVE N").await;
    assert_eq!(status, StatusCode::OK);

    // Resubmitting against the now-stale tick/hash is rejected.
    let (status, body) =
        post_action(&app, "arena", "solo", "solo-secret", supertick_id, context_hash, "MOVE N").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("Supertick mismatch"));
}

#[tokio::test]
async fn replay_returns_audit_rows_for_the_resolved_tick() {
    let app = router(0);
    register_actor(&app, "arena", "solo", "solo-secret", 0, 0, &["WAIT"]).await;
    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    let supertick_id = ctx["supertick_id"].as_u64().unwrap();
    let context_hash = ctx["context_hash"].as_str().unwrap();
    post_action(&app, "arena", "solo", "solo-secret", supertick_id, context_hash, "WAIT").await;

    let req = Request::builder()
        .method("GET")
        .uri(format!("/sim/arena/replay?from={supertick_id}&to={supertick_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["actor_id"], "solo");
}

#[tokio::test]
async fn adjudicator_score_commits_goal_and_resumes_collect() {
    let app = router(1);
    register_actor(&app, "arena", "solo", "solo-secret", 0, 0, &["WAIT"]).await;

    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    let supertick_id = ctx["supertick_id"].as_u64().unwrap();
    let context_hash = ctx["context_hash"].as_str().unwrap();
    post_action(&app, "arena", "solo", "solo-secret", supertick_id, context_hash, "WAIT").await;

    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    assert_eq!(ctx["phase"], "PAUSED_FOR_SCORING");

    let body = json!({
        "selected_tiles": [[0, 0]],
        "contributions_by_actor": {"solo": 3},
        "rationale": "held the line",
        "feedback": "keep it up",
        "goal": "reach the far wall",
    });
    let req = Request::builder()
        .method("POST")
        .uri("/sim/arena/adjudicator/score")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    assert_eq!(ctx["phase"], "COLLECT");
    assert_eq!(ctx["hud"]["goal"], "reach the far wall");
    assert_eq!(ctx["hud"]["last_adjudication"]["rationale"], "held the line");
}

#[tokio::test]
async fn advancing_epoch_resumes_a_namespace_paused_at_its_epoch() {
    let app = router_with_epoch(0, 1);
    register_actor(&app, "arena", "solo", "solo-secret", 0, 0, &["WAIT"]).await;

    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    let supertick_id = ctx["supertick_id"].as_u64().unwrap();
    let context_hash = ctx["context_hash"].as_str().unwrap();
    post_action(&app, "arena", "solo", "solo-secret", supertick_id, context_hash, "WAIT").await;

    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    assert_eq!(ctx["phase"], "PAUSED");

    let req = Request::builder()
        .method("POST")
        .uri("/sim/arena/admin/epoch")
        .header("content-type", "application/json")
        .header("X-Admin-Secret", ADMIN_SECRET)
        .body(Body::from(json!({ "epoch": 100 }).to_string()))
        .unwrap();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let ctx = get_context(&app, "arena", "solo", "solo-secret").await;
    assert_eq!(ctx["phase"], "COLLECT");
}
