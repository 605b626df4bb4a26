use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use space_weight_hub::{AppState, WeightArbiter};
use space_weight_scale::{
    DiscoveredDevice, ReaderConfig, ScaleError, ScaleReader, ScaleSession, ScaleTransport,
};

/// A scale that always answers with `payload`, or refuses every connection
struct Bench {
    payload: Option<Vec<u8>>,
    connects: AtomicUsize,
}

struct BenchSession(Vec<u8>);

impl ScaleSession for BenchSession {
    fn address(&self) -> &str {
        "FF:FF:00:20:5C:33"
    }
    async fn is_connected(&self) -> bool {
        true
    }
    async fn read(&self, _: uuid::Uuid) -> Result<Vec<u8>, ScaleError> {
        Ok(self.0.clone())
    }
    async fn disconnect(self) {}
}

impl ScaleTransport for Bench {
    type Session = BenchSession;

    async fn discover(&self, _: Duration) -> Result<Vec<DiscoveredDevice>, ScaleError> {
        Ok(vec![DiscoveredDevice::new("FF:FF:00:20:5C:33", Some("LYE-Scale"))])
    }

    async fn connect(&self, address: &str) -> Result<BenchSession, ScaleError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.payload {
            Some(p) => Ok(BenchSession(p.clone())),
            None => Err(ScaleError::connection(address, "out of range")),
        }
    }
}

fn state(scale: Option<Bench>) -> Arc<AppState<Bench>> {
    Arc::new(AppState::new(
        WeightArbiter::default(),
        scale.map(|b| ScaleReader::new(b, ReaderConfig::default())),
        std::env::temp_dir().join("space-weight-hub-tests-missing"),
    ))
}

async fn call(
    state: &Arc<AppState<Bench>>,
    method: &str,
    uri: &str,
    body: &str,
) -> (hyper::StatusCode, Bytes) {
    let r = hyper::Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap();
    let resp = space_weight_hub::http::handle_request(r, state.clone()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

async fn call_json(
    state: &Arc<AppState<Bench>>,
    method: &str,
    uri: &str,
    body: &str,
) -> (hyper::StatusCode, serde_json::Value) {
    let (status, bytes) = call(state, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test(start_paused = true)]
async fn phone_push_then_get_weight() {
    let s = state(None);
    let (status, v) = call_json(&s, "POST", "/set_weight_from_phone", r#"{"weight_kg": 70.5}"#).await;
    assert_eq!(status, 200);
    assert_eq!(v, serde_json::json!({"status": "ok"}));

    tokio::time::advance(Duration::from_secs(10)).await;
    let (status, v) = call_json(&s, "GET", "/get_weight", "").await;
    assert_eq!(status, 200);
    assert_eq!(v["source"], "phone");
    assert_eq!(v["earth_kg"], 70.5);
    assert!(v["name"].is_null());
    assert_eq!(v["planets"]["Mars"], 26.79);
    assert_eq!(v["planets"]["Earth"], 70.5);
}

#[tokio::test(start_paused = true)]
async fn stale_push_uses_query() {
    let s = state(None);
    call(&s, "POST", "/set_weight_from_phone", r#"{"name": "ScaleStation1", "weight_kg": 63.4}"#)
        .await;

    let (_, v) = call_json(&s, "GET", "/get_weight?weight=90", "").await;
    assert_eq!(v["source"], "phone");
    assert_eq!(v["name"], "ScaleStation1");

    tokio::time::advance(Duration::from_secs(31)).await;
    let (status, v) = call_json(&s, "GET", "/get_weight?weight=90", "").await;
    assert_eq!(status, 200);
    assert_eq!(v["source"], "query");
    assert_eq!(v["earth_kg"], 90.0);
    assert!(v["name"].is_null());

    let (status, _) = call(&s, "GET", "/get_weight", "").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn query_only() {
    let s = state(None);
    let (status, v) = call_json(&s, "GET", "/get_weight?weight=82", "").await;
    assert_eq!(status, 200);
    assert_eq!(v["source"], "query");
    assert_eq!(v["earth_kg"], 82.0);
    assert!(v["name"].is_null());
}

#[tokio::test]
async fn nothing_available() {
    let s = state(None);
    let (status, body) = call(&s, "GET", "/get_weight", "").await;
    assert_eq!(status, 400);
    assert!(String::from_utf8_lossy(&body).starts_with("No weight available"));

    let (status, body) = call(&s, "GET", "/get_weight?weight=0", "").await;
    assert_eq!(status, 400);
    assert_eq!(&body[..], b"weight must be > 0");
}

#[tokio::test]
async fn bad_pushes_are_rejected() {
    let s = state(None);
    for (body, message) in [
        (r#"{"weight_kg": 0}"#, "weight_kg must be > 0"),
        (r#"{"weight_kg": -70}"#, "weight_kg must be > 0"),
        (r#"{"weight_kg": "abc"}"#, "weight_kg must be a number"),
        (r#"{"name": "x"}"#, "weight_kg is required"),
    ] {
        let (status, got) = call(&s, "POST", "/set_weight_from_phone", body).await;
        assert_eq!(status, 400, "{body}");
        assert_eq!(String::from_utf8_lossy(&got), message);
    }

    let (status, got) = call(&s, "POST", "/set_weight_from_phone", "not json").await;
    assert_eq!(status, 400);
    assert!(String::from_utf8_lossy(&got).starts_with("invalid JSON body"));

    // nothing was stored
    let (status, _) = call(&s, "GET", "/get_weight", "").await;
    assert_eq!(status, 400);
}

#[tokio::test(start_paused = true)]
async fn read_scale_endpoint() {
    let s = state(Some(Bench { payload: Some(vec![0xc1, 0x02]), connects: AtomicUsize::new(0) }));
    let (status, v) = call_json(&s, "GET", "/read_scale", "").await;
    assert_eq!(status, 200);
    assert_eq!(v["source"], "scale");
    assert_eq!(v["earth_kg"], 70.5);

    let s = state(Some(Bench { payload: None, connects: AtomicUsize::new(0) }));
    let (status, body) = call(&s, "GET", "/read_scale", "").await;
    assert_eq!(status, 503);
    assert!(String::from_utf8_lossy(&body).contains("after 3 attempts"));
    let connects = s.scale.as_ref().unwrap().transport().connects.load(Ordering::SeqCst);
    assert_eq!(connects, 3);

    let (status, _) = call(&state(None), "GET", "/read_scale", "").await;
    assert_eq!(status, 503);
}

#[tokio::test]
async fn routing() {
    let s = state(None);
    assert_eq!(call(&s, "GET", "/nope", "").await.0, 404);
    assert_eq!(call(&s, "GET", "/set_weight_from_phone", "").await.0, 404);
    assert_eq!(call(&s, "GET", "/static/../Cargo.toml", "").await.0, 404);
    assert_eq!(call(&s, "GET", "/favicon.ico", "").await.0, 404);
    assert_eq!(call(&s, "GET", "/", "").await.0, 500);
}

#[tokio::test]
async fn serves_static_files() {
    let dir = std::env::temp_dir().join(format!("space-weight-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>Space Weight</h1>").unwrap();
    std::fs::write(dir.join("app.js"), "startProcess();").unwrap();

    let s = Arc::new(AppState::<Bench>::new(WeightArbiter::default(), None, dir.clone()));

    let r = hyper::Request::builder().uri("/").body(Full::new(Bytes::new())).unwrap();
    let resp = space_weight_hub::http::handle_request(r, s.clone()).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()[hyper::header::CONTENT_TYPE], "text/html; charset=utf-8");

    let (status, body) = call(&s, "GET", "/static/app.js", "").await;
    assert_eq!(status, 200);
    assert_eq!(&body[..], b"startProcess();");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn encoded_query_weight() {
    let s = state(None);
    let (status, v) = call_json(&s, "GET", "/get_weight?weight=70%2E5", "").await;
    assert_eq!(status, 200);
    assert_eq!(v["source"], "query");
    assert_eq!(v["earth_kg"], 70.5);
}

#[tokio::test]
async fn oversized_push_is_rejected() {
    let s = state(None);
    let padding = " ".repeat(space_weight_hub::weight::MAX_PUSH_BODY);
    let body = format!(r#"{{"weight_kg": 70.5}}{padding}"#);
    let (status, got) = call(&s, "POST", "/set_weight_from_phone", &body).await;
    assert_eq!(status, 400);
    assert!(String::from_utf8_lossy(&got).starts_with("failed to read body"));

    // nothing was stored
    let (status, _) = call(&s, "GET", "/get_weight", "").await;
    assert_eq!(status, 400);

    // right at the limit is fine
    let body = r#"{"weight_kg": 70.5}"#.to_string();
    let body = format!("{body}{}", " ".repeat(space_weight_hub::weight::MAX_PUSH_BODY - body.len()));
    let (status, _) = call(&s, "POST", "/set_weight_from_phone", &body).await;
    assert_eq!(status, 200);
}
