//! End-to-end behaviour of the ledger endpoint through the full router.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use beancount_example::{
    application::{generator::Generator, random::RandomRange},
    cache::DocumentCache,
    domain::{error::DomainError, settings::LedgerSettings},
    infra::http::{AppState, build_router},
    ledger::{ExampleLedgerWriter, LedgerWriter, WriterError},
};
use http_body_util::BodyExt;
use serial_test::serial;
use time::Date;
use tower::ServiceExt;

struct EnvGuard {
    names: Vec<&'static str>,
}

impl EnvGuard {
    fn set(pairs: &[(&'static str, &str)]) -> Self {
        for (name, value) in pairs {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::set_var(name, value) };
        }
        Self {
            names: pairs.iter().map(|(name, _)| *name).collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for name in &self.names {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(name) };
        }
    }
}

/// Counts calls and hands back a numbered document.
#[derive(Default)]
struct CountingWriter {
    calls: AtomicUsize,
}

impl LedgerWriter for CountingWriter {
    fn write(
        &self,
        _birth: Date,
        _start: Date,
        _end: Date,
        _reformat: bool,
        _rng: &RandomRange,
    ) -> Result<String, WriterError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("ledger #{call}\n"))
    }
}

struct BrokenWriter;

impl LedgerWriter for BrokenWriter {
    fn write(
        &self,
        _birth: Date,
        _start: Date,
        _end: Date,
        _reformat: bool,
        _rng: &RandomRange,
    ) -> Result<String, WriterError> {
        Err(WriterError::other("disk on fire at /srv/ledger"))
    }
}

fn state_with(writer: Arc<dyn LedgerWriter>, settings: LedgerSettings) -> AppState {
    let generator = Generator::new(writer, Arc::new(RandomRange::from_entropy()));
    AppState::new(settings, Arc::new(DocumentCache::new(Arc::new(generator))))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let body = String::from_utf8(bytes.to_vec()).expect("utf-8 body");
    (status, content_type, body)
}

#[tokio::test]
#[serial]
async fn serves_cached_ledger_until_reset() {
    let _env = EnvGuard::set(&[
        ("START", "2022-01-01"),
        ("END", "2022-02-01"),
        ("BIRTH", "1990-01-01"),
    ]);
    let settings = LedgerSettings::from_env().expect("valid environment");

    let state = state_with(Arc::new(ExampleLedgerWriter::new()), settings);
    state.prime().await.expect("priming succeeds");
    let app = build_router(state);

    let (status, content_type, first) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
    assert!(!first.is_empty());
    assert!(first.contains(";; Dates: 2022-01-01 - 2022-02-01"));

    let (status, _, second) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    let (status, _, reset) = get(&app, "/?reset").await;
    assert_eq!(status, StatusCode::OK);
    assert!(reset.contains(";; Birth: 1990-01-01"));

    let (status, _, after) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reset, after);
}

#[tokio::test]
#[serial]
async fn malformed_environment_date_is_rejected() {
    let _env = EnvGuard::set(&[
        ("START", "2022-01-01"),
        ("END", "not-a-date"),
        ("BIRTH", "1990-01-01"),
    ]);

    let err = LedgerSettings::from_env().expect_err("malformed END must fail");
    assert_eq!(err, DomainError::invalid_setting("END", "not-a-date"));
}

#[tokio::test]
async fn reset_regenerates_exactly_once() {
    let writer = Arc::new(CountingWriter::default());
    let state = state_with(writer.clone(), LedgerSettings::default());
    state.prime().await.expect("priming succeeds");
    let app = build_router(state);

    assert_eq!(get(&app, "/").await.2, "ledger #1\n");
    assert_eq!(get(&app, "/").await.2, "ledger #1\n");
    assert_eq!(writer.calls.load(Ordering::SeqCst), 1);

    assert_eq!(get(&app, "/?reset=1").await.2, "ledger #2\n");
    assert_eq!(get(&app, "/?reset").await.2, "ledger #3\n");
    assert_eq!(get(&app, "/?other=1").await.2, "ledger #3\n");
    assert_eq!(writer.calls.load(Ordering::SeqCst), 3);

    let (status, _, body) = get(&app, "/?reset&reset=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ledger #4\n");

    let (status, _, body) = get(&app, "/?other=1&other=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ledger #4\n");
    assert_eq!(writer.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn generation_failure_is_a_bare_500() {
    let state = state_with(Arc::new(BrokenWriter), LedgerSettings::default());
    assert!(state.prime().await.is_err());
    let app = build_router(state);

    let (status, _, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal server error");
    assert!(!body.contains("/srv/ledger"));
}

#[tokio::test]
async fn unknown_paths_are_not_served() {
    let state = state_with(Arc::new(CountingWriter::default()), LedgerSettings::default());
    let app = build_router(state);

    let (status, _, _) = get(&app, "/ledger.beancount").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
