//! Concurrent readers and resets must always observe a whole cached document.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use beancount_example::{
    application::{generator::Generator, random::RandomRange},
    cache::DocumentCache,
    domain::settings::LedgerSettings,
    infra::http::{AppState, build_router},
    ledger::{LedgerWriter, WriterError},
};
use http_body_util::BodyExt;
use time::Date;
use tower::ServiceExt;

#[derive(Default)]
struct SlowWriter {
    calls: AtomicUsize,
}

impl LedgerWriter for SlowWriter {
    fn write(
        &self,
        _birth: Date,
        _start: Date,
        _end: Date,
        _reformat: bool,
        _rng: &RandomRange,
    ) -> Result<String, WriterError> {
        thread::sleep(Duration::from_millis(25));
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("generation {call}\nend\n"))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_generation() {
    let writer = Arc::new(SlowWriter::default());
    let generator = Generator::new(writer.clone(), Arc::new(RandomRange::from_seed(3)));
    let state = AppState::new(
        LedgerSettings::default(),
        Arc::new(DocumentCache::new(Arc::new(generator))),
    );
    let app = build_router(state);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(Request::get("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            String::from_utf8(bytes.to_vec()).unwrap()
        }));
    }

    let mut bodies = Vec::new();
    for handle in handles {
        bodies.push(handle.await.unwrap());
    }

    assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    assert!(bodies.iter().all(|body| body == "generation 1\nend\n"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_during_resets_never_see_partial_documents() {
    let writer = Arc::new(SlowWriter::default());
    let generator = Generator::new(writer.clone(), Arc::new(RandomRange::from_seed(5)));
    let state = AppState::new(
        LedgerSettings::default(),
        Arc::new(DocumentCache::new(Arc::new(generator))),
    );
    state.prime().await.unwrap();
    let app = build_router(state);

    let mut handles = Vec::new();
    for i in 0..12 {
        let app = app.clone();
        let uri = if i % 3 == 0 { "/?reset" } else { "/" };
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            String::from_utf8(bytes.to_vec()).unwrap()
        }));
    }

    for handle in handles {
        let body = handle.await.unwrap();
        assert!(body.starts_with("generation "));
        assert!(body.ends_with("\nend\n"));
    }

    let calls = writer.calls.load(Ordering::SeqCst);
    assert!((2..=5).contains(&calls), "unexpected generation count: {calls}");
}
