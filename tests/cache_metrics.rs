use std::collections::HashSet;
use std::sync::Arc;

use beancount_example::{
    application::{generator::Generator, random::RandomRange},
    cache::{
        CACHE_CLEAR_METRIC, CACHE_HIT_METRIC, CACHE_MISS_METRIC, DocumentCache, GENERATE_MS_METRIC,
    },
    domain::settings::LedgerSettings,
    ledger::ExampleLedgerWriter,
};
use metrics_util::debugging::DebuggingRecorder;
use time::macros::date;

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let generator = Generator::new(
        Arc::new(ExampleLedgerWriter::new()),
        Arc::new(RandomRange::from_seed(8)),
    );
    let cache = DocumentCache::new(Arc::new(generator));
    let settings = LedgerSettings::new(
        Some(date!(2021 - 01 - 01)),
        Some(date!(2021 - 06 - 30)),
        Some(date!(1988 - 04 - 12)),
    );

    cache.get(&settings).await.expect("miss then generate");
    cache.get(&settings).await.expect("hit");
    cache.clear();
    cache.get(&settings).await.expect("regenerate");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        CACHE_HIT_METRIC,
        CACHE_MISS_METRIC,
        CACHE_CLEAR_METRIC,
        GENERATE_MS_METRIC,
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
