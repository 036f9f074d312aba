//! Normalizer benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use floattime_core::{Frame, Normalizer};
use serde_json::json;

fn full_snapshot_benchmark(c: &mut Criterion) {
    let payload = json!({
        "timer": {"current": 59000, "playback": "play", "duration": 60000},
        "eventNow": {"id": "1", "title": "Intro", "duration": 60000, "timeWarning": 20000, "timeDanger": 5000},
        "eventNext": {"id": "2", "title": "Panel"},
        "rundown": {"selectedEventIndex": 0, "numEvents": 12},
        "message": {"timer": {"blink": false, "blackout": false}},
    });
    let mut normalizer = Normalizer::new();

    c.bench_function("normalize_full_snapshot", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(&payload))))
    });
}

fn timer_delta_benchmark(c: &mut Criterion) {
    let mut normalizer = Normalizer::new();
    normalizer.normalize(&json!({"eventNow": {"id": "1", "title": "Intro", "duration": 60000}}));
    let payload = json!({"timer": {"current": 42000, "playback": "play"}});

    c.bench_function("normalize_timer_delta", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(&payload))))
    });
}

fn decode_and_normalize_benchmark(c: &mut Criterion) {
    let text = r#"{"type":"ontime","payload":{"timer":{"current":42000,"playback":"play"},"clock":43200000}}"#;
    let mut normalizer = Normalizer::new();

    c.bench_function("decode_and_normalize", |b| {
        b.iter(|| {
            let frame = Frame::decode(black_box(text)).unwrap();
            black_box(normalizer.normalize(frame.payload()))
        })
    });
}

criterion_group!(
    benches,
    full_snapshot_benchmark,
    timer_delta_benchmark,
    decode_and_normalize_benchmark
);
criterion_main!(benches);
