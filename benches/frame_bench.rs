use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use sysdash::config::RunConfig;
use sysdash::system::history::SeriesStore;
use sysdash::system::sample::{CpuSample, MemorySample, SessionSnapshot};
use sysdash::ui::trend::Trend;
use sysdash::ui::{FrameContext, build_frame};

fn make_store(n: usize) -> SeriesStore {
    let mut store = SeriesStore::new(n);
    for i in 0..n {
        let wobble = (i % 37) as f32 * 0.013;
        store.record(
            MemorySample {
                physical_used_gib: 6.0 + wobble,
                physical_total_gib: 15.5,
                virtual_used_gib: 6.5 + wobble,
                virtual_total_gib: 17.5,
            },
            CpuSample {
                core_count: 8,
                utilization_percent: (i % 100) as f32,
            },
        );
    }
    store
}

fn make_sessions() -> SessionSnapshot {
    SessionSnapshot::new(
        (0..16)
            .map(|i| format!("user{i}\tpts/{i} (10.0.0.{i})"))
            .collect(),
    )
}

fn bench_build_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_frame_100_1000_5000");
    let sessions = make_sessions();

    for size in [100usize, 1000, 5000] {
        let store = make_store(size);
        let config = RunConfig {
            sample_count: size,
            show_graphics: true,
            ..RunConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| {
                let ctx = FrameContext {
                    config: &config,
                    store: black_box(store),
                    sessions: &sessions,
                    iteration: size - 1,
                    self_memory_kb: Some(4096),
                    width: 160,
                };
                black_box(build_frame(&ctx));
            })
        });
    }
    group.finish();
}

fn bench_trend_glyphs(c: &mut Criterion) {
    let deltas: Vec<f32> = (0..1000).map(|i| (i as f32 - 500.0) * 0.003).collect();
    c.bench_function("trend_glyphs_1000", |b| {
        b.iter(|| {
            for &delta in black_box(&deltas) {
                black_box(Trend::from_delta(delta).glyphs());
            }
        })
    });
}

criterion_group!(benches, bench_build_frame, bench_trend_glyphs);
criterion_main!(benches);
