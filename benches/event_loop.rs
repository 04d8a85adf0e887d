use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use eventcore::EventLoopBuilder;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;

// Sample event for benchmarking
#[derive(Clone, Debug, Serialize, Deserialize)]
struct BenchEvent {
    pub id: u64,
    pub data: String,
}

impl eventcore::Event for BenchEvent {
    fn event_type() -> &'static str {
        "bench_event"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn bench_publish(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let event_loop = EventLoopBuilder::new().max_queue_size(1_000_000).build();

    let counter = Arc::new(AtomicU64::new(0));
    let counter_clone = counter.clone();
    event_loop.subscribe(move |_: &BenchEvent| {
        counter_clone.fetch_add(1, Ordering::Relaxed);
        Ok(())
    });

    let runner = event_loop.clone();
    let _driver = rt.spawn(async move {
        let _ = runner.run().await;
    });

    let mut group = c.benchmark_group("publish");
    group.throughput(Throughput::Elements(1));
    group.bench_function("single_subscriber", |b| {
        b.iter(|| {
            event_loop.publish(black_box(BenchEvent {
                id: 1,
                data: "payload".to_string(),
            }));
        })
    });
    group.finish();

    event_loop.stop();
}

fn bench_publish_filtered(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let event_loop = EventLoopBuilder::new().max_queue_size(1_000_000).build();

    let counter = Arc::new(AtomicU64::new(0));
    let counter_clone = counter.clone();
    let id = event_loop.subscribe(move |_: &BenchEvent| {
        counter_clone.fetch_add(1, Ordering::Relaxed);
        Ok(())
    });
    let added = event_loop.add_filter(id, |event: &BenchEvent| event.id % 2 == 0);
    assert!(added);

    let runner = event_loop.clone();
    let _driver = rt.spawn(async move {
        let _ = runner.run().await;
    });

    let mut group = c.benchmark_group("publish_filtered");
    group.throughput(Throughput::Elements(1));
    group.bench_function("half_pass_filter", |b| {
        let mut next_id = 0u64;
        b.iter(|| {
            next_id += 1;
            event_loop.publish(black_box(BenchEvent {
                id: next_id,
                data: "payload".to_string(),
            }));
        })
    });
    group.finish();

    event_loop.stop();
}

criterion_group!(benches, bench_publish, bench_publish_filtered);
criterion_main!(benches);
