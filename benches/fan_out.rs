//! Fan-out and handoff benchmark suite.
//!
//! Measures how long a leader event takes to reach every follower, and how
//! long leadership takes to move to the next tab:
//! - Follower counts: 1, 8, 32
//!
//! Run with: cargo bench --bench fan_out
//! Results saved to: target/criterion/

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use tokio::sync::{Mutex, mpsc};

use shared_connection::{
    ConnectionConfig, LoopbackStream, LoopbackTransport, OpenResponse, Origin, SharedConnection,
    StreamEvent, Tab,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const URL: &str = "https://example.com/events";
const FOLLOWER_COUNTS: &[usize] = &[1, 8, 32];

// ============================================================================
// Benchmark: Fan-out
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("fan_out");

    for &count in FOLLOWER_COUNTS {
        let fixture = rt.block_on(Fixture::new(count));

        group.bench_with_input(BenchmarkId::new("event", count), &count, |b, &followers| {
            b.to_async(&rt).iter(|| {
                let stream = fixture.stream.clone();
                let received = Arc::clone(&fixture.received);
                async move {
                    stream.send(StreamEvent::data("{\"tick\":1}").with_event("tick"));
                    let mut received = received.lock().await;
                    for _ in 0..followers {
                        received.recv().await;
                    }
                }
            });
        });

        rt.block_on(async { fixture.close() });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Leadership Handoff
// ============================================================================

fn bench_handoff(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("handoff", |b| {
        b.to_async(&rt).iter(|| async {
            let transport = Arc::new(LoopbackTransport::new());
            let origin = Origin::local(transport.clone());
            let (tab_a, tab_b) = (origin.tab(), origin.tab());

            let a = tab_a.connect(URL, ConnectionConfig::new()).unwrap();
            a.wait_for_leadership().await;
            let b = tab_b.connect(URL, ConnectionConfig::new()).unwrap();

            a.close();
            b.wait_for_leadership().await;
            transport.wait_for_stream(1).await;
        });
    });
}

// ============================================================================
// Fixture
// ============================================================================

/// One leader plus `count` followers on the same URL.
struct Fixture {
    _tabs: Vec<Tab>,
    connections: Vec<SharedConnection>,
    stream: LoopbackStream,
    received: Arc<Mutex<mpsc::UnboundedReceiver<StreamEvent>>>,
}

impl Fixture {
    async fn new(count: usize) -> Self {
        let transport = Arc::new(LoopbackTransport::new());
        let origin = Origin::local(transport.clone());

        let leader_tab = origin.tab();
        let leader = leader_tab.connect(URL, ConnectionConfig::new()).unwrap();
        leader.wait_for_leadership().await;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut tabs = vec![leader_tab];
        let mut connections = vec![leader];

        for _ in 0..count {
            let tab = origin.tab();
            let tx = tx.clone();
            let config = ConnectionConfig::new().on_message(move |event| {
                let _ = tx.send(event);
            });
            connections.push(tab.connect(URL, config).unwrap());
            tabs.push(tab);
        }

        let stream = transport.wait_for_stream(0).await;
        stream.open(OpenResponse::ok()).await.unwrap();

        Self {
            _tabs: tabs,
            connections,
            stream,
            received: Arc::new(Mutex::new(rx)),
        }
    }

    fn close(&self) {
        for connection in &self.connections {
            connection.close();
        }
    }
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_fan_out, bench_handoff);
criterion_main!(benches);
