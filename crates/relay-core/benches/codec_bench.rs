//! Criterion benchmarks for the relay wire codec.
//!
//! The dispatcher decodes one command and encodes one reply per received
//! frame, so codec latency sits on the hot path of every request.
//!
//! Run with:
//! ```bash
//! cargo bench --package relay-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::domain::registry::{ConnectionId, ServerRegistry};
use relay_core::protocol::command::decode_command;
use relay_core::protocol::response::{Notification, Response};

// ── Request fixtures ──────────────────────────────────────────────────────────

fn request_fixtures() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("add", b"add\n1.2.3.4\n6000\nSolSystem\nMy Server".to_vec()),
        ("list", b"list".to_vec()),
        (
            "ping",
            b"ping\n7c9e6679-7425-40de-944b-e07fc1f90ae7".to_vec(),
        ),
        (
            "remove",
            b"remove\n7c9e6679-7425-40de-944b-e07fc1f90ae7".to_vec(),
        ),
        ("advertise", b"advertise\nSolSystem".to_vec()),
        ("deadvertise", b"deadvertise\nSolSystem".to_vec()),
        ("find_peer", b"find_peer\nAlpha Centauri".to_vec()),
    ]
}

/// Builds a registry with `n` records and returns its snapshot.
fn snapshot_of(n: usize) -> Vec<relay_core::ServerRecord> {
    let mut registry = ServerRegistry::new();
    for i in 0..n {
        registry.register(
            "10.0.0.1".to_string(),
            6000 + i as u16,
            format!("System{i}"),
            format!("Server {i}"),
            ConnectionId(i as u64),
        );
    }
    registry.snapshot()
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks `decode_command` for every request shape.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_command");
    for (name, payload) in request_fixtures() {
        group.bench_with_input(BenchmarkId::new("cmd", name), &payload, |b, payload| {
            b.iter(|| decode_command(black_box(payload)).expect("decode must succeed"))
        });
    }
    group.finish();
}

/// Benchmarks `Response::encode` for list replies of increasing size.
fn bench_encode_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_list_response");
    for n in [0usize, 10, 100, 1000] {
        let response = Response::List(snapshot_of(n));
        group.bench_with_input(BenchmarkId::new("servers", n), &response, |b, response| {
            b.iter(|| black_box(response).encode())
        });
    }
    group.finish();
}

/// Benchmarks notification encoding (broadcast hot path during sweeps).
fn bench_encode_notification(c: &mut Criterion) {
    let advertise = Notification::Advertise {
        system: "SolSystem".to_string(),
    };
    let deadvertise = Notification::Deadvertise {
        system: "SolSystem".to_string(),
    };

    let mut group = c.benchmark_group("encode_notification");
    group.bench_function("advertise", |b| b.iter(|| black_box(&advertise).encode()));
    group.bench_function("deadvertise", |b| b.iter(|| black_box(&deadvertise).encode()));
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode_list, bench_encode_notification);
criterion_main!(benches);
