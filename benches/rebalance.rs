//! Rebalance engine benchmarks: plan computation across portfolio sizes.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use driftbook::{HoldingsTable, PriceTable, RebalanceConfig, Symbol, TargetAllocation, compute_orders};

/// Equal-weight portfolio of `n` assets with deterministic pseudo-random drift.
fn generate_portfolio(n: usize) -> (TargetAllocation, PriceTable, HoldingsTable) {
    let symbols: Vec<Symbol> = (0..n).map(|i| Symbol::new(&format!("T{i:03}"))).collect();
    let weight = 1.0 / n as f64;
    let targets = TargetAllocation::new(symbols.iter().map(|&s| (s, weight))).unwrap();

    // Simple deterministic PRNG (xorshift32)
    let mut rng_state: u32 = 42;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 17;
        rng_state ^= rng_state << 5;
        rng_state
    };

    let mut prices = PriceTable::new();
    let mut holdings = HoldingsTable::new();
    for &sym in &symbols {
        let price = 1.0 + (next() % 50_000) as f64;
        // value between 50% and 150% of an equal share of $1M
        let value = 1_000_000.0 * weight * (0.5 + (next() % 1000) as f64 / 1000.0);
        prices.insert(sym, price);
        holdings.insert(sym, value / price);
    }

    (targets, prices, holdings)
}

fn bench_compute_orders(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_orders");
    let config = RebalanceConfig::default();

    for n in [2usize, 10, 50, 200] {
        let (targets, prices, holdings) = generate_portfolio(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                black_box(
                    compute_orders(
                        black_box(&targets),
                        black_box(&prices),
                        black_box(&holdings),
                        &config,
                    )
                    .unwrap(),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute_orders);
criterion_main!(benches);
