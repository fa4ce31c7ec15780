use criterion::{black_box, criterion_group, criterion_main, Criterion};
use yield_tokenizer::domain::amm_pool::{Pool, PoolKey};
use yield_tokenizer::{AccountId, Amount, FeeBps, Protocol, TokenId};

const UNIT: Amount = 1_000_000;

fn quote_swap_benchmark(c: &mut Criterion) {
    let key = PoolKey::new(TokenId::new("AAA"), TokenId::new("BBB")).unwrap();
    let mut pool = Pool::new(key, FeeBps(30));
    pool.reserve0 = 5_000_000 * UNIT;
    pool.reserve1 = 5_000_000 * UNIT;

    c.bench_function("quote_swap", |b| {
        b.iter(|| pool.quote_swap(black_box(true), black_box(100 * UNIT)).unwrap())
    });
}

fn swap_benchmark(c: &mut Criterion) {
    let mut protocol = Protocol::new();
    let a = TokenId::new("AAA");
    let b = TokenId::new("BBB");
    let lp = AccountId::new("lp");
    let trader = AccountId::new("trader");

    protocol.create_pool_with_fee(a.clone(), b.clone(), FeeBps(30)).unwrap();
    protocol.deposit_external(&a, &lp, u64::MAX as Amount).unwrap();
    protocol.deposit_external(&b, &lp, u64::MAX as Amount).unwrap();
    protocol
        .add_liquidity(&lp, a.clone(), b.clone(), 1_000_000_000 * UNIT, 1_000_000_000 * UNIT, 0)
        .unwrap();
    protocol.deposit_external(&a, &trader, u64::MAX as Amount).unwrap();

    c.bench_function("protocol_swap", |bench| {
        bench.iter(|| {
            protocol
                .swap(
                    black_box(&trader),
                    a.clone(),
                    b.clone(),
                    black_box(100 * UNIT),
                    0,
                    &trader,
                )
                .unwrap()
        })
    });
}

fn quote_add_liquidity_benchmark(c: &mut Criterion) {
    let key = PoolKey::new(TokenId::new("AAA"), TokenId::new("BBB")).unwrap();
    let mut pool = Pool::new(key, FeeBps(30));
    pool.reserve0 = 1_000_000 * UNIT;
    pool.reserve1 = 2_000_000 * UNIT;

    c.bench_function("quote_add_liquidity", |b| {
        b.iter(|| {
            pool.quote_add_liquidity(
                black_box(1_000_000 * UNIT),
                black_box(100 * UNIT),
                black_box(200 * UNIT),
            )
            .unwrap()
        })
    });
}

criterion_group!(
    benches,
    quote_swap_benchmark,
    swap_benchmark,
    quote_add_liquidity_benchmark
);
criterion_main!(benches);
