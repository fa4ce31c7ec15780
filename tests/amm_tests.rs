//! Integration tests for pool creation, liquidity, and swaps

use chrono::{Duration, Utc};
use yield_tokenizer::*;

const UNIT: Amount = 1_000_000;

fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}

/// Two plain tokens and a funded trader, no markets involved
fn plain_setup() -> (Protocol, TokenId, TokenId) {
    let mut p = Protocol::new();
    let a = TokenId::new("AAA");
    let b = TokenId::new("BBB");
    for token in [&a, &b] {
        p.deposit_external(token, &acct("lp"), 10_000 * UNIT).unwrap();
        p.deposit_external(token, &acct("trader"), 1_000 * UNIT)
            .unwrap();
    }
    p.create_pool_with_fee(a.clone(), b.clone(), FeeBps(30)).unwrap();
    (p, a, b)
}

#[test]
fn test_first_liquidity_mints_geometric_mean() {
    let (mut p, a, b) = plain_setup();
    let outcome = p
        .add_liquidity(&acct("lp"), a.clone(), b.clone(), 500 * UNIT, 500 * UNIT, 0)
        .unwrap();
    assert_eq!(outcome.lp_minted, 500 * UNIT);

    let info = p.get_pool_info(a, b).unwrap();
    assert_eq!(info.reserve0, 500 * UNIT);
    assert_eq!(info.reserve1, 500 * UNIT);
    assert_eq!(info.total_lp_supply, 500 * UNIT);
    assert_eq!(p.balance_of(&info.lp_token, &acct("lp")), 500 * UNIT);
}

#[test]
fn test_followup_liquidity_rejects_bad_ratio() {
    let (mut p, a, b) = plain_setup();
    p.add_liquidity(&acct("lp"), a.clone(), b.clone(), 1_000 * UNIT, 2_000 * UNIT, 0)
        .unwrap();

    let err = p
        .add_liquidity(&acct("lp"), a.clone(), b.clone(), 100 * UNIT, 150 * UNIT, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        TokenizerError::RatioMismatch {
            required: 200_000_000,
            provided: 150_000_000,
        }
    ));

    // excess on the counter side is left with the caller
    let b_before = p.balance_of(&b, &acct("lp"));
    let outcome = p
        .add_liquidity(&acct("lp"), a, b.clone(), 100 * UNIT, 500 * UNIT, 0)
        .unwrap();
    assert_eq!(outcome.amount1_used, 200 * UNIT);
    assert_eq!(p.balance_of(&b, &acct("lp")), b_before - 200 * UNIT);
}

#[test]
fn test_swap_reference_numbers() {
    let (mut p, a, b) = plain_setup();
    p.add_liquidity(&acct("lp"), a.clone(), b.clone(), 500 * UNIT, 500 * UNIT, 0)
        .unwrap();

    let out = p
        .swap(&acct("trader"), a.clone(), b.clone(), 100 * UNIT, 0, &acct("trader"))
        .unwrap();
    assert_eq!(out, 83_124_895);

    let info = p.get_pool_info(a.clone(), b.clone()).unwrap();
    assert_eq!(info.reserve0, 600 * UNIT);
    assert_eq!(info.reserve1, 416_875_105);

    // the pool account holds exactly the reserves
    let key = PoolKey::new(a, b).unwrap();
    assert_eq!(p.balance_of(&key.token0, &key.pool_account()), 600 * UNIT);
    assert_eq!(p.balance_of(&key.token1, &key.pool_account()), 416_875_105);
    assert!(p.audit_supply().is_empty());
}

#[test]
fn test_swap_slippage_guard() {
    let (mut p, a, b) = plain_setup();
    p.add_liquidity(&acct("lp"), a.clone(), b.clone(), 500 * UNIT, 500 * UNIT, 0)
        .unwrap();

    let err = p
        .swap(&acct("trader"), a, b, 100 * UNIT, 84 * UNIT, &acct("trader"))
        .unwrap_err();
    assert!(matches!(
        err,
        TokenizerError::SlippageExceeded {
            realized: 83_124_895,
            minimum: 84_000_000,
        }
    ));
}

#[test]
fn test_swap_against_unknown_pool() {
    let (mut p, a, _) = plain_setup();
    let c = TokenId::new("CCC");
    p.deposit_external(&c, &acct("trader"), UNIT).unwrap();
    let err = p
        .swap(&acct("trader"), c, a, UNIT, 0, &acct("trader"))
        .unwrap_err();
    assert!(matches!(err, TokenizerError::PoolNotFound(..)));
}

#[test]
fn test_remove_liquidity_proportional() {
    let (mut p, a, b) = plain_setup();
    p.add_liquidity(&acct("lp"), a.clone(), b.clone(), 500 * UNIT, 500 * UNIT, 0)
        .unwrap();
    p.swap(&acct("trader"), a.clone(), b.clone(), 100 * UNIT, 0, &acct("trader"))
        .unwrap();

    // withdraw half the shares after the swap moved the reserves
    let outcome = p
        .remove_liquidity(&acct("lp"), a.clone(), b.clone(), 250 * UNIT)
        .unwrap();
    assert_eq!(outcome.amount0_out, 300 * UNIT);
    assert_eq!(outcome.amount1_out, 208_437_552);

    let info = p.get_pool_info(a, b).unwrap();
    assert_eq!(info.reserve0, 300 * UNIT);
    assert_eq!(info.reserve1, 208_437_553);
    assert_eq!(info.total_lp_supply, 250 * UNIT);

    let err = p
        .remove_liquidity(&acct("lp"), TokenId::new("AAA"), TokenId::new("BBB"), 251 * UNIT)
        .unwrap_err();
    assert!(matches!(err, TokenizerError::InsufficientLP { .. }));
}

#[test]
fn test_deactivated_pool_allows_exit_only() {
    let (mut p, a, b) = plain_setup();
    p.add_liquidity(&acct("lp"), a.clone(), b.clone(), 500 * UNIT, 500 * UNIT, 0)
        .unwrap();
    p.deactivate_pool(a.clone(), b.clone()).unwrap();

    assert!(matches!(
        p.swap(&acct("trader"), a.clone(), b.clone(), UNIT, 0, &acct("trader")),
        Err(TokenizerError::PoolInactive(..))
    ));
    assert!(matches!(
        p.add_liquidity(&acct("lp"), a.clone(), b.clone(), UNIT, UNIT, 0),
        Err(TokenizerError::PoolInactive(..))
    ));

    p.remove_liquidity(&acct("lp"), a, b, 500 * UNIT).unwrap();
}

#[test]
fn test_fee_accrues_to_lp_value() {
    let (mut p, a, b) = plain_setup();
    p.add_liquidity(&acct("lp"), a.clone(), b.clone(), 500 * UNIT, 500 * UNIT, 0)
        .unwrap();

    // round trip a swap each way; fees stay in the reserves
    p.swap(&acct("trader"), a.clone(), b.clone(), 100 * UNIT, 0, &acct("trader"))
        .unwrap();
    p.swap(&acct("trader"), b.clone(), a.clone(), 50 * UNIT, 0, &acct("trader"))
        .unwrap();

    let info = p.get_pool_info(a.clone(), b.clone()).unwrap();
    let k_after = info.reserve0 * info.reserve1;
    assert!(k_after > 500 * UNIT * 500 * UNIT);

    // full withdrawal pays out more than was deposited on at least one side
    let outcome = p.remove_liquidity(&acct("lp"), a, b, 500 * UNIT).unwrap();
    let total_out = outcome.amount0_out + outcome.amount1_out;
    assert!(total_out > 0);
    assert!(p.audit_supply().is_empty());
}

#[test]
fn test_yt_pool_settles_accrual_for_pool_account() {
    // YT moving in and out of a pool must not reassign earned yield
    let mut p = Protocol::new();
    let now = Utc::now();
    let market = p
        .create_market(
            TokenId::new("stETH"),
            Duration::days(180),
            TokenMeta::new("PT", "Principal"),
            TokenMeta::new("YT", "Yield"),
            now,
        )
        .unwrap();
    let alice = acct("alice");
    let source = acct("source");
    p.deposit_external(&TokenId::new("stETH"), &alice, 5_000 * UNIT)
        .unwrap();
    p.deposit_external(&TokenId::new("stETH"), &source, 1_000 * UNIT)
        .unwrap();
    p.wrap(market, &alice, 1_000 * UNIT).unwrap();
    p.split_sy(market, &alice, 1_000 * UNIT, 0, 0, now).unwrap();
    let info = p.get_market(market).unwrap();

    p.distribute_yield(market, &source, 100 * UNIT).unwrap();

    // alice moves half her YT into a pool after earning on all of it
    p.create_pool(info.pt.clone(), info.yt.clone()).unwrap();
    p.add_liquidity(&alice, info.pt.clone(), info.yt.clone(), 500 * UNIT, 500 * UNIT, 0)
        .unwrap();
    assert_eq!(p.claimable_yield(market, &alice), 100 * UNIT);

    // new yield splits between alice and the pool account pro rata
    p.distribute_yield(market, &source, 100 * UNIT).unwrap();
    assert_eq!(p.claimable_yield(market, &alice), 150 * UNIT);
}

#[test]
fn test_pool_spot_price_tracks_reserves() {
    let (mut p, a, b) = plain_setup();
    p.add_liquidity(&acct("lp"), a.clone(), b.clone(), 1_000 * UNIT, 2_000 * UNIT, 0)
        .unwrap();
    let info = p.get_pool_info(a, b).unwrap();
    assert_eq!(info.spot_price.0, rust_decimal_macros::dec!(2));
    assert_eq!(info.fee_bps, FeeBps(30));
    assert!(info.is_active);
}
