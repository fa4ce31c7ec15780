//! Integration tests for yield distribution, accrual settlement, and claims

use chrono::{Duration, Utc};
use yield_tokenizer::*;

const UNIT: Amount = 1_000_000;

fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}

fn setup(policy: UndistributedYieldPolicy) -> (Protocol, MarketId, Timestamp) {
    let mut p = Protocol::with_config(ProtocolConfig {
        undistributed_yield: policy,
        ..ProtocolConfig::default()
    });
    let now = Utc::now();
    let market = p
        .create_market(
            TokenId::new("stETH"),
            Duration::days(180),
            TokenMeta::new("PT-stETH", "Principal stETH"),
            TokenMeta::new("YT-stETH", "Yield stETH"),
            now,
        )
        .unwrap();
    for name in ["alice", "bob", "source"] {
        p.deposit_external(&TokenId::new("stETH"), &acct(name), 10_000 * UNIT)
            .unwrap();
    }
    (p, market, now)
}

fn split_for(p: &mut Protocol, market: MarketId, who: &str, amount: Amount, now: Timestamp) {
    p.wrap(market, &acct(who), amount).unwrap();
    p.split_sy(market, &acct(who), amount, 0, 0, now).unwrap();
}

#[test]
fn test_distribution_is_proportional_to_yt() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    split_for(&mut p, market, "alice", 600 * UNIT, now);
    split_for(&mut p, market, "bob", 400 * UNIT, now);

    p.distribute_yield(market, &acct("source"), 100 * UNIT).unwrap();
    assert_eq!(p.claimable_yield(market, &acct("alice")), 60 * UNIT);
    assert_eq!(p.claimable_yield(market, &acct("bob")), 40 * UNIT);

    assert_eq!(p.claim_yield(market, &acct("alice")).unwrap(), 60 * UNIT);
    assert_eq!(p.claim_yield(market, &acct("bob")).unwrap(), 40 * UNIT);
    assert_eq!(
        p.balance_of(&TokenId::new("stETH"), &acct("alice")),
        9_400 * UNIT + 60 * UNIT
    );
    assert!(p.audit_supply().is_empty());
}

#[test]
fn test_claim_with_nothing_accrued() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    split_for(&mut p, market, "alice", 100 * UNIT, now);

    assert!(matches!(
        p.claim_yield(market, &acct("alice")),
        Err(TokenizerError::NothingToClaim)
    ));

    p.distribute_yield(market, &acct("source"), 10 * UNIT).unwrap();
    p.claim_yield(market, &acct("alice")).unwrap();
    // double claim finds nothing left
    assert!(matches!(
        p.claim_yield(market, &acct("alice")),
        Err(TokenizerError::NothingToClaim)
    ));
}

#[test]
fn test_remainder_dust_carries_between_distributions() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    // three holders with one base unit of YT each
    for name in ["a", "b", "c"] {
        p.deposit_external(&TokenId::new("stETH"), &acct(name), 10)
            .unwrap();
        p.wrap(market, &acct(name), 1).unwrap();
        p.split_sy(market, &acct(name), 1, 0, 0, now).unwrap();
    }

    // neither 2 nor 1 divides by 3; together they pay exactly 1 each
    p.distribute_yield(market, &acct("source"), 2).unwrap();
    p.distribute_yield(market, &acct("source"), 1).unwrap();
    for name in ["a", "b", "c"] {
        assert_eq!(p.claim_yield(market, &acct(name)).unwrap(), 1);
    }
    assert!(p.audit_supply().is_empty());
}

#[test]
fn test_yt_transfer_keeps_earned_yield_with_seller() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    split_for(&mut p, market, "alice", 1_000 * UNIT, now);
    let yt = p.get_market(market).unwrap().yt;

    p.distribute_yield(market, &acct("source"), 100 * UNIT).unwrap();
    p.transfer_token(&yt, &acct("alice"), &acct("bob"), 1_000 * UNIT)
        .unwrap();

    // past yield stays with alice; future yield goes to bob
    p.distribute_yield(market, &acct("source"), 50 * UNIT).unwrap();
    assert_eq!(p.claimable_yield(market, &acct("alice")), 100 * UNIT);
    assert_eq!(p.claimable_yield(market, &acct("bob")), 50 * UNIT);
}

#[test]
fn test_split_and_merge_settle_before_balance_change() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    split_for(&mut p, market, "alice", 500 * UNIT, now);
    p.distribute_yield(market, &acct("source"), 50 * UNIT).unwrap();

    // doubling the YT position must not double the earned yield
    split_for(&mut p, market, "alice", 500 * UNIT, now);
    assert_eq!(p.claimable_yield(market, &acct("alice")), 50 * UNIT);

    p.distribute_yield(market, &acct("source"), 100 * UNIT).unwrap();
    assert_eq!(p.claimable_yield(market, &acct("alice")), 150 * UNIT);

    // merging away the whole position keeps the accrued total claimable
    p.merge_pt_yt(market, &acct("alice"), 1_000 * UNIT).unwrap();
    assert_eq!(p.claimable_yield(market, &acct("alice")), 150 * UNIT);
    assert_eq!(p.claim_yield(market, &acct("alice")).unwrap(), 150 * UNIT);
}

#[test]
fn test_zero_supply_reject_policy() {
    let (mut p, market, _) = setup(UndistributedYieldPolicy::Reject);
    let source_before = p.balance_of(&TokenId::new("stETH"), &acct("source"));

    let err = p
        .distribute_yield(market, &acct("source"), 10 * UNIT)
        .unwrap_err();
    assert!(matches!(err, TokenizerError::ZeroSupply(_)));
    assert_eq!(
        p.balance_of(&TokenId::new("stETH"), &acct("source")),
        source_before
    );
}

#[test]
fn test_zero_supply_carry_policy_releases_later() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Carry);
    p.distribute_yield(market, &acct("source"), 30 * UNIT).unwrap();
    // parked yield does not move the index yet
    assert_eq!(p.get_market(market).unwrap().yield_index, 0);

    split_for(&mut p, market, "alice", 300 * UNIT, now);
    p.distribute_yield(market, &acct("source"), 30 * UNIT).unwrap();
    // both tranches land on the sole holder
    assert_eq!(p.claimable_yield(market, &acct("alice")), 60 * UNIT);
}

#[test]
fn test_claim_open_after_maturity_and_pause() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    split_for(&mut p, market, "alice", 200 * UNIT, now);
    p.distribute_yield(market, &acct("source"), 20 * UNIT).unwrap();

    p.pause_market(market).unwrap();
    assert_eq!(p.claim_yield(market, &acct("alice")).unwrap(), 20 * UNIT);

    // distribution also stays open while paused
    p.distribute_yield(market, &acct("source"), 10 * UNIT).unwrap();
    assert_eq!(p.claimable_yield(market, &acct("alice")), 10 * UNIT);
}

#[test]
fn test_accrue_yield_settles_without_paying() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    split_for(&mut p, market, "alice", 100 * UNIT, now);
    p.distribute_yield(market, &acct("source"), 10 * UNIT).unwrap();

    let underlying_before = p.balance_of(&TokenId::new("stETH"), &acct("alice"));
    p.accrue_yield(market, &acct("alice")).unwrap();
    assert_eq!(
        p.balance_of(&TokenId::new("stETH"), &acct("alice")),
        underlying_before
    );
    assert_eq!(p.claimable_yield(market, &acct("alice")), 10 * UNIT);
}

#[test]
fn test_accrual_stage_transitions() {
    let (mut p, market, now) = setup(UndistributedYieldPolicy::Reject);
    assert_eq!(
        p.get_market(market).unwrap().accrual_stage,
        AccrualStage::NoAccrual
    );

    split_for(&mut p, market, "alice", 100 * UNIT, now);
    p.distribute_yield(market, &acct("source"), UNIT).unwrap();
    assert_eq!(
        p.get_market(market).unwrap().accrual_stage,
        AccrualStage::Accruing
    );
}
