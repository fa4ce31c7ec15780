//! # Yield Tokenizer
//!
//! Example entry point walking one market through its full lifecycle:
//! wrap, split, pool trading, yield distribution and claim, maturity
//! redemption, and a final state export.

use chrono::{Duration, Utc};
use tracing::info;
use yield_tokenizer::utils::logger::setup_logger;
use yield_tokenizer::*;

const UNIT: Amount = 1_000_000;

fn main() -> anyhow::Result<()> {
    setup_logger().expect("Failed to initialize logger");
    info!("Starting Yield Tokenizer v{}", VERSION);

    let mut protocol = Protocol::with_config(ProtocolConfig::default());
    let now = Utc::now();

    let steth = TokenId::new("stETH");
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let source = AccountId::new("yield-source");

    // fund the participants with underlying
    protocol.deposit_external(&steth, &alice, 10_000 * UNIT)?;
    protocol.deposit_external(&steth, &bob, 2_000 * UNIT)?;
    protocol.deposit_external(&steth, &source, 1_000 * UNIT)?;

    let market = protocol.create_market(
        steth.clone(),
        Duration::days(180),
        TokenMeta::new("PT-stETH", "Principal stETH"),
        TokenMeta::new("YT-stETH", "Yield stETH"),
        now,
    )?;
    let info = protocol.get_market(market).expect("market just created");
    info!(
        market = %market,
        sy = %info.sy,
        pt = %info.pt,
        yt = %info.yt,
        "market registered"
    );

    // wrap and split
    protocol.wrap(market, &alice, 2_000 * UNIT)?;
    protocol.split_sy(market, &alice, 1_500 * UNIT, 0, 0, now)?;

    // seed a PT/YT pool and trade against it
    let pool = protocol.create_pool(info.pt.clone(), info.yt.clone())?;
    let outcome = protocol.add_liquidity(
        &alice,
        info.pt.clone(),
        info.yt.clone(),
        500 * UNIT,
        500 * UNIT,
        0,
    )?;
    info!(pool = %pool, lp = outcome.lp_minted, "pool seeded");

    protocol.wrap(market, &bob, 500 * UNIT)?;
    protocol.split_sy(market, &bob, 200 * UNIT, 0, 0, now)?;
    let received = protocol.swap(&bob, info.yt.clone(), info.pt.clone(), 100 * UNIT, 0, &bob)?;
    info!(account = %bob, amount_out = received, "swap filled");

    // yield arrives and holders claim
    protocol.distribute_yield(market, &source, 100 * UNIT)?;
    let claimed = protocol.claim_yield(market, &alice)?;
    info!(account = %alice, amount = claimed, "yield claimed");

    // maturity: PT redeems for underlying 1:1
    let after_maturity = now + Duration::days(181);
    let redeemed = protocol.redeem(market, &bob, 200 * UNIT, after_maturity)?;
    info!(account = %bob, amount = redeemed, "principal redeemed");

    let report = StateReport::capture(&protocol);
    println!("{}", report.export_json()?);

    info!(events = protocol.events().len(), "lifecycle complete");
    Ok(())
}
