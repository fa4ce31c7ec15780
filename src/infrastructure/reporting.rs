use crate::domain::protocol::{MarketInfo, PoolInfo, Protocol};
use crate::domain::types::*;
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of all protocol state, for export to external
/// monitoring systems
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateReport {
    /// Snapshot timestamp
    pub timestamp: Timestamp,
    /// All registered markets
    pub markets: Vec<MarketInfo>,
    /// All registered pools
    pub pools: Vec<PoolInfo>,
    /// Tokens failing the supply invariant (always empty in practice)
    pub supply_violations: Vec<TokenId>,
}

impl StateReport {
    /// Builds a snapshot of the protocol's current state
    pub fn capture(protocol: &Protocol) -> Self {
        let markets = protocol
            .market_ids()
            .into_iter()
            .filter_map(|id| protocol.get_market(id))
            .collect();
        let pools = protocol
            .pool_keys()
            .into_iter()
            .filter_map(|key| protocol.get_pool_info(key.token0, key.token1))
            .collect();

        Self {
            timestamp: chrono::Utc::now(),
            markets,
            pools,
            supply_violations: protocol.audit_supply(),
        }
    }

    /// Export the report in pretty-printed JSON
    pub fn export_json(&self) -> TokenizerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export key gauges in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        for market in &self.markets {
            let labels = format!("market=\"{}\",asset=\"{}\"", market.id, market.underlying);
            push_gauge(&mut output, "sy_supply", &labels, market.sy_supply);
            push_gauge(&mut output, "pt_supply", &labels, market.pt_supply);
            push_gauge(&mut output, "yt_supply", &labels, market.yt_supply);
            push_gauge(&mut output, "yield_index", &labels, market.yield_index);
        }

        for pool in &self.pools {
            let labels = format!("token0=\"{}\",token1=\"{}\"", pool.token0, pool.token1);
            push_gauge(&mut output, "pool_reserve0", &labels, pool.reserve0);
            push_gauge(&mut output, "pool_reserve1", &labels, pool.reserve1);
            push_gauge(&mut output, "pool_lp_supply", &labels, pool.total_lp_supply);
        }

        output
    }
}

fn push_gauge(output: &mut String, name: &str, labels: &str, value: u128) {
    output.push_str(&format!("# TYPE {name} gauge\n"));
    output.push_str(&format!("{name}{{{labels}}} {value}\n"));
}
