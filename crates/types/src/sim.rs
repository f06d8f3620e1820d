use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// The outcome of dry-running a bundle against chain state.
///
/// Produced once per bundle by the simulation gate and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// True if the bundle passed the gate.
    pub success: bool,
    /// Gas consumed by the whole bundle.
    pub gas_used: u64,
    /// Change in the block proposer's balance caused by the bundle, in wei.
    pub coinbase_diff: U256,
    /// Why the bundle was rejected, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
}

impl SimulationResult {
    /// A successful simulation.
    pub const fn succeeded(gas_used: u64, coinbase_diff: U256) -> Self {
        Self { success: true, gas_used, coinbase_diff, revert_reason: None }
    }

    /// A failed simulation.
    pub fn failed(gas_used: u64, coinbase_diff: U256, reason: impl Into<String>) -> Self {
        Self { success: false, gas_used, coinbase_diff, revert_reason: Some(reason.into()) }
    }

    /// Our effective priority fee per gas: the total payment to the proposer
    /// divided by the gas used, where the payment is the coinbase diff plus
    /// `gas_used * base_fee`.
    ///
    /// Returns zero when no gas was used.
    pub fn effective_priority_fee(&self, base_fee: u128) -> U256 {
        if self.gas_used == 0 {
            return U256::ZERO;
        }
        let gas = U256::from(self.gas_used);
        let payment = self.coinbase_diff.saturating_add(gas.saturating_mul(U256::from(base_fee)));
        payment / gas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_priority_fee() {
        // 0.01 eth over 100k gas at a 10 gwei base fee
        let sim = SimulationResult::succeeded(100_000, U256::from(10_000_000_000_000_000u64));
        assert_eq!(sim.effective_priority_fee(10_000_000_000), U256::from(110_000_000_000u64));
    }

    #[test]
    fn effective_priority_fee_without_gas() {
        let sim = SimulationResult::failed(0, U256::from(5), "reverted");
        assert_eq!(sim.effective_priority_fee(1), U256::ZERO);
        assert_eq!(sim.revert_reason.as_deref(), Some("reverted"));
    }
}
