use crate::BundleSimulator;
use courier_types::{
    config::SimulationConfig, BlockTarget, Bundle, BundleStatus, SimulationResult,
    StatusTransitionError,
};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Errors returned by [`SimulationGate`]. None of these produce a
/// [`SimulationResult`], and the bundle is left in [`BundleStatus::Created`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SimulationError {
    /// The bundle carries no transactions.
    #[error("bundle payload is empty")]
    EmptyBundle,
    /// The target block is not ahead of the chain.
    #[error("target block {target} is not ahead of chain height {height}")]
    TargetNotInFuture {
        /// The target block.
        target: u64,
        /// The current chain height.
        height: u64,
    },
    /// The bundle was already simulated or abandoned.
    #[error("bundle is {0}, only created bundles can be simulated")]
    NotCreated(BundleStatus),
    /// The relay did not answer in time.
    #[error("simulation timed out after {0:?}")]
    Timeout(Duration),
    /// The relay failed to simulate the bundle.
    #[error("simulation failed: {0}")]
    Relay(#[source] Box<dyn core::error::Error + Send + Sync>),
    /// The bundle status could not be updated.
    #[error(transparent)]
    Status(#[from] StatusTransitionError),
}

impl SimulationError {
    /// True if the error says nothing about the bundle itself, so a fresh
    /// bundle with the same payload may pass.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Relay(_))
    }
}

/// Dry-runs bundles at the relay before anything is submitted.
///
/// A bundle that passes moves to [`BundleStatus::Simulated`], one that fails
/// moves to [`BundleStatus::Rejected`] and is never simulated again.
#[derive(Debug, Clone)]
pub struct SimulationGate<R> {
    relay: R,
    config: SimulationConfig,
}

impl<R> SimulationGate<R> {
    /// Create a new gate.
    pub const fn new(relay: R, config: SimulationConfig) -> Self {
        Self { relay, config }
    }

    /// Get a reference to the relay.
    pub const fn relay(&self) -> &R {
        &self.relay
    }

    /// Get the gate configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Apply the gate policy to a raw relay result.
    ///
    /// The result fails if the relay reported a revert, or if the bundle used
    /// more gas than it declared or than the configured ceiling.
    pub fn apply_policy(&self, bundle: &Bundle, raw: SimulationResult) -> SimulationResult {
        if !raw.success {
            return raw;
        }
        if raw.gas_used > bundle.declared_max_gas() {
            let reason = format!(
                "gas used {} exceeds declared maximum {}",
                raw.gas_used,
                bundle.declared_max_gas()
            );
            return SimulationResult::failed(raw.gas_used, raw.coinbase_diff, reason);
        }
        if raw.gas_used > self.config.gas_ceiling {
            let reason = format!(
                "gas used {} exceeds ceiling {}",
                raw.gas_used, self.config.gas_ceiling
            );
            return SimulationResult::failed(raw.gas_used, raw.coinbase_diff, reason);
        }
        raw
    }
}

impl<R> SimulationGate<R>
where
    R: BundleSimulator + Sync,
{
    /// Simulate `bundle` against the parent state of `target`.
    ///
    /// When the parent block is not mined yet the latest state is used. The
    /// bundle's status is advanced according to the gated result.
    #[instrument(skip_all, fields(bundle_id = %bundle.id(), target = target.block_number()))]
    pub async fn simulate(
        &self,
        bundle: &mut Bundle,
        target: &BlockTarget,
        current_height: u64,
    ) -> Result<SimulationResult, SimulationError> {
        if bundle.is_empty() {
            return Err(SimulationError::EmptyBundle);
        }
        if target.block_number() <= current_height {
            return Err(SimulationError::TargetNotInFuture {
                target: target.block_number(),
                height: current_height,
            });
        }
        if bundle.status() != BundleStatus::Created {
            return Err(SimulationError::NotCreated(bundle.status()));
        }

        let parent = target.block_number() - 1;
        let state_block = (parent <= current_height).then_some(parent);

        let call = self.relay.simulate_bundle(bundle.txs(), target.block_number(), state_block);
        let raw = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(error)) => {
                warn!(%error, "Relay failed to simulate bundle");
                return Err(SimulationError::Relay(Box::new(error)));
            }
            Err(_) => {
                warn!(timeout = ?self.config.timeout, "Simulation timed out");
                return Err(SimulationError::Timeout(self.config.timeout));
            }
        };

        let result = self.apply_policy(bundle, raw);
        if result.success {
            bundle.advance(BundleStatus::Simulated)?;
            debug!(gas_used = result.gas_used, "Bundle passed simulation");
        } else {
            bundle.advance(BundleStatus::Rejected)?;
            warn!(
                gas_used = result.gas_used,
                reason = result.revert_reason.as_deref().unwrap_or_default(),
                "Bundle rejected by simulation"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, U256};
    use core::convert::Infallible;
    use courier_types::BundleDraft;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct FixedSimulator {
        result: SimulationResult,
        calls: Arc<Mutex<Vec<(u64, Option<u64>)>>>,
    }

    impl FixedSimulator {
        fn new(result: SimulationResult) -> Self {
            Self { result, calls: Default::default() }
        }
    }

    impl BundleSimulator for FixedSimulator {
        type Error = Infallible;

        async fn simulate_bundle(
            &self,
            _txs: &[Bytes],
            block_number: u64,
            state_block: Option<u64>,
        ) -> Result<SimulationResult, Self::Error> {
            self.calls.lock().unwrap().push((block_number, state_block));
            Ok(self.result.clone())
        }
    }

    fn bundle(max_gas: u64) -> Bundle {
        Bundle::new(BundleDraft::new(vec![Bytes::from_static(&[0x02, 0x01])], max_gas, U256::ZERO))
    }

    #[tokio::test]
    async fn passing_bundle_is_simulated() {
        let sim = FixedSimulator::new(SimulationResult::succeeded(21_000, U256::from(1)));
        let gate = SimulationGate::new(sim.clone(), SimulationConfig::default());
        let mut bundle = bundle(50_000);

        let result = gate.simulate(&mut bundle, &BlockTarget::new(100, 100, 1), 99).await.unwrap();
        assert!(result.success);
        assert_eq!(bundle.status(), BundleStatus::Simulated);
        // parent of the target is mined, so its state is used
        assert_eq!(sim.calls.lock().unwrap().as_slice(), &[(100, Some(99))]);
    }

    #[tokio::test]
    async fn unmined_parent_uses_latest_state() {
        let sim = FixedSimulator::new(SimulationResult::succeeded(21_000, U256::ZERO));
        let gate = SimulationGate::new(sim.clone(), SimulationConfig::default());

        gate.simulate(&mut bundle(50_000), &BlockTarget::new(100, 100, 10), 90).await.unwrap();
        assert_eq!(sim.calls.lock().unwrap().as_slice(), &[(100, None)]);
    }

    #[tokio::test]
    async fn gas_above_declared_is_rejected() {
        let sim = FixedSimulator::new(SimulationResult::succeeded(60_000, U256::ZERO));
        let gate = SimulationGate::new(sim, SimulationConfig::default());
        let mut bundle = bundle(50_000);

        let result = gate.simulate(&mut bundle, &BlockTarget::new(100, 100, 1), 99).await.unwrap();
        assert!(!result.success);
        assert!(result.revert_reason.unwrap().contains("declared maximum"));
        assert_eq!(bundle.status(), BundleStatus::Rejected);
    }

    #[tokio::test]
    async fn gas_above_ceiling_is_rejected() {
        let sim = FixedSimulator::new(SimulationResult::succeeded(60_000, U256::ZERO));
        let config = SimulationConfig { gas_ceiling: 50_000, ..Default::default() };
        let gate = SimulationGate::new(sim, config);

        let mut bundle = bundle(100_000);
        let result = gate.simulate(&mut bundle, &BlockTarget::new(100, 100, 1), 99).await.unwrap();
        assert!(result.revert_reason.unwrap().contains("ceiling"));
    }

    #[tokio::test]
    async fn revert_is_rejected() {
        let sim = FixedSimulator::new(SimulationResult::failed(30_000, U256::ZERO, "reverted"));
        let gate = SimulationGate::new(sim, SimulationConfig::default());
        let mut bundle = bundle(100_000);

        let result = gate.simulate(&mut bundle, &BlockTarget::new(100, 100, 1), 99).await.unwrap();
        assert_eq!(result.revert_reason.as_deref(), Some("reverted"));
        assert_eq!(bundle.status(), BundleStatus::Rejected);
    }

    #[tokio::test]
    async fn preconditions() {
        let sim = FixedSimulator::new(SimulationResult::succeeded(21_000, U256::ZERO));
        let gate = SimulationGate::new(sim.clone(), SimulationConfig::default());
        let target = BlockTarget::new(100, 100, 1);

        let mut empty = Bundle::new(BundleDraft::new(vec![], 1, U256::ZERO));
        assert!(matches!(
            gate.simulate(&mut empty, &target, 99).await,
            Err(SimulationError::EmptyBundle)
        ));

        assert!(matches!(
            gate.simulate(&mut bundle(50_000), &target, 100).await,
            Err(SimulationError::TargetNotInFuture { target: 100, height: 100 })
        ));

        let mut simulated = bundle(50_000);
        gate.simulate(&mut simulated, &target, 99).await.unwrap();
        assert!(matches!(
            gate.simulate(&mut simulated, &target, 99).await,
            Err(SimulationError::NotCreated(BundleStatus::Simulated))
        ));
        assert_eq!(sim.calls.lock().unwrap().len(), 1);
    }
}
