//! Mock relay and builder endpoints.
use crate::{chain::MockChain, MockError};
use alloy::primitives::{keccak256, Bytes, B256, U256};
use courier_engine::{
    BundleCanceller, BundleSimulator, BundleStatusSource, BundleSubmitter, ConflictSource,
};
use courier_types::{
    Bundle, BundleAck, BundleId, CompetingBundle, RelayBundleStatus, SimulationResult,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

/// A simulation request seen by [`MockRelay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationCall {
    /// The simulated transactions.
    pub txs: Vec<Bytes>,
    /// The block simulated for.
    pub block_number: u64,
    /// The state the simulation ran on.
    pub state_block: Option<u64>,
}

#[derive(Debug)]
struct RelayState {
    scripted: VecDeque<Result<SimulationResult, MockError>>,
    default_result: SimulationResult,
    sim_delay: Duration,
    conflict: Result<Option<CompetingBundle>, MockError>,
    status: Option<RelayBundleStatus>,
    simulations: Vec<SimulationCall>,
    cancelled: Vec<BundleId>,
}

/// A mock relay covering simulation, conflict lookup, status and
/// cancellation. Clones share state.
///
/// Simulations return scripted results in order, then the default result.
#[derive(Debug, Clone)]
pub struct MockRelay {
    state: Arc<Mutex<RelayState>>,
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRelay {
    /// A relay that passes every simulation at 50k gas paying 1 gwei per gas.
    pub fn new() -> Self {
        let default_result =
            SimulationResult::succeeded(50_000, U256::from(50_000u64 * 1_000_000_000));
        Self {
            state: Arc::new(Mutex::new(RelayState {
                scripted: VecDeque::new(),
                default_result,
                sim_delay: Duration::ZERO,
                conflict: Ok(None),
                status: Some(RelayBundleStatus {
                    is_simulated: true,
                    is_sent_to_builders: true,
                    ..Default::default()
                }),
                simulations: Vec::new(),
                cancelled: Vec::new(),
            })),
        }
    }

    /// Queue a result for the next simulation.
    pub fn push_simulation(&self, result: Result<SimulationResult, MockError>) -> &Self {
        self.state.lock().unwrap().scripted.push_back(result);
        self
    }

    /// Set the result returned once the queue is empty.
    pub fn set_default_simulation(&self, result: SimulationResult) {
        self.state.lock().unwrap().default_result = result;
    }

    /// Delay every simulation.
    pub fn set_simulation_delay(&self, delay: Duration) {
        self.state.lock().unwrap().sim_delay = delay;
    }

    /// Set the conflict lookup result.
    pub fn set_conflict(&self, conflict: Result<Option<CompetingBundle>, MockError>) {
        self.state.lock().unwrap().conflict = conflict;
    }

    /// Set the self-reported status. `None` makes status lookups fail.
    pub fn set_status(&self, status: Option<RelayBundleStatus>) {
        self.state.lock().unwrap().status = status;
    }

    /// Every simulation requested so far.
    pub fn simulations(&self) -> Vec<SimulationCall> {
        self.state.lock().unwrap().simulations.clone()
    }

    /// Every bundle cancelled so far.
    pub fn cancelled(&self) -> Vec<BundleId> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

impl BundleSimulator for MockRelay {
    type Error = MockError;

    async fn simulate_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
        state_block: Option<u64>,
    ) -> Result<SimulationResult, Self::Error> {
        let (result, delay) = {
            let mut state = self.state.lock().unwrap();
            let call = SimulationCall { txs: txs.to_vec(), block_number, state_block };
            state.simulations.push(call);
            let default = state.default_result.clone();
            let result = state.scripted.pop_front().unwrap_or(Ok(default));
            (result, state.sim_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

impl ConflictSource for MockRelay {
    type Error = MockError;

    async fn conflicting_bundle(
        &self,
        _txs: &[Bytes],
        _block_number: u64,
    ) -> Result<Option<CompetingBundle>, Self::Error> {
        self.state.lock().unwrap().conflict.clone()
    }
}

impl BundleStatusSource for MockRelay {
    type Error = MockError;

    async fn bundle_status(
        &self,
        _bundle_hash: B256,
        _block_number: u64,
    ) -> Result<RelayBundleStatus, Self::Error> {
        self.state.lock().unwrap().status.clone().ok_or_else(|| MockError::new("no status"))
    }
}

impl BundleCanceller for MockRelay {
    type Error = MockError;

    async fn cancel_bundle(&self, id: BundleId) -> Result<(), Self::Error> {
        self.state.lock().unwrap().cancelled.push(id);
        Ok(())
    }
}

/// A submission seen by [`MockSubmitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// The submitted bundle.
    pub bundle_id: BundleId,
    /// The block it was submitted for.
    pub block_number: u64,
}

#[derive(Debug, Default)]
struct SubmitterState {
    latency: Duration,
    failing: bool,
    landing: Option<(MockChain, usize)>,
    submissions: Vec<Submission>,
    bundles: Vec<BundleId>,
}

/// A mock builder endpoint. Clones share state.
///
/// With [`MockSubmitter::landing_on`] the endpoint places acknowledged
/// bundles into the chain, starting from the n-th distinct bundle it sees.
#[derive(Debug, Clone)]
pub struct MockSubmitter {
    name: String,
    state: Arc<Mutex<SubmitterState>>,
}

impl MockSubmitter {
    /// An endpoint that acknowledges immediately.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: Default::default() }
    }

    /// Respond after `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().unwrap().latency = latency;
        self
    }

    /// Reject every submission.
    pub fn failing(self) -> Self {
        self.state.lock().unwrap().failing = true;
        self
    }

    /// Land acknowledged bundles in `chain`, from the `nth` distinct bundle
    /// on (zero based).
    pub fn landing_on(self, chain: MockChain, nth: usize) -> Self {
        self.state.lock().unwrap().landing = Some((chain, nth));
        self
    }

    /// Every submission seen so far, including ones that failed.
    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }
}

impl BundleSubmitter for MockSubmitter {
    type Error = MockError;

    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn submit_bundle(
        &self,
        bundle: &Bundle,
        block_number: u64,
    ) -> Result<BundleAck, Self::Error> {
        let latency = {
            let mut state = self.state.lock().unwrap();
            state.submissions.push(Submission { bundle_id: bundle.id(), block_number });
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(MockError::new(format!("{} rejected the bundle", self.name)));
        }
        if !state.bundles.contains(&bundle.id()) {
            state.bundles.push(bundle.id());
        }
        let index = state.bundles.iter().position(|id| *id == bundle.id()).unwrap_or_default();
        if let Some((chain, nth)) = &state.landing {
            if index >= *nth {
                chain.include(block_number, bundle.tx_hashes());
            }
        }
        Ok(BundleAck { bundle_hash: Some(keccak256(bundle.id().as_uuid().as_bytes())) })
    }
}
