//! A scriptable chain for driving the engine in tests.
use crate::MockError;
use alloy::primitives::TxHash;
use courier_engine::ChainReader;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::Instant;

#[derive(Debug)]
struct ChainState {
    height: u64,
    mined_at: Instant,
    block_time: Option<Duration>,
    blocks: HashMap<u64, Vec<TxHash>>,
    base_fee: u128,
    failing: bool,
    reads: usize,
}

impl ChainState {
    /// Mine every block whose slot has passed.
    fn tick(&mut self) {
        let Some(block_time) = self.block_time else { return };
        while self.mined_at.elapsed() >= block_time {
            self.height += 1;
            self.mined_at += block_time;
        }
    }
}

/// A mock [`ChainReader`].
///
/// The chain is either frozen at a fixed height or mines one block per
/// `block_time` of tokio time, which pairs well with paused-time tests.
/// Blocks are empty unless transactions are placed in them.
#[derive(Debug, Clone)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    /// A chain frozen at `height`.
    pub fn new(height: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                height,
                mined_at: Instant::now(),
                block_time: None,
                blocks: HashMap::new(),
                base_fee: 10_000_000_000,
                failing: false,
                reads: 0,
            })),
        }
    }

    /// A chain at `height` mining one block per `block_time`.
    pub fn mining(height: u64, block_time: Duration) -> Self {
        let chain = Self::new(height);
        chain.state.lock().unwrap().block_time = Some(block_time);
        chain
    }

    /// The current height.
    pub fn height(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.tick();
        state.height
    }

    /// Jump to `height`.
    pub fn set_height(&self, height: u64) {
        let mut state = self.state.lock().unwrap();
        state.height = height;
        state.mined_at = Instant::now();
    }

    /// Set the base fee reported for the latest block.
    pub fn set_base_fee(&self, base_fee: u128) {
        self.state.lock().unwrap().base_fee = base_fee;
    }

    /// Make every read fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// Place transactions in `block`.
    pub fn include(&self, block: u64, hashes: &[TxHash]) {
        self.state.lock().unwrap().blocks.entry(block).or_default().extend_from_slice(hashes);
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    fn read<T>(&self, f: impl FnOnce(&ChainState) -> T) -> Result<T, MockError> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        if state.failing {
            return Err(MockError::new("chain unavailable"));
        }
        state.tick();
        Ok(f(&state))
    }
}

impl ChainReader for MockChain {
    type Error = MockError;

    async fn block_number(&self) -> Result<u64, Self::Error> {
        self.read(|state| state.height)
    }

    async fn base_fee(&self) -> Result<u128, Self::Error> {
        self.read(|state| state.base_fee)
    }

    async fn block_transactions(&self, number: u64) -> Result<Option<Vec<TxHash>>, Self::Error> {
        self.read(|state| {
            (number <= state.height).then(|| state.blocks.get(&number).cloned().unwrap_or_default())
        })
    }
}
