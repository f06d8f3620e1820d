pub mod chain;
pub mod payloads;
pub mod relay;
pub mod source;
pub mod users;

pub use courier_constants::test_utils as test_constants;
pub use courier_engine::MemoryStatsSink;

use courier_types::SlotCalculator;

/// A mock failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mock failure: {0}")]
pub struct MockError(pub String);

impl MockError {
    /// Create a new mock error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A slot calculator for the test network.
pub fn test_slots() -> SlotCalculator {
    SlotCalculator::from(test_constants::TEST_NETWORK)
}

/// Install a fmt subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
