//! Constants for local test networks.

use crate::NetworkConstants;

/// Name for the network.
pub const NAME: &str = "test";
/// Test chain id.
pub const CHAIN_ID: u64 = 31337;
/// Relay URL used in tests. Nothing listens here.
pub const RELAY_URL: &str = "http://localhost:18545";

/// Test slot duration in seconds.
pub const SLOT_DURATION: u64 = 12;

/// Network constants for tests.
pub const TEST_NETWORK: NetworkConstants =
    NetworkConstants::new(NAME, CHAIN_ID, RELAY_URL, SLOT_DURATION);
