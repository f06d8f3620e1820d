//! Constants for the Holesky testnet.

use crate::NetworkConstants;

/// Name for the network.
pub const NAME: &str = "holesky";
/// Chain ID for Holesky.
pub const CHAIN_ID: u64 = 17000;
/// Flashbots relay endpoint for Holesky.
pub const RELAY_URL: &str = "https://relay-holesky.flashbots.net";

/// Slot duration in seconds.
pub const SLOT_DURATION: u64 = 12;

/// Network constants for Holesky.
pub const HOLESKY: NetworkConstants =
    NetworkConstants::new(NAME, CHAIN_ID, RELAY_URL, SLOT_DURATION);
