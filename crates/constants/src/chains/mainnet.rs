//! Constants for Ethereum mainnet.

use crate::NetworkConstants;

/// Name for the network.
pub const NAME: &str = "mainnet";
/// Chain ID for Ethereum mainnet.
pub const CHAIN_ID: u64 = 1;
/// Flashbots relay endpoint for mainnet.
pub const RELAY_URL: &str = "https://relay.flashbots.net";

/// Slot duration in seconds.
pub const SLOT_DURATION: u64 = 12;

/// Network constants for mainnet.
pub const MAINNET: NetworkConstants =
    NetworkConstants::new(NAME, CHAIN_ID, RELAY_URL, SLOT_DURATION);
