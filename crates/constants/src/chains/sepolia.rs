//! Constants for the Sepolia testnet.

use crate::NetworkConstants;

/// Name for the network.
pub const NAME: &str = "sepolia";
/// Chain ID for Sepolia.
pub const CHAIN_ID: u64 = 11155111;
/// Flashbots relay endpoint for Sepolia.
pub const RELAY_URL: &str = "https://relay-sepolia.flashbots.net";

/// Slot duration in seconds.
pub const SLOT_DURATION: u64 = 12;

/// Network constants for Sepolia.
pub const SEPOLIA: NetworkConstants =
    NetworkConstants::new(NAME, CHAIN_ID, RELAY_URL, SLOT_DURATION);
