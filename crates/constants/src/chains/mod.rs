/// Ethereum mainnet constants.
pub mod mainnet;

/// Sepolia testnet constants.
pub mod sepolia;

/// Holesky testnet constants.
pub mod holesky;

/// Test utilities for networks.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
