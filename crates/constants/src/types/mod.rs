mod chains;
pub use chains::{KnownNetworks, ParseNetworkError};

use core::time::Duration;

/// Constants for a single network.
///
/// These determine where bundles are sent by default and how the engine
/// converts a lead measured in blocks into wall-clock time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NetworkConstants {
    /// Human readable network name.
    name: &'static str,
    /// Chain ID.
    chain_id: u64,
    /// Default relay endpoint.
    relay_url: &'static str,
    /// Slot duration in seconds.
    slot_duration: u64,
}

impl NetworkConstants {
    /// Create a new set of constants.
    pub const fn new(
        name: &'static str,
        chain_id: u64,
        relay_url: &'static str,
        slot_duration: u64,
    ) -> Self {
        Self { name, chain_id, relay_url, slot_duration }
    }

    /// Get the network name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Get the chain ID.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get the default relay URL.
    pub const fn relay_url(&self) -> &'static str {
        self.relay_url
    }

    /// The slot duration in seconds, usually 12.
    pub const fn slot_duration(&self) -> u64 {
        self.slot_duration
    }

    /// The slot duration as a [`Duration`].
    pub const fn block_time(&self) -> Duration {
        Duration::from_secs(self.slot_duration)
    }
}

impl From<KnownNetworks> for NetworkConstants {
    fn from(network: KnownNetworks) -> Self {
        network.constants()
    }
}
