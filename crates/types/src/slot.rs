//! Utilities for converting block leads into wall-clock time.

use courier_constants::NetworkConstants;
use std::time::Duration;

/// A slot calculator, which converts a number of blocks into the wall-clock
/// time they cover.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SlotCalculator {
    /// The slot duration in seconds.
    slot_duration: u64,
}

impl SlotCalculator {
    /// Creates a new slot calculator.
    pub const fn new(slot_duration: u64) -> Self {
        Self { slot_duration }
    }

    /// Creates a new slot calculator from a network's constants.
    pub const fn for_network(constants: NetworkConstants) -> Self {
        Self::new(constants.slot_duration())
    }

    /// Wall-clock time covered by `blocks` slots.
    pub const fn lead_time(&self, blocks: u64) -> Duration {
        Duration::from_secs(blocks.saturating_mul(self.slot_duration))
    }

    /// The slot duration, usually 12 seconds.
    pub const fn slot_duration(&self) -> u64 {
        self.slot_duration
    }
}

impl From<NetworkConstants> for SlotCalculator {
    fn from(constants: NetworkConstants) -> Self {
        Self::for_network(constants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_time() {
        let calculator = SlotCalculator::from(courier_constants::mainnet::MAINNET);
        assert_eq!(calculator.slot_duration(), 12);
        assert_eq!(calculator.lead_time(0), Duration::ZERO);
        assert_eq!(calculator.lead_time(3), Duration::from_secs(36));
        assert_eq!(SlotCalculator::new(u64::MAX).lead_time(2), Duration::from_secs(u64::MAX));
    }
}
