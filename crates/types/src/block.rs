use serde::{Deserialize, Serialize};

/// A future block selected as the delivery target of an attempt.
///
/// Whether the block qualifies is always derived from the block number and
/// the divisor it was selected with, see [`BlockTarget::qualifies`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTarget {
    /// The targeted block number.
    block_number: u64,
    /// The divisor `K` the target was selected against.
    divisor: u64,
    /// Blocks between the observed chain height and the target.
    lead_blocks: u64,
}

impl BlockTarget {
    /// Create a new target.
    pub const fn new(block_number: u64, divisor: u64, lead_blocks: u64) -> Self {
        Self { block_number, divisor, lead_blocks }
    }

    /// Get the targeted block number.
    pub const fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Get the divisor the target was selected against.
    pub const fn divisor(&self) -> u64 {
        self.divisor
    }

    /// Get the number of blocks between the observed height and the target.
    pub const fn lead_blocks(&self) -> u64 {
        self.lead_blocks
    }

    /// The chain height observed when the target was selected.
    pub const fn observed_height(&self) -> u64 {
        self.block_number.saturating_sub(self.lead_blocks)
    }

    /// True if `block_number mod divisor == 0`. A zero divisor never
    /// qualifies.
    pub const fn qualifies(&self) -> bool {
        match self.block_number.checked_rem(self.divisor) {
            Some(rem) => rem == 0,
            None => false,
        }
    }

    /// The last block covered when fanning out over `window` consecutive
    /// blocks starting at the target. A window of zero is treated as one.
    pub const fn last_block(&self, window: u64) -> u64 {
        self.block_number + window.saturating_sub(1)
    }
}

impl core::fmt::Display for BlockTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "block {} (lead {})", self.block_number, self.lead_blocks)
    }
}
