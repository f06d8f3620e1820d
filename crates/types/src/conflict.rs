use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// The way a competing bundle conflicts with ours.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Competes for the same inclusion slot on price alone.
    GasPriceConflict,
    /// Uses the same sender nonce.
    NonceConflict,
    /// Touches the same storage slots.
    StorageConflict,
}

impl core::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::GasPriceConflict => "gas-price",
            Self::NonceConflict => "nonce",
            Self::StorageConflict => "storage",
        })
    }
}

/// A bundle seen by the relay that targets the same block as ours and
/// conflicts with it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetingBundle {
    /// How the bundles conflict.
    pub conflict_kind: ConflictKind,
    /// The competitor's effective priority fee per gas, in wei.
    pub competitor_priority_fee: U256,
}

impl CompetingBundle {
    /// Create a new competing bundle record.
    pub const fn new(conflict_kind: ConflictKind, competitor_priority_fee: U256) -> Self {
        Self { conflict_kind, competitor_priority_fee }
    }

    /// True if the competitor pays more per gas than `ours`.
    pub fn outbids(&self, ours: U256) -> bool {
        self.competitor_priority_fee > ours
    }
}
