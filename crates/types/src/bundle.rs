use alloy::primitives::{keccak256, Bytes, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a [`Bundle`].
///
/// The id is also used as the relay `replacementUuid`, so that a bundle can
/// be cancelled after its target block was missed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(Uuid);

impl BundleId {
    /// Generate a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing [`Uuid`].
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner [`Uuid`].
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl core::fmt::Display for BundleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// The output of a bundle source: signed transactions plus the limits the
/// source declared for them. The engine never inspects the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDraft {
    /// EIP-2718 encoded signed transactions.
    pub txs: Vec<Bytes>,
    /// Maximum gas the bundle is expected to consume.
    pub declared_max_gas: u64,
    /// Maximum total cost, in wei, the source is willing to pay.
    pub declared_max_cost: U256,
}

impl BundleDraft {
    /// Create a new draft.
    pub const fn new(txs: Vec<Bytes>, declared_max_gas: u64, declared_max_cost: U256) -> Self {
        Self { txs, declared_max_gas, declared_max_cost }
    }
}

/// Lifecycle of a single [`Bundle`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BundleStatus {
    /// Built, not yet simulated.
    Created,
    /// Passed the simulation gate.
    Simulated,
    /// Failed the simulation gate.
    Rejected,
    /// Sent to at least one channel.
    Submitted,
    /// Landed in a targeted block.
    Included,
    /// Targeted blocks passed without the bundle landing.
    Missed,
    /// Abandoned, due to cancellation or an exhausted deadline.
    Expired,
}

impl BundleStatus {
    /// True if no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Included | Self::Missed | Self::Expired)
    }

    /// True if the status may move forward to `next`.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Simulated | Self::Rejected | Self::Expired)
                | (Self::Simulated, Self::Submitted | Self::Expired)
                | (Self::Submitted, Self::Included | Self::Missed | Self::Expired)
        )
    }

    /// Get the status name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Simulated => "simulated",
            Self::Rejected => "rejected",
            Self::Submitted => "submitted",
            Self::Included => "included",
            Self::Missed => "missed",
            Self::Expired => "expired",
        }
    }
}

impl core::fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a bundle status would move backwards or skip a step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal bundle status transition {from} -> {to}")]
pub struct StatusTransitionError {
    /// The current status.
    pub from: BundleStatus,
    /// The requested status.
    pub to: BundleStatus,
}

/// A bundle owned by exactly one delivery attempt.
///
/// Retries never reuse a bundle: the coordinator builds a new one, with a new
/// [`BundleId`], for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    id: BundleId,
    txs: Vec<Bytes>,
    tx_hashes: Vec<TxHash>,
    declared_max_gas: u64,
    declared_max_cost: U256,
    status: BundleStatus,
    created_at: DateTime<Utc>,
}

impl Bundle {
    /// Create a bundle with a fresh id from a draft.
    pub fn new(draft: BundleDraft) -> Self {
        Self::with_id(BundleId::random(), draft)
    }

    /// Create a bundle with a specific id from a draft.
    pub fn with_id(id: BundleId, draft: BundleDraft) -> Self {
        let BundleDraft { txs, declared_max_gas, declared_max_cost } = draft;
        // The hash of a signed EIP-2718 envelope is the keccak of its
        // encoding, for legacy and typed transactions alike.
        let tx_hashes = txs.iter().map(keccak256).collect();
        Self {
            id,
            txs,
            tx_hashes,
            declared_max_gas,
            declared_max_cost,
            status: BundleStatus::Created,
            created_at: Utc::now(),
        }
    }

    /// Get the bundle id.
    pub const fn id(&self) -> BundleId {
        self.id
    }

    /// Get the signed transactions.
    pub fn txs(&self) -> &[Bytes] {
        &self.txs
    }

    /// Get the hashes of the signed transactions.
    pub fn tx_hashes(&self) -> &[TxHash] {
        &self.tx_hashes
    }

    /// True if the bundle carries no transactions.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Get the declared gas limit.
    pub const fn declared_max_gas(&self) -> u64 {
        self.declared_max_gas
    }

    /// Get the declared cost limit, in wei.
    pub const fn declared_max_cost(&self) -> U256 {
        self.declared_max_cost
    }

    /// Get the current status.
    pub const fn status(&self) -> BundleStatus {
        self.status
    }

    /// Get the creation time.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Move the bundle forward to `next`.
    pub fn advance(&mut self, next: BundleStatus) -> Result<(), StatusTransitionError> {
        if !self.status.can_advance_to(next) {
            return Err(StatusTransitionError { from: self.status, to: next });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BundleDraft {
        BundleDraft::new(vec![Bytes::from_static(&[0x02, 0xaa])], 21_000, U256::from(1_000))
    }

    #[test]
    fn hashes_follow_payload() {
        let bundle = Bundle::new(draft());
        assert_eq!(bundle.tx_hashes(), &[keccak256([0x02u8, 0xaa])]);
        assert_eq!(bundle.status(), BundleStatus::Created);
        assert!(!bundle.is_empty());
    }

    #[test]
    fn fresh_bundles_get_fresh_ids() {
        assert_ne!(Bundle::new(draft()).id(), Bundle::new(draft()).id());
    }

    #[test]
    fn status_only_moves_forward() {
        let mut bundle = Bundle::new(draft());
        bundle.advance(BundleStatus::Simulated).unwrap();
        bundle.advance(BundleStatus::Submitted).unwrap();

        let err = bundle.advance(BundleStatus::Simulated).unwrap_err();
        assert_eq!(
            err,
            StatusTransitionError { from: BundleStatus::Submitted, to: BundleStatus::Simulated }
        );

        bundle.advance(BundleStatus::Missed).unwrap();
        assert!(bundle.status().is_terminal());
        assert!(bundle.advance(BundleStatus::Included).is_err());
    }

    #[test]
    fn rejected_bundle_cannot_be_submitted() {
        let mut bundle = Bundle::new(draft());
        bundle.advance(BundleStatus::Rejected).unwrap();
        assert!(bundle.advance(BundleStatus::Submitted).is_err());
    }

    #[test]
    fn created_cannot_skip_simulation() {
        assert!(!BundleStatus::Created.can_advance_to(BundleStatus::Submitted));
        assert!(BundleStatus::Created.can_advance_to(BundleStatus::Expired));
    }
}
