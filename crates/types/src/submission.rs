use crate::BundleId;
use alloy::primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single delivery channel: one builder endpoint, one block number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelId {
    /// Name of the builder endpoint.
    pub endpoint: String,
    /// Block number the bundle is submitted for on this channel.
    pub block_number: u64,
}

impl ChannelId {
    /// Create a new channel id.
    pub fn new(endpoint: impl Into<String>, block_number: u64) -> Self {
        Self { endpoint: endpoint.into(), block_number }
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.endpoint, self.block_number)
    }
}

/// A builder's acknowledgement of a submitted bundle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleAck {
    /// The bundle hash reported by the builder, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_hash: Option<B256>,
}

/// What happened to a single channel call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttemptOutcome {
    /// The channel acknowledged the bundle.
    Acked {
        /// The bundle hash reported by the channel.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bundle_hash: Option<B256>,
    },
    /// The channel failed or rejected the bundle.
    Failed {
        /// Description of the failure.
        reason: String,
    },
    /// The call was still pending when the latency budget expired.
    Cancelled,
}

/// The record of submitting one bundle on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAttempt {
    /// The submitted bundle.
    pub bundle_id: BundleId,
    /// The channel used.
    pub channel_id: ChannelId,
    /// When the call was started.
    pub submitted_at: DateTime<Utc>,
    /// True if the channel acknowledged the bundle.
    pub acked: bool,
    /// Details of the call's outcome.
    pub outcome: AttemptOutcome,
}

impl SubmissionAttempt {
    /// An acknowledged attempt.
    pub const fn acked(
        bundle_id: BundleId,
        channel_id: ChannelId,
        submitted_at: DateTime<Utc>,
        ack: BundleAck,
    ) -> Self {
        Self {
            bundle_id,
            channel_id,
            submitted_at,
            acked: true,
            outcome: AttemptOutcome::Acked { bundle_hash: ack.bundle_hash },
        }
    }

    /// A failed attempt.
    pub fn failed(
        bundle_id: BundleId,
        channel_id: ChannelId,
        submitted_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            bundle_id,
            channel_id,
            submitted_at,
            acked: false,
            outcome: AttemptOutcome::Failed { reason: reason.into() },
        }
    }

    /// An attempt cancelled at the latency budget.
    pub const fn cancelled(
        bundle_id: BundleId,
        channel_id: ChannelId,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let outcome = AttemptOutcome::Cancelled;
        Self { bundle_id, channel_id, submitted_at, acked: false, outcome }
    }

    /// The bundle hash reported by the channel, if it acknowledged one.
    pub const fn bundle_hash(&self) -> Option<B256> {
        match &self.outcome {
            AttemptOutcome::Acked { bundle_hash } => *bundle_hash,
            _ => None,
        }
    }

    /// True if the call was cancelled at the latency budget.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Cancelled)
    }
}
