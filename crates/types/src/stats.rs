use crate::{
    Bundle, BundleId, BundleStatus, CompetingBundle, SimulationResult, SubmissionAttempt,
};
use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The final verdict on a submitted bundle, as observed on chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InclusionOutcome {
    /// A transaction of the bundle landed in `block`.
    Included {
        /// The block containing the bundle.
        block: u64,
    },
    /// A transaction of the bundle landed after the targeted blocks, in one
    /// of the confirmation blocks. The payload executed, but not where it
    /// was aimed.
    LandedOutsideWindow {
        /// The block containing the bundle.
        block: u64,
    },
    /// The targeted blocks and their confirmation blocks passed without the
    /// bundle landing.
    Missed,
    /// The chain could not be read far enough to decide. Nothing is known
    /// about inclusion.
    Unverified,
}

impl InclusionOutcome {
    /// The targeted block the bundle landed in, if it did.
    pub const fn included_block(&self) -> Option<u64> {
        match self {
            Self::Included { block } => Some(*block),
            _ => None,
        }
    }

    /// The block the bundle's transactions landed in, inside the targeted
    /// window or not.
    pub const fn landed_block(&self) -> Option<u64> {
        match self {
            Self::Included { block } | Self::LandedOutsideWindow { block } => Some(*block),
            Self::Missed | Self::Unverified => None,
        }
    }

    /// True if the bundle landed.
    pub const fn is_included(&self) -> bool {
        matches!(self, Self::Included { .. })
    }
}

/// The relay's own report on a bundle. Advisory only; chain state decides
/// the [`InclusionOutcome`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayBundleStatus {
    /// The relay simulated the bundle.
    pub is_simulated: bool,
    /// The relay forwarded the bundle to at least one builder.
    pub is_sent_to_builders: bool,
    /// The relay treated the sender as high priority.
    pub is_high_priority: bool,
    /// When the relay received the bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the relay simulated the bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_at: Option<DateTime<Utc>>,
    /// When the relay first forwarded the bundle to a builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_to_builders_at: Option<DateTime<Utc>>,
}

/// Append-only audit record of one bundle attempt.
///
/// The record is updated as side effects happen and a full snapshot is
/// persisted after each update, keyed by bundle id and target block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleStats {
    /// The bundle this record describes.
    pub bundle_id: BundleId,
    /// The primary target block.
    pub target_block: u64,
    /// One-based attempt number within the campaign.
    pub attempt: u32,
    /// Latest bundle status.
    pub status: BundleStatus,
    /// The bundle was simulated.
    pub is_simulated: bool,
    /// At least one channel acknowledged the bundle.
    pub is_sent: bool,
    /// When fan-out started.
    pub submitted_at: Option<DateTime<Utc>>,
    /// When simulation finished.
    pub simulated_at: Option<DateTime<Utc>>,
    /// When the first channel acknowledged the bundle.
    pub sent_to_builders_at: Option<DateTime<Utc>>,
    /// The block the bundle landed in, even outside the targeted window.
    pub included_block: Option<u64>,
    /// The simulation result.
    pub simulation: Option<SimulationResult>,
    /// A conflicting bundle seen at the target block.
    pub competitor: Option<CompetingBundle>,
    /// Our computed effective priority fee per gas, in wei.
    pub effective_priority_fee: Option<U256>,
    /// The competitor pays more per gas than we do.
    pub likely_outbid: bool,
    /// One entry per channel.
    pub attempts: Vec<SubmissionAttempt>,
    /// The latency budget expired before every channel answered.
    pub degraded: bool,
    /// The relay's self-reported status.
    pub relay_status: Option<RelayBundleStatus>,
    /// The final verdict.
    pub outcome: Option<InclusionOutcome>,
    /// Free-form notes on tolerated failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl BundleStats {
    /// Start a record for a freshly created bundle.
    pub fn new(bundle: &Bundle, target_block: u64, attempt: u32) -> Self {
        Self {
            bundle_id: bundle.id(),
            target_block,
            attempt,
            status: bundle.status(),
            is_simulated: false,
            is_sent: false,
            submitted_at: None,
            simulated_at: None,
            sent_to_builders_at: None,
            included_block: None,
            simulation: None,
            competitor: None,
            effective_priority_fee: None,
            likely_outbid: false,
            attempts: Vec::new(),
            degraded: false,
            relay_status: None,
            outcome: None,
            notes: Vec::new(),
        }
    }

    /// Record a status change.
    pub fn record_status(&mut self, status: BundleStatus) {
        self.status = status;
    }

    /// Record the simulation result.
    pub fn record_simulation(&mut self, result: SimulationResult) {
        self.is_simulated = true;
        self.simulated_at = Some(Utc::now());
        self.simulation = Some(result);
    }

    /// Record the competition assessment.
    pub fn record_competition(
        &mut self,
        competitor: Option<CompetingBundle>,
        effective_priority_fee: U256,
        likely_outbid: bool,
    ) {
        self.competitor = competitor;
        self.effective_priority_fee = Some(effective_priority_fee);
        self.likely_outbid = likely_outbid;
    }

    /// Record a submission attempt. Returns `false`, leaving the record
    /// untouched, if the channel was already recorded.
    pub fn record_attempt(&mut self, attempt: SubmissionAttempt) -> bool {
        if self.attempts.iter().any(|a| a.channel_id == attempt.channel_id) {
            return false;
        }
        if self.submitted_at.map_or(true, |at| attempt.submitted_at < at) {
            self.submitted_at = Some(attempt.submitted_at);
        }
        if attempt.acked {
            self.is_sent = true;
            self.sent_to_builders_at.get_or_insert_with(Utc::now);
        }
        self.attempts.push(attempt);
        true
    }

    /// Mark the fan-out as degraded.
    pub fn mark_degraded(&mut self) {
        self.degraded = true;
    }

    /// Record the relay's self-reported status.
    pub fn record_relay_status(&mut self, status: RelayBundleStatus) {
        self.relay_status = Some(status);
    }

    /// Record the final verdict.
    pub fn record_outcome(&mut self, outcome: InclusionOutcome) {
        self.included_block = outcome.landed_block();
        self.outcome = Some(outcome);
    }

    /// Attach a note.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Number of channels that acknowledged the bundle.
    pub fn acked_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.acked).count()
    }
}
