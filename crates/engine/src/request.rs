use alloy::primitives::U256;
use courier_types::{BlockTarget, BundleStats, BundleStatus};

/// What the previous attempt of a campaign learned, passed to the
/// [`BundleSource`] so it can adjust cost limits.
///
/// [`BundleSource`]: crate::BundleSource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptAdvice {
    /// Final status of the previous bundle.
    pub status: BundleStatus,
    /// The previous bundle was likely outbid.
    pub likely_outbid: bool,
    /// The competitor's effective priority fee, if one was seen.
    pub competitor_fee: Option<U256>,
    /// Our effective priority fee, if it was computed.
    pub our_fee: Option<U256>,
    /// Why the previous attempt failed, if known.
    pub reason: Option<String>,
}

impl AttemptAdvice {
    /// Derive advice from the stats of a finished attempt.
    pub fn from_stats(stats: &BundleStats) -> Self {
        let reason = stats
            .simulation
            .as_ref()
            .and_then(|sim| sim.revert_reason.clone())
            .or_else(|| stats.notes.last().cloned());
        Self {
            status: stats.status,
            likely_outbid: stats.likely_outbid,
            competitor_fee: stats.competitor.map(|c| c.competitor_priority_fee),
            our_fee: stats.effective_priority_fee,
            reason,
        }
    }

    /// Advice for an attempt that never produced a bundle.
    pub fn without_bundle(reason: impl Into<String>) -> Self {
        Self {
            status: BundleStatus::Rejected,
            likely_outbid: false,
            competitor_fee: None,
            our_fee: None,
            reason: Some(reason.into()),
        }
    }
}

/// A request for a fresh bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// One-based attempt number within the campaign.
    pub attempt: u32,
    /// The block the bundle will target.
    pub target: BlockTarget,
    /// Base fee of the latest block, in wei. Zero if it could not be read.
    pub base_fee: u128,
    /// Advice from the previous attempt, if any.
    pub previous: Option<AttemptAdvice>,
}

impl BuildRequest {
    /// Create a request for a first attempt.
    pub const fn new(attempt: u32, target: BlockTarget, base_fee: u128) -> Self {
        Self { attempt, target, base_fee, previous: None }
    }

    /// Attach advice from the previous attempt.
    pub fn with_previous(mut self, previous: Option<AttemptAdvice>) -> Self {
        self.previous = previous;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;
    use courier_types::{Bundle, BundleDraft, CompetingBundle, ConflictKind, SimulationResult};

    #[test]
    fn advice_from_rejected_stats() {
        let bundle = Bundle::new(BundleDraft::new(vec![Bytes::from_static(&[1])], 1, U256::ZERO));
        let mut stats = BundleStats::new(&bundle, 100, 1);
        stats.record_simulation(SimulationResult::failed(5, U256::ZERO, "gas exceeds limit"));
        stats.record_status(BundleStatus::Rejected);

        let advice = AttemptAdvice::from_stats(&stats);
        assert_eq!(advice.status, BundleStatus::Rejected);
        assert_eq!(advice.reason.as_deref(), Some("gas exceeds limit"));
        assert!(!advice.likely_outbid);
    }

    #[test]
    fn advice_carries_competition() {
        let bundle = Bundle::new(BundleDraft::new(vec![Bytes::from_static(&[1])], 1, U256::ZERO));
        let mut stats = BundleStats::new(&bundle, 100, 1);
        let competitor = CompetingBundle::new(ConflictKind::GasPriceConflict, U256::from(9));
        stats.record_competition(Some(competitor), U256::from(3), true);
        stats.note("missed");

        let advice = AttemptAdvice::from_stats(&stats);
        assert!(advice.likely_outbid);
        assert_eq!(advice.competitor_fee, Some(U256::from(9)));
        assert_eq!(advice.our_fee, Some(U256::from(3)));
        assert_eq!(advice.reason.as_deref(), Some("missed"));
    }
}
