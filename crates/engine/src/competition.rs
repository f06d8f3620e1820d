use crate::ConflictSource;
use alloy::primitives::U256;
use courier_types::{
    config::CompetitionConfig, BlockTarget, Bundle, CompetingBundle, SimulationResult,
};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Errors returned by [`CompetitionMonitor::check_conflicts`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CompetitionError {
    /// The relay did not answer in time.
    #[error("conflict lookup timed out after {0:?}")]
    Timeout(Duration),
    /// The relay lookup failed.
    #[error("conflict lookup failed: {0}")]
    Relay(#[source] Box<dyn core::error::Error + Send + Sync>),
}

/// The advisory outcome of a competition check.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CompetitionReport {
    /// The conflicting bundle, if one was found.
    pub competitor: Option<CompetingBundle>,
    /// Our effective priority fee per gas, in wei.
    pub effective_priority_fee: U256,
    /// The competitor pays more per gas than we do.
    pub likely_outbid: bool,
}

/// Compares our bundle against conflicting bundles seen by the relay.
///
/// The monitor never blocks submission. Lookup failures produce a report
/// without a competitor.
#[derive(Debug, Clone)]
pub struct CompetitionMonitor<R> {
    relay: R,
    config: CompetitionConfig,
}

impl<R> CompetitionMonitor<R> {
    /// Create a new monitor.
    pub const fn new(relay: R, config: CompetitionConfig) -> Self {
        Self { relay, config }
    }

    /// Get a reference to the relay.
    pub const fn relay(&self) -> &R {
        &self.relay
    }
}

impl<R> CompetitionMonitor<R>
where
    R: ConflictSource + Sync,
{
    /// Ask the relay for a bundle conflicting with ours at the target.
    pub async fn check_conflicts(
        &self,
        bundle: &Bundle,
        target: &BlockTarget,
    ) -> Result<Option<CompetingBundle>, CompetitionError> {
        let lookup = self.relay.conflicting_bundle(bundle.txs(), target.block_number());
        tokio::time::timeout(self.config.timeout, lookup)
            .await
            .map_err(|_| CompetitionError::Timeout(self.config.timeout))?
            .map_err(|error| CompetitionError::Relay(Box::new(error)))
    }

    /// Check for conflicts and compare the competitor's fee to ours.
    #[instrument(skip_all, fields(bundle_id = %bundle.id(), target = target.block_number()))]
    pub async fn assess(
        &self,
        bundle: &Bundle,
        target: &BlockTarget,
        simulation: &SimulationResult,
        base_fee: u128,
    ) -> CompetitionReport {
        let effective_priority_fee = simulation.effective_priority_fee(base_fee);

        let competitor = match self.check_conflicts(bundle, target).await {
            Ok(competitor) => competitor,
            Err(e) => {
                warn!(%e, "Competition check failed, continuing without it");
                None
            }
        };

        let likely_outbid = competitor.is_some_and(|c| c.outbids(effective_priority_fee));
        if let Some(competitor) = competitor {
            debug!(
                kind = %competitor.conflict_kind,
                theirs = %competitor.competitor_priority_fee,
                ours = %effective_priority_fee,
                likely_outbid,
                "Found competing bundle"
            );
        }

        CompetitionReport { competitor, effective_priority_fee, likely_outbid }
    }
}
