use crate::{BundleStatusSource, ChainReader};
use alloy::primitives::B256;
use courier_types::{
    config::VerifierConfig, BlockTarget, Bundle, InclusionOutcome, RelayBundleStatus,
};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, trace, warn};

/// Errors returned by [`InclusionVerifier::verify`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VerifyError {
    /// The chain did not reach the confirmation height in time.
    #[error("chain did not reach block {awaited} within {waited:?}")]
    Timeout {
        /// The height waited for.
        awaited: u64,
        /// How long the verifier waited.
        waited: Duration,
    },
    /// A block in the targeted range could not be read.
    #[error("block {0} is not available")]
    BlockUnavailable(u64),
    /// Reading a block failed.
    #[error("failed to read block {number}: {source}")]
    Chain {
        /// The block being read.
        number: u64,
        /// The underlying error.
        #[source]
        source: Box<dyn core::error::Error + Send + Sync>,
    },
}

/// The verdict on a submitted bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// What the chain says.
    pub outcome: InclusionOutcome,
    /// What the relay says, if it answered.
    pub relay_status: Option<RelayBundleStatus>,
    /// The relay report contradicts the chain.
    pub disagreement: bool,
    /// The chain height once confirmation was reached.
    pub confirmed_at: u64,
}

/// Confirms whether a submitted bundle landed.
///
/// The chain is the source of truth. The relay's own report is collected for
/// the audit record, and its absence never fails verification.
#[derive(Debug, Clone)]
pub struct InclusionVerifier<C, R> {
    chain: C,
    relay: R,
    config: VerifierConfig,
}

impl<C, R> InclusionVerifier<C, R> {
    /// Create a new verifier.
    pub const fn new(chain: C, relay: R, config: VerifierConfig) -> Self {
        Self { chain, relay, config }
    }

    /// Get the verifier configuration.
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }
}

impl<C, R> InclusionVerifier<C, R>
where
    C: ChainReader + Sync,
    R: BundleStatusSource + Sync,
{
    /// Wait for `last_block` plus the confirmation margin, then look for the
    /// bundle's transactions in every block up to that height.
    ///
    /// A hit in `target..=last_block` is an inclusion. A hit in one of the
    /// confirmation blocks after it means the payload executed outside the
    /// targeted window, which is never reported as a miss.
    #[instrument(skip_all, fields(
        bundle_id = %bundle.id(),
        target = target.block_number(),
        last_block,
    ))]
    pub async fn verify(
        &self,
        bundle: &Bundle,
        target: &BlockTarget,
        last_block: u64,
        bundle_hash: Option<B256>,
    ) -> Result<Verification, VerifyError> {
        let last_block = last_block.max(target.block_number());
        let confirmed_at = self.wait_for(target, last_block).await?;

        let relay_status = match bundle_hash {
            Some(hash) => self.relay_status(hash, target.block_number()).await,
            None => None,
        };

        let outcome = self.scan(bundle, target.block_number(), last_block).await?;

        // Only a relay claiming it never forwarded a bundle that then landed
        // is a contradiction. Forwarded bundles miss all the time.
        let disagreement = outcome.is_included()
            && relay_status.as_ref().is_some_and(|status| !status.is_sent_to_builders);
        if disagreement {
            warn!("Relay reports bundle was never forwarded, but it landed on chain");
        }

        debug!(?outcome, confirmed_at, "Verified bundle");
        Ok(Verification { outcome, relay_status, disagreement, confirmed_at })
    }

    /// Poll the chain until it reaches `last_block + margin`.
    async fn wait_for(&self, target: &BlockTarget, last_block: u64) -> Result<u64, VerifyError> {
        let awaited = last_block.saturating_add(self.config.confirmation_margin);
        let limit = self.config.wait_limit(awaited.saturating_sub(target.observed_height()));
        let started = Instant::now();
        let deadline = started + limit;

        loop {
            match tokio::time::timeout_at(deadline, self.chain.block_number()).await {
                Ok(Ok(height)) if height >= awaited => return Ok(height),
                Ok(Ok(height)) => trace!(height, awaited, "Waiting for confirmation"),
                Ok(Err(e)) => warn!(%e, "Failed to read chain height, retrying"),
                Err(_) => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(VerifyError::Timeout { awaited, waited: started.elapsed() });
            }
            tokio::time::sleep_until(deadline.min(now + self.config.poll_interval)).await;
        }
    }

    async fn relay_status(&self, hash: B256, block_number: u64) -> Option<RelayBundleStatus> {
        match tokio::time::timeout(
            self.config.relay_timeout,
            self.relay.bundle_status(hash, block_number),
        )
        .await
        {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                warn!(%e, "Relay bundle status unavailable");
                None
            }
            Err(_) => {
                warn!("Relay bundle status timed out");
                None
            }
        }
    }

    async fn scan(
        &self,
        bundle: &Bundle,
        first: u64,
        last: u64,
    ) -> Result<InclusionOutcome, VerifyError> {
        let confirmed = last.saturating_add(self.config.confirmation_margin);
        for number in first..=confirmed {
            let hashes = self
                .chain
                .block_transactions(number)
                .await
                .map_err(|e| VerifyError::Chain { number, source: Box::new(e) })?
                .ok_or(VerifyError::BlockUnavailable(number))?;

            if !hashes.iter().any(|hash| bundle.tx_hashes().contains(hash)) {
                continue;
            }
            if number <= last {
                return Ok(InclusionOutcome::Included { block: number });
            }
            warn!(block = number, last, "Bundle landed after the targeted blocks");
            return Ok(InclusionOutcome::LandedOutsideWindow { block: number });
        }
        Ok(InclusionOutcome::Missed)
    }
}
