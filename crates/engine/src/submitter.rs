use crate::BundleSubmitter;
use chrono::Utc;
use courier_types::{
    config::SubmissionConfig, BlockTarget, Bundle, BundleId, BundleStatus, ChannelId,
    StatusTransitionError, SubmissionAttempt,
};
use futures_util::{stream::FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::{sync::Semaphore, time::Instant};
use tracing::{debug, instrument, warn};

/// Errors returned by [`MultiChannelSubmitter::submit`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SubmitError {
    /// Only bundles that passed simulation may be submitted.
    #[error("bundle is {0}, only simulated bundles can be submitted")]
    NotSimulated(BundleStatus),
    /// The bundle status could not be updated.
    #[error(transparent)]
    Status(#[from] StatusTransitionError),
}

/// The result of fanning a bundle out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    /// One attempt per channel that was not a duplicate, in channel order.
    pub attempts: Vec<SubmissionAttempt>,
    /// The latency budget expired with calls still pending.
    pub degraded: bool,
    /// Channels skipped because the bundle was already submitted on them.
    pub duplicates: Vec<ChannelId>,
    /// Wall-clock time spent fanning out.
    pub elapsed: Duration,
}

impl SubmissionReport {
    /// Number of channels that acknowledged the bundle.
    pub fn acked(&self) -> usize {
        self.attempts.iter().filter(|a| a.acked).count()
    }

    /// The first bundle hash reported by any channel.
    pub fn bundle_hash(&self) -> Option<alloy::primitives::B256> {
        self.attempts.iter().find_map(SubmissionAttempt::bundle_hash)
    }
}

/// Fans bundles out to several builder endpoints and block numbers at once.
///
/// A channel is one endpoint paired with one block number. Calls run
/// concurrently, bounded by a shared semaphore, and the whole fan-out is
/// bounded by the latency budget. Calls still pending at the budget are
/// dropped and recorded as cancelled. Failures on one channel never affect
/// another.
#[derive(Debug)]
pub struct MultiChannelSubmitter<S> {
    endpoints: Vec<S>,
    config: SubmissionConfig,
    permits: Arc<Semaphore>,
    seen: Mutex<HashSet<(BundleId, ChannelId)>>,
}

impl<S> MultiChannelSubmitter<S> {
    /// Create a new submitter with its own concurrency limit.
    pub fn new(endpoints: Vec<S>, config: SubmissionConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.concurrency_limit.max(1)));
        Self::with_permits(endpoints, config, permits)
    }

    /// Create a new submitter sharing a concurrency limit with other users
    /// of the same relay pool.
    pub fn with_permits(
        endpoints: Vec<S>,
        config: SubmissionConfig,
        permits: Arc<Semaphore>,
    ) -> Self {
        Self { endpoints, config, permits, seen: Mutex::new(HashSet::new()) }
    }

    /// Get the endpoints.
    pub fn endpoints(&self) -> &[S] {
        &self.endpoints
    }

    /// Get the submission configuration.
    pub const fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Forget which channels bundles were submitted on.
    pub fn clear_history(&self) {
        self.seen.lock().clear();
    }
}

impl<S> MultiChannelSubmitter<S>
where
    S: BundleSubmitter,
{
    /// Every endpoint paired with every block in the window starting at the
    /// target.
    pub fn channels(&self, target: &BlockTarget) -> Vec<ChannelId> {
        let window = self.config.block_window.max(1);
        (target.block_number()..target.block_number().saturating_add(window))
            .flat_map(|block| {
                self.endpoints
                    .iter()
                    .map(move |endpoint| ChannelId::new(endpoint.endpoint(), block))
            })
            .collect()
    }

    /// Claim the channels not yet used for this bundle.
    fn claim(&self, id: BundleId, channels: &[ChannelId]) -> (Vec<ChannelId>, Vec<ChannelId>) {
        let mut seen = self.seen.lock();
        channels.iter().cloned().partition(|channel| seen.insert((id, channel.clone())))
    }
}

impl<S> MultiChannelSubmitter<S>
where
    S: BundleSubmitter + Sync,
{
    /// Submit `bundle` on every channel it was not yet submitted on.
    ///
    /// The bundle must have passed simulation. It moves to
    /// [`BundleStatus::Submitted`] once the fan-out completes, whether or not
    /// the fan-out was degraded.
    #[instrument(skip_all, fields(
        bundle_id = %bundle.id(),
        target = target.block_number(),
        channels = channels.len(),
    ))]
    pub async fn submit(
        &self,
        bundle: &mut Bundle,
        target: &BlockTarget,
        channels: &[ChannelId],
    ) -> Result<SubmissionReport, SubmitError> {
        let status = bundle.status();
        if !matches!(status, BundleStatus::Simulated | BundleStatus::Submitted) {
            return Err(SubmitError::NotSimulated(status));
        }

        let (fresh, duplicates) = self.claim(bundle.id(), channels);
        if !duplicates.is_empty() {
            debug!(duplicates = duplicates.len(), "Skipping channels already used");
        }

        let started = Instant::now();
        let (attempts, degraded) = self.fan_out(bundle, &fresh, started).await;
        let elapsed = started.elapsed();

        if status == BundleStatus::Simulated {
            bundle.advance(BundleStatus::Submitted)?;
        }

        let report = SubmissionReport { attempts, degraded, duplicates, elapsed };
        debug!(
            acked = report.acked(),
            attempted = report.attempts.len(),
            degraded,
            elapsed_ms = elapsed.as_millis() as u64,
            "Fan-out complete"
        );
        Ok(report)
    }

    async fn fan_out(
        &self,
        bundle: &Bundle,
        channels: &[ChannelId],
        started: Instant,
    ) -> (Vec<SubmissionAttempt>, bool) {
        let id = bundle.id();
        let fanout_at = Utc::now();
        let mut slots: Vec<Option<SubmissionAttempt>> = vec![None; channels.len()];

        let mut pending: FuturesUnordered<_> = channels
            .iter()
            .enumerate()
            .map(|(index, channel)| async move {
                let Some(endpoint) =
                    self.endpoints.iter().find(|e| e.endpoint() == channel.endpoint)
                else {
                    let attempt = SubmissionAttempt::failed(
                        id,
                        channel.clone(),
                        Utc::now(),
                        "unknown endpoint",
                    );
                    return (index, attempt);
                };

                // The semaphore is never closed.
                let _permit = self.permits.acquire().await.ok();
                let submitted_at = Utc::now();
                let attempt = match endpoint.submit_bundle(bundle, channel.block_number).await {
                    Ok(ack) => SubmissionAttempt::acked(id, channel.clone(), submitted_at, ack),
                    Err(e) => {
                        warn!(%e, %channel, "Channel rejected bundle");
                        SubmissionAttempt::failed(id, channel.clone(), submitted_at, e.to_string())
                    }
                };
                (index, attempt)
            })
            .collect();

        let deadline = started + self.config.latency_budget;
        let mut degraded = false;
        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((index, attempt))) => slots[index] = Some(attempt),
                Ok(None) => break,
                Err(_) => {
                    degraded = true;
                    warn!(pending = pending.len(), "Latency budget expired, cancelling channels");
                    break;
                }
            }
        }
        // Dropping the remaining futures cancels their calls.
        drop(pending);

        let attempts = slots
            .into_iter()
            .zip(channels)
            .map(|(slot, channel)| {
                slot.unwrap_or_else(|| SubmissionAttempt::cancelled(id, channel.clone(), fanout_at))
            })
            .collect();
        (attempts, degraded)
    }
}
