use crate::{
    AttemptAdvice, BuildRequest, BundleCanceller, BundleSimulator, BundleSource,
    BundleStatusSource, BundleSubmitter, ChainReader, CompetitionMonitor, ConflictSource,
    InclusionVerifier, MultiChannelSubmitter, ScheduleError, SimulationGate, StatsSink,
    TargetScheduler,
};
use chrono::{DateTime, Utc};
use core::future::Future;
use courier_types::{
    BlockTarget, Bundle, BundleId, BundleStats, BundleStatus, ConfigError, EngineConfig,
    InclusionOutcome, SlotCalculator,
};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// The state of a delivery campaign.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CampaignState {
    /// Waiting to start an attempt.
    Idle,
    /// A target block was selected.
    Scheduled,
    /// The attempt's bundle passed simulation.
    Simulated,
    /// The bundle was fanned out.
    Submitted,
    /// The bundle landed. Terminal.
    Included,
    /// The bundle did not land in its window.
    Missed,
    /// No usable bundle was produced for the attempt.
    Rejected,
    /// The campaign gave up. Terminal.
    Expired,
}

impl CampaignState {
    /// True if no further transitions follow.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Included | Self::Expired)
    }
}

impl core::fmt::Display for CampaignState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Simulated => "simulated",
            Self::Submitted => "submitted",
            Self::Included => "included",
            Self::Missed => "missed",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// A recorded campaign state change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// One-based attempt the transition belongs to.
    pub attempt: u32,
    /// State before.
    pub from: CampaignState,
    /// State after.
    pub to: CampaignState,
    /// When it happened.
    pub at: DateTime<Utc>,
}

/// Why a campaign expired.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpiryReason {
    /// Every allowed attempt failed.
    RetriesExhausted,
    /// The operator deadline passed.
    Deadline,
}

/// How a campaign ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CampaignOutcome {
    /// A bundle landed on chain.
    Included {
        /// The block it landed in.
        block: u64,
        /// The bundle that landed.
        bundle_id: BundleId,
        /// The attempt that produced it.
        attempt: u32,
    },
    /// A bundle's transactions landed, but after the targeted blocks. The
    /// payload executed, so the campaign does not retry it.
    LandedOutsideWindow {
        /// The block it landed in.
        block: u64,
        /// The bundle that landed.
        bundle_id: BundleId,
        /// The attempt that produced it.
        attempt: u32,
    },
    /// The campaign gave up without inclusion.
    Expired {
        /// Why.
        reason: ExpiryReason,
    },
    /// The operator stopped the campaign.
    Cancelled {
        /// A bundle had already been sent and may still land.
        in_flight: bool,
    },
}

impl CampaignOutcome {
    /// The targeted block the bundle landed in, if it did.
    pub const fn included_block(&self) -> Option<u64> {
        match self {
            Self::Included { block, .. } => Some(*block),
            _ => None,
        }
    }

    /// The block the payload executed in, inside the targeted window or not.
    pub const fn landed_block(&self) -> Option<u64> {
        match self {
            Self::Included { block, .. } | Self::LandedOutsideWindow { block, .. } => Some(*block),
            _ => None,
        }
    }
}

/// The result of a finished campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignReport {
    /// How it ended.
    pub outcome: CampaignOutcome,
    /// Final stats of every bundle built, in attempt order.
    pub history: Vec<BundleStats>,
    /// Every state change, in order.
    pub transitions: Vec<Transition>,
}

impl CampaignReport {
    /// Number of bundles built during the campaign.
    pub fn bundles(&self) -> usize {
        self.history.len()
    }
}

/// Errors that end a campaign without an outcome.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CampaignError {
    /// The chain height could not be read, so no target can be chosen.
    #[error("cannot schedule attempt: {source}")]
    Schedule {
        /// The scheduling failure.
        #[source]
        source: ScheduleError,
        /// Final stats of every bundle built before the failure.
        history: Vec<BundleStats>,
        /// Every state change before the failure.
        transitions: Vec<Transition>,
    },
    /// The engine configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The campaign task panicked or was aborted.
    #[error("campaign task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Why a campaign stopped early.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Interrupt {
    Cancelled,
    Deadline,
}

/// How a single attempt ended.
#[derive(Debug)]
enum Step {
    Landed { block: u64, bundle_id: BundleId, in_window: bool },
    Failed,
    Interrupted { interrupt: Interrupt, in_flight: bool },
}

/// Mutable campaign bookkeeping.
#[derive(Debug)]
struct Campaign {
    state: CampaignState,
    attempt: u32,
    history: Vec<BundleStats>,
    transitions: Vec<Transition>,
    advice: Option<AttemptAdvice>,
}

impl Campaign {
    const fn new() -> Self {
        Self {
            state: CampaignState::Idle,
            attempt: 0,
            history: Vec::new(),
            transitions: Vec::new(),
            advice: None,
        }
    }

    fn transition(&mut self, to: CampaignState) {
        let transition =
            Transition { attempt: self.attempt, from: self.state, to, at: Utc::now() };
        debug!(attempt = self.attempt, from = %self.state, %to, "Campaign transition");
        self.transitions.push(transition);
        self.state = to;
    }

    fn finish(self, outcome: CampaignOutcome) -> CampaignReport {
        CampaignReport { outcome, history: self.history, transitions: self.transitions }
    }
}

/// Drives a bounded delivery campaign.
///
/// Each attempt schedules a target, builds a fresh bundle, simulates it,
/// checks for competition, fans it out and verifies inclusion. Failed
/// attempts are retried against a new target until `max_retries` is spent or
/// the deadline passes. Operator cancellation is honoured in every state.
#[derive(Debug)]
pub struct RetryCoordinator<C, R, S, B, K> {
    chain: C,
    relay: R,
    submitter: MultiChannelSubmitter<S>,
    source: B,
    sink: K,
    config: EngineConfig,
    slots: SlotCalculator,
}

impl<C, R, S, B, K> RetryCoordinator<C, R, S, B, K> {
    /// Create a new coordinator. The configuration is validated here, so a
    /// running campaign never sees an invalid one.
    pub fn new(
        chain: C,
        relay: R,
        submitter: MultiChannelSubmitter<S>,
        source: B,
        sink: K,
        config: EngineConfig,
        slots: SlotCalculator,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { chain, relay, submitter, source, sink, config, slots })
    }

    /// Get the engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the submitter.
    pub const fn submitter(&self) -> &MultiChannelSubmitter<S> {
        &self.submitter
    }

    /// Get the stats sink.
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    const fn max_attempts(&self) -> u32 {
        self.config.coordinator.max_retries.saturating_add(1)
    }
}

impl<C, R, S, B, K> RetryCoordinator<C, R, S, B, K>
where
    C: ChainReader + Sync,
    R: BundleSimulator + ConflictSource + BundleStatusSource + BundleCanceller + Sync,
    S: BundleSubmitter + Sync,
    B: BundleSource + Sync,
    K: StatsSink + Sync,
{
    /// Run the campaign to completion.
    #[instrument(skip_all, fields(max_attempts = self.max_attempts()))]
    pub async fn run(&self, cancel: CancellationToken) -> Result<CampaignReport, CampaignError> {
        let deadline = self.config.coordinator.deadline.map(|limit| Instant::now() + limit);
        let mut campaign = Campaign::new();

        loop {
            campaign.attempt += 1;
            let step = match self.attempt(&mut campaign, &cancel, deadline).await {
                Ok(step) => step,
                Err(source) => {
                    warn!(%source, "Campaign cannot continue");
                    return Err(CampaignError::Schedule {
                        source,
                        history: campaign.history,
                        transitions: campaign.transitions,
                    });
                }
            };

            let interrupt = match step {
                Step::Landed { block, bundle_id, in_window } => {
                    let attempt = campaign.attempt;
                    let outcome = if in_window {
                        info!(block, %bundle_id, attempt, "Bundle included");
                        CampaignOutcome::Included { block, bundle_id, attempt }
                    } else {
                        warn!(block, %bundle_id, attempt, "Bundle landed outside its window");
                        CampaignOutcome::LandedOutsideWindow { block, bundle_id, attempt }
                    };
                    return Ok(campaign.finish(outcome));
                }
                Step::Interrupted { interrupt, in_flight } => Some((interrupt, in_flight)),
                Step::Failed if campaign.attempt >= self.max_attempts() => {
                    warn!(attempts = campaign.attempt, "Retries exhausted");
                    campaign.transition(CampaignState::Expired);
                    let reason = ExpiryReason::RetriesExhausted;
                    return Ok(campaign.finish(CampaignOutcome::Expired { reason }));
                }
                Step::Failed => {
                    campaign.transition(CampaignState::Idle);
                    let backoff = tokio::time::sleep(self.config.coordinator.retry_backoff);
                    guarded(&cancel, deadline, backoff)
                        .await
                        .err()
                        .map(|interrupt| (interrupt, false))
                }
            };

            if let Some((interrupt, in_flight)) = interrupt {
                campaign.transition(CampaignState::Expired);
                let outcome = match interrupt {
                    Interrupt::Cancelled => {
                        info!(in_flight, "Campaign cancelled");
                        CampaignOutcome::Cancelled { in_flight }
                    }
                    Interrupt::Deadline => {
                        warn!("Campaign deadline passed");
                        CampaignOutcome::Expired { reason: ExpiryReason::Deadline }
                    }
                };
                return Ok(campaign.finish(outcome));
            }
        }
    }

    /// Run one attempt. Only a scheduling failure is an error.
    #[instrument(skip_all, fields(attempt = campaign.attempt))]
    async fn attempt(
        &self,
        campaign: &mut Campaign,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Step, ScheduleError> {
        let interrupted = |interrupt| Ok(Step::Interrupted { interrupt, in_flight: false });

        let scheduler = TargetScheduler::new(&self.chain, self.config.scheduler, self.slots);
        let target = match guarded(cancel, deadline, scheduler.next_target()).await {
            Ok(target) => target?,
            Err(interrupt) => return interrupted(interrupt),
        };
        campaign.transition(CampaignState::Scheduled);

        let base_fee = match guarded(cancel, deadline, self.base_fee()).await {
            Ok(base_fee) => base_fee,
            Err(interrupt) => return interrupted(interrupt),
        };

        let request = BuildRequest::new(campaign.attempt, target, base_fee)
            .with_previous(campaign.advice.take());
        let draft = match guarded(cancel, deadline, self.source.build_bundle(&request)).await {
            Ok(Ok(draft)) => draft,
            Ok(Err(e)) => {
                warn!(%e, "Bundle source failed");
                campaign.advice = Some(AttemptAdvice::without_bundle(e.to_string()));
                campaign.transition(CampaignState::Rejected);
                return Ok(Step::Failed);
            }
            Err(interrupt) => return interrupted(interrupt),
        };

        let mut bundle = Bundle::new(draft);
        let mut stats = BundleStats::new(&bundle, target.block_number(), campaign.attempt);
        self.persist(&stats);

        let step = self.deliver(campaign, &mut bundle, &mut stats, target, cancel, deadline).await;

        if let Step::Interrupted { interrupt, .. } = step {
            if !bundle.status().is_terminal() && bundle.advance(BundleStatus::Expired).is_ok() {
                stats.record_status(BundleStatus::Expired);
            }
            stats.note(match interrupt {
                Interrupt::Cancelled => "campaign cancelled",
                Interrupt::Deadline => "campaign deadline passed",
            });
            self.persist(&stats);
        }
        campaign.advice = Some(AttemptAdvice::from_stats(&stats));
        campaign.history.push(stats);
        Ok(step)
    }

    /// Simulate, assess, submit and verify a freshly built bundle.
    async fn deliver(
        &self,
        campaign: &mut Campaign,
        bundle: &mut Bundle,
        stats: &mut BundleStats,
        target: BlockTarget,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Step {
        let interrupted = |interrupt, in_flight| Step::Interrupted { interrupt, in_flight };

        let height = match guarded(cancel, deadline, self.current_height(&target)).await {
            Ok(height) => height,
            Err(interrupt) => return interrupted(interrupt, false),
        };
        let gate = SimulationGate::new(&self.relay, self.config.simulation);
        let simulated = gate.simulate(bundle, &target, height);
        let simulation = match guarded(cancel, deadline, simulated).await {
            Ok(Ok(result)) => {
                stats.record_simulation(result.clone());
                stats.record_status(bundle.status());
                self.persist(stats);
                if !result.success {
                    campaign.transition(CampaignState::Rejected);
                    return Step::Failed;
                }
                result
            }
            Ok(Err(e)) => {
                warn!(%e, "Simulation did not complete");
                // A bundle that could not be simulated is never reused.
                if bundle.advance(BundleStatus::Rejected).is_ok() {
                    stats.record_status(BundleStatus::Rejected);
                }
                stats.note(format!("simulation: {e}"));
                self.persist(stats);
                campaign.transition(CampaignState::Rejected);
                return Step::Failed;
            }
            Err(interrupt) => return interrupted(interrupt, false),
        };
        campaign.transition(CampaignState::Simulated);

        let base_fee = match guarded(cancel, deadline, self.base_fee()).await {
            Ok(base_fee) => base_fee,
            Err(interrupt) => return interrupted(interrupt, false),
        };
        let monitor = CompetitionMonitor::new(&self.relay, self.config.competition);
        let assessed = monitor.assess(bundle, &target, &simulation, base_fee);
        let report = match guarded(cancel, deadline, assessed).await {
            Ok(report) => report,
            Err(interrupt) => return interrupted(interrupt, false),
        };
        stats.record_competition(
            report.competitor,
            report.effective_priority_fee,
            report.likely_outbid,
        );
        self.persist(stats);

        let channels = self.submitter.channels(&target);
        let submitted = self.submitter.submit(bundle, &target, &channels);
        let submission = match guarded(cancel, deadline, submitted).await {
            Ok(Ok(submission)) => submission,
            Ok(Err(e)) => {
                warn!(%e, "Submission refused");
                stats.note(format!("submission: {e}"));
                if bundle.advance(BundleStatus::Expired).is_ok() {
                    stats.record_status(BundleStatus::Expired);
                }
                self.persist(stats);
                campaign.transition(CampaignState::Missed);
                return Step::Failed;
            }
            // Channels may already have accepted the bundle.
            Err(interrupt) => return interrupted(interrupt, true),
        };
        for attempt in submission.attempts.iter().cloned() {
            stats.record_attempt(attempt);
        }
        if submission.degraded {
            stats.mark_degraded();
        }
        stats.record_status(bundle.status());
        self.persist(stats);
        campaign.transition(CampaignState::Submitted);

        if submission.acked() == 0 {
            warn!("No channel acknowledged the bundle");
        }

        let verifier = InclusionVerifier::new(&self.chain, &self.relay, self.config.verifier);
        let last_block = target.last_block(self.config.submission.block_window);
        let verified = verifier.verify(bundle, &target, last_block, submission.bundle_hash());
        let outcome = match guarded(cancel, deadline, verified).await {
            Ok(Ok(verification)) => {
                if let Some(status) = verification.relay_status {
                    stats.record_relay_status(status);
                }
                if verification.disagreement {
                    stats.note("relay status disagrees with chain");
                }
                verification.outcome
            }
            Ok(Err(e)) => {
                warn!(%e, "Verification failed, inclusion is unknown");
                stats.note(format!("verification: {e}"));
                InclusionOutcome::Unverified
            }
            Err(interrupt) => return interrupted(interrupt, true),
        };

        stats.record_outcome(outcome);
        match outcome {
            InclusionOutcome::Included { block }
            | InclusionOutcome::LandedOutsideWindow { block } => {
                if let Err(e) = bundle.advance(BundleStatus::Included) {
                    warn!(%e, "Could not mark bundle included");
                }
                let in_window = outcome.is_included();
                if !in_window {
                    stats.note(format!("landed in block {block}, after the targeted blocks"));
                }
                stats.record_status(bundle.status());
                self.persist(stats);
                campaign.transition(CampaignState::Included);
                Step::Landed { block, bundle_id: bundle.id(), in_window }
            }
            InclusionOutcome::Missed => {
                if let Err(e) = bundle.advance(BundleStatus::Missed) {
                    warn!(%e, "Could not mark bundle missed");
                }
                stats.record_status(bundle.status());
                self.cancel_at_relay(bundle.id()).await;
                self.persist(stats);
                campaign.transition(CampaignState::Missed);
                Step::Failed
            }
            // Nothing is known, so the bundle is withdrawn rather than marked
            // missed, and the campaign moves on as it would after a miss.
            InclusionOutcome::Unverified => {
                if let Err(e) = bundle.advance(BundleStatus::Expired) {
                    warn!(%e, "Could not expire unverified bundle");
                }
                stats.record_status(bundle.status());
                self.cancel_at_relay(bundle.id()).await;
                self.persist(stats);
                campaign.transition(CampaignState::Missed);
                Step::Failed
            }
        }
    }

    /// The current chain height, or the height seen at scheduling if it
    /// cannot be read.
    async fn current_height(&self, target: &BlockTarget) -> u64 {
        let timeout = self.config.scheduler.chain_timeout;
        let observed = target.observed_height();
        match tokio::time::timeout(timeout, self.chain.block_number()).await {
            Ok(Ok(height)) => height.max(observed),
            Ok(Err(e)) => {
                warn!(%e, "Failed to read chain height, using the scheduled view");
                observed
            }
            Err(_) => {
                warn!("Chain height read timed out, using the scheduled view");
                observed
            }
        }
    }

    /// The latest base fee, or zero if it cannot be read.
    async fn base_fee(&self) -> u128 {
        let timeout = self.config.scheduler.chain_timeout;
        match tokio::time::timeout(timeout, self.chain.base_fee()).await {
            Ok(Ok(base_fee)) => base_fee,
            Ok(Err(e)) => {
                warn!(%e, "Failed to read base fee");
                0
            }
            Err(_) => {
                warn!("Base fee read timed out");
                0
            }
        }
    }

    /// Best-effort withdrawal of a missed bundle from the relay.
    async fn cancel_at_relay(&self, id: BundleId) {
        let timeout = self.config.verifier.relay_timeout;
        match tokio::time::timeout(timeout, self.relay.cancel_bundle(id)).await {
            Ok(Ok(())) => debug!(bundle_id = %id, "Cancelled bundle at relay"),
            Ok(Err(e)) => warn!(%e, bundle_id = %id, "Failed to cancel bundle at relay"),
            Err(_) => warn!(bundle_id = %id, "Bundle cancellation timed out"),
        }
    }

    fn persist(&self, stats: &BundleStats) {
        if let Err(e) = self.sink.record(stats) {
            warn!(%e, bundle_id = %stats.bundle_id, "Failed to persist bundle stats");
        }
    }
}

/// Race `fut` against operator cancellation and the campaign deadline.
/// Cancellation wins ties.
async fn guarded<F: Future>(
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    fut: F,
) -> Result<F::Output, Interrupt> {
    let expiry = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => core::future::pending().await,
        }
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = expiry => Err(Interrupt::Deadline),
        output = fut => Ok(output),
    }
}
