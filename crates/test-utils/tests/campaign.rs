//! End-to-end campaign tests driving the [`RetryCoordinator`] against mocks
//! in paused tokio time.

use alloy::primitives::U256;
use courier_engine::{
    CampaignError, CampaignOutcome, CampaignReport, CampaignState, ExpiryReason,
    MultiChannelSubmitter, RetryCoordinator, ScheduleError,
};
use courier_test_utils::{
    chain::MockChain,
    init_tracing,
    payloads::test_draft,
    relay::{MockRelay, MockSubmitter},
    source::MockBundleSource,
    test_slots, MemoryStatsSink, MockError,
};
use courier_types::{
    Bundle, BundleStatus, CompetingBundle, ConflictKind, EngineConfig, InclusionOutcome,
    SimulationResult,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use CampaignState::*;

const BLOCK_TIME: Duration = Duration::from_secs(12);

type Coordinator =
    RetryCoordinator<MockChain, MockRelay, MockSubmitter, MockBundleSource, MemoryStatsSink>;

struct Harness {
    chain: MockChain,
    relay: MockRelay,
    endpoint: MockSubmitter,
    source: MockBundleSource,
    sink: MemoryStatsSink,
    config: EngineConfig,
}

impl Harness {
    /// A chain at 95 mining every 12s, a relay that passes everything, and
    /// one endpoint that lands bundles from the `land_from`-th one on.
    fn new(land_from: usize) -> Self {
        init_tracing();
        let chain = MockChain::mining(95, BLOCK_TIME);
        let endpoint = MockSubmitter::new("builder").landing_on(chain.clone(), land_from);
        let mut config = EngineConfig::default();
        config.scheduler.divisor = 10;
        Self {
            chain,
            relay: MockRelay::new(),
            endpoint,
            source: MockBundleSource::new(),
            sink: MemoryStatsSink::new(),
            config,
        }
    }

    fn coordinator(&self) -> Coordinator {
        let submitter =
            MultiChannelSubmitter::new(vec![self.endpoint.clone()], self.config.submission);
        RetryCoordinator::new(
            self.chain.clone(),
            self.relay.clone(),
            submitter,
            self.source.clone(),
            self.sink.clone(),
            self.config,
            test_slots(),
        )
        .unwrap()
    }

    async fn run(&self) -> Result<CampaignReport, CampaignError> {
        self.coordinator().run(CancellationToken::new()).await
    }
}

fn path(report: &CampaignReport) -> Vec<(u32, CampaignState, CampaignState)> {
    report.transitions.iter().map(|t| (t.attempt, t.from, t.to)).collect()
}

fn expirations(report: &CampaignReport) -> usize {
    report.transitions.iter().filter(|t| t.to == Expired).count()
}

#[tokio::test(start_paused = true)]
async fn lands_on_first_attempt() {
    let harness = Harness::new(0);
    let report = harness.run().await.unwrap();

    let CampaignOutcome::Included { block, bundle_id, attempt } = report.outcome else {
        panic!("expected inclusion, got {:?}", report.outcome);
    };
    assert_eq!(block, 100);
    assert_eq!(attempt, 1);
    assert_eq!(
        path(&report),
        vec![
            (1, Idle, Scheduled),
            (1, Scheduled, Simulated),
            (1, Simulated, Submitted),
            (1, Submitted, Included),
        ]
    );

    let stats = &report.history[0];
    assert_eq!(stats.bundle_id, bundle_id);
    assert_eq!(stats.status, BundleStatus::Included);
    assert_eq!(stats.outcome, Some(InclusionOutcome::Included { block: 100 }));
    assert_eq!(stats.included_block, Some(100));
    assert!(stats.is_simulated);
    assert!(stats.is_sent);
    assert!(harness.relay.cancelled().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missed_block_reschedules_one_divisor_later() {
    let harness = Harness::new(1);
    let report = harness.run().await.unwrap();

    assert_eq!(report.outcome.included_block(), Some(110));
    assert_eq!(report.bundles(), 2);

    let (first, second) = (&report.history[0], &report.history[1]);
    assert_eq!(first.target_block, 100);
    assert_eq!(first.status, BundleStatus::Missed);
    assert_eq!(first.outcome, Some(InclusionOutcome::Missed));
    assert_eq!(second.target_block, 100 + harness.config.scheduler.divisor);
    assert_ne!(first.bundle_id, second.bundle_id);

    // the missed bundle is withdrawn from the relay
    assert_eq!(harness.relay.cancelled(), vec![first.bundle_id]);

    assert_eq!(
        path(&report),
        vec![
            (1, Idle, Scheduled),
            (1, Scheduled, Simulated),
            (1, Simulated, Submitted),
            (1, Submitted, Missed),
            (1, Missed, Idle),
            (2, Idle, Scheduled),
            (2, Scheduled, Simulated),
            (2, Simulated, Submitted),
            (2, Submitted, Included),
        ]
    );

    // the second build hears about the miss
    let requests = harness.source.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].previous, None);
    assert_eq!(requests[1].previous.as_ref().map(|p| p.status), Some(BundleStatus::Missed));
}

#[tokio::test(start_paused = true)]
async fn simulation_rejection_never_submits() {
    let harness = Harness::new(0);
    // more gas than the draft declares
    harness.relay.push_simulation(Ok(SimulationResult::succeeded(200_000, U256::ZERO)));

    let report = harness.run().await.unwrap();
    // the retry still makes the first target
    assert_eq!(report.outcome.included_block(), Some(100));

    let rejected = &report.history[0];
    assert_eq!(rejected.status, BundleStatus::Rejected);
    assert!(rejected.attempts.is_empty());
    assert!(!rejected.simulation.as_ref().unwrap().success);
    assert!(harness.endpoint.submissions().iter().all(|s| s.bundle_id != rejected.bundle_id));
    assert!(path(&report).contains(&(1, Scheduled, Rejected)));
    assert!(path(&report).contains(&(1, Rejected, Idle)));
}

#[tokio::test(start_paused = true)]
async fn retries_are_bounded() {
    let harness = Harness::new(0);
    harness.relay.set_default_simulation(SimulationResult::failed(30_000, U256::ZERO, "reverted"));

    let report = harness.run().await.unwrap();
    assert_eq!(report.outcome, CampaignOutcome::Expired { reason: ExpiryReason::RetriesExhausted });

    let max_attempts = harness.config.coordinator.max_retries as usize + 1;
    assert_eq!(report.bundles(), max_attempts);
    assert_eq!(harness.relay.simulations().len(), max_attempts);
    assert!(report.history.iter().all(|stats| stats.status == BundleStatus::Rejected));
    assert!(harness.endpoint.submissions().is_empty());

    assert_eq!(expirations(&report), 1);
    let last = report.transitions.last().unwrap();
    assert_eq!((last.attempt, last.from, last.to), (max_attempts as u32, Rejected, Expired));
}

#[tokio::test(start_paused = true)]
async fn bundle_source_failure_is_recoverable() {
    let harness = Harness::new(0);
    let harness = Harness { source: MockBundleSource::new().failing_on([1]), ..harness };

    let report = harness.run().await.unwrap();
    assert!(matches!(report.outcome, CampaignOutcome::Included { attempt: 2, .. }));
    // no bundle was built for the first attempt
    assert_eq!(report.bundles(), 1);

    let requests = harness.source.requests();
    let advice = requests[1].previous.as_ref().unwrap();
    assert_eq!(advice.status, BundleStatus::Rejected);
    assert!(advice.reason.as_deref().unwrap().contains("no payload"));
}

#[tokio::test(start_paused = true)]
async fn competitor_is_recorded_and_submission_proceeds() {
    let harness = Harness::new(0);
    let competitor =
        CompetingBundle::new(ConflictKind::GasPriceConflict, U256::from(20_000_000_000u64));
    harness.relay.set_conflict(Ok(Some(competitor)));

    let report = harness.run().await.unwrap();
    assert_eq!(report.outcome.included_block(), Some(100));

    let stats = &report.history[0];
    assert_eq!(stats.competitor, Some(competitor));
    // 1 gwei per gas to the builder on top of a 10 gwei base fee
    assert_eq!(stats.effective_priority_fee, Some(U256::from(11_000_000_000u64)));
    assert!(stats.likely_outbid);
    assert_eq!(stats.attempts.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn competition_lookup_failure_is_tolerated() {
    let harness = Harness::new(0);
    harness.relay.set_conflict(Err(MockError::new("relay down")));
    harness.relay.set_status(None);

    let report = harness.run().await.unwrap();
    assert_eq!(report.outcome.included_block(), Some(100));
    assert_eq!(report.history[0].competitor, None);
    assert_eq!(report.history[0].relay_status, None);
}

#[tokio::test(start_paused = true)]
async fn every_submitted_bundle_passed_simulation() {
    let harness = Harness::new(1);
    harness.relay.push_simulation(Ok(SimulationResult::failed(1, U256::ZERO, "reverted")));

    let report = harness.run().await.unwrap();
    assert_eq!(report.outcome.included_block(), Some(110));
    assert_eq!(report.bundles(), 3);

    for submission in harness.endpoint.submissions() {
        let stats = report.history.iter().find(|s| s.bundle_id == submission.bundle_id).unwrap();
        assert!(stats.simulation.as_ref().is_some_and(|sim| sim.success));
        assert!(stats.simulated_at.is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_chain_leaves_attempt_unverified() {
    let mut harness = Harness::new(0);
    // the target block is never mined
    harness.chain = MockChain::new(95);
    harness.endpoint = MockSubmitter::new("builder");
    harness.config.coordinator.max_retries = 0;

    let report = harness.run().await.unwrap();
    assert_eq!(report.outcome, CampaignOutcome::Expired { reason: ExpiryReason::RetriesExhausted });

    let stats = &report.history[0];
    assert_eq!(stats.outcome, Some(InclusionOutcome::Unverified));
    assert_eq!(stats.status, BundleStatus::Expired);
    assert_eq!(stats.included_block, None);
    assert!(stats.is_sent);
    assert!(stats.notes.iter().any(|note| note.starts_with("verification:")));

    // withdrawn so a retry cannot land next to it
    assert_eq!(harness.relay.cancelled(), vec![stats.bundle_id]);
    assert_eq!(path(&report)[3..], [(1, Submitted, Missed), (1, Missed, Expired)]);
    assert_eq!(harness.source.requests()[0].previous, None);
}

#[tokio::test(start_paused = true)]
async fn landing_after_window_is_not_retried() {
    let harness = Harness { endpoint: MockSubmitter::new("builder"), ..Harness::new(0) };
    // the payload shows up one block late, in the confirmation block
    let late = Bundle::new(test_draft(1));
    harness.chain.include(101, late.tx_hashes());

    let report = harness.run().await.unwrap();
    let CampaignOutcome::LandedOutsideWindow { block, bundle_id, attempt } = report.outcome else {
        panic!("expected a late landing, got {:?}", report.outcome);
    };
    assert_eq!((block, attempt), (101, 1));
    assert_eq!(report.outcome.included_block(), None);
    assert_eq!(report.outcome.landed_block(), Some(101));

    assert_eq!(report.bundles(), 1);
    assert_eq!(harness.source.requests().len(), 1);
    assert!(harness.relay.cancelled().is_empty());

    let stats = &report.history[0];
    assert_eq!(stats.bundle_id, bundle_id);
    assert_eq!(stats.status, BundleStatus::Included);
    assert_eq!(stats.outcome, Some(InclusionOutcome::LandedOutsideWindow { block: 101 }));
    assert_eq!(stats.included_block, Some(101));
    assert_eq!(path(&report).last(), Some(&(1, Submitted, Included)));
}

#[tokio::test(start_paused = true)]
async fn target_passed_while_building_is_rejected() {
    let harness = Harness::new(0);
    // building takes longer than the five blocks of lead
    let source = MockBundleSource::new().with_delay(Duration::from_secs(70));
    let harness = Harness { source, ..harness };

    let report = harness.run().await.unwrap();
    assert!(matches!(report.outcome, CampaignOutcome::Included { block: 110, attempt: 2, .. }));

    let stale = &report.history[0];
    assert_eq!(stale.target_block, 100);
    assert_eq!(stale.status, BundleStatus::Rejected);
    assert!(stale.notes.iter().any(|note| note.contains("not ahead of chain height")));
    assert!(stale.simulation.is_none());

    // only the second bundle reached the relay and the builder
    assert_eq!(harness.relay.simulations().len(), 1);
    assert!(harness.endpoint.submissions().iter().all(|s| s.bundle_id != stale.bundle_id));
    assert!(path(&report).contains(&(1, Scheduled, Rejected)));
}

#[tokio::test(start_paused = true)]
async fn audit_log_ends_with_history() {
    let harness = Harness::new(1);
    let report = harness.run().await.unwrap();

    let latest = harness.sink.latest();
    assert_eq!(latest, report.history);
    assert!(harness.sink.snapshots().len() > latest.len());
}

#[tokio::test(start_paused = true)]
async fn unreadable_chain_is_fatal_with_history() {
    let harness = Harness::new(0);
    harness.relay.set_default_simulation(SimulationResult::failed(1, U256::ZERO, "reverted"));
    harness.relay.set_simulation_delay(Duration::from_secs(2));

    let handle = harness.coordinator().spawn();
    // the first attempt is simulating, its successor cannot be scheduled
    tokio::time::sleep(Duration::from_secs(1)).await;
    harness.chain.set_failing(true);

    let Err(CampaignError::Schedule { source, history, transitions }) = handle.wait().await else {
        panic!("expected a scheduling failure");
    };
    assert!(matches!(source, ScheduleError::ChainUnavailable(_)));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, BundleStatus::Rejected);
    assert_eq!(transitions.last().map(|t| (t.from, t.to)), Some((Rejected, Idle)));
}

#[tokio::test(start_paused = true)]
async fn stop_before_submission() {
    let harness = Harness::new(0);
    harness.relay.set_simulation_delay(Duration::from_secs(2));

    let handle = harness.coordinator().spawn();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!handle.is_finished());
    handle.stop();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.outcome, CampaignOutcome::Cancelled { in_flight: false });
    assert!(harness.endpoint.submissions().is_empty());
    assert_eq!(report.history[0].status, BundleStatus::Expired);
    assert_eq!(expirations(&report), 1);
    assert_eq!(path(&report).last(), Some(&(1, Scheduled, Expired)));
}

#[tokio::test(start_paused = true)]
async fn stop_after_submission_is_in_flight() {
    let mut harness = Harness::new(0);
    // a stalled chain keeps the verifier waiting
    harness.chain = MockChain::new(95);

    let handle = harness.coordinator().spawn();
    tokio::time::sleep(Duration::from_secs(10)).await;
    handle.stop();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.outcome, CampaignOutcome::Cancelled { in_flight: true });
    assert_eq!(harness.endpoint.submissions().len(), 1);
    assert_eq!(report.history[0].status, BundleStatus::Expired);
    assert!(report.history[0].is_sent);
    assert_eq!(path(&report).last(), Some(&(1, Submitted, Expired)));
}

#[tokio::test(start_paused = true)]
async fn deadline_expires_campaign() {
    let mut harness = Harness::new(0);
    harness.chain = MockChain::new(95);
    harness.config.coordinator.deadline = Some(Duration::from_secs(30));

    let started = tokio::time::Instant::now();
    let report = harness.run().await.unwrap();
    assert_eq!(report.outcome, CampaignOutcome::Expired { reason: ExpiryReason::Deadline });
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert_eq!(expirations(&report), 1);
}

#[tokio::test]
async fn invalid_config_is_refused() {
    let harness = Harness::new(0);
    let mut config = harness.config;
    config.submission.block_window = 0;

    let submitter = MultiChannelSubmitter::new(vec![harness.endpoint.clone()], config.submission);
    let coordinator = RetryCoordinator::new(
        harness.chain.clone(),
        harness.relay.clone(),
        submitter,
        harness.source.clone(),
        harness.sink.clone(),
        config,
        test_slots(),
    );
    assert!(coordinator.is_err());
}
