mod error;
pub use error::ConfigError;

use courier_constants::{DEFAULT_CONFIRMATION_MARGIN, DEFAULT_DIVISOR};
use std::time::Duration;

/// Target selection parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Qualifying blocks are multiples of this divisor.
    pub divisor: u64,
    /// Minimum number of blocks between the current height and the target.
    pub fast_offset: u64,
    /// Ignore the divisor and target `height + fast_offset`. For rehearsals.
    pub fast: bool,
    /// Bound on reading the chain height.
    pub chain_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            divisor: DEFAULT_DIVISOR,
            fast_offset: 1,
            fast: false,
            chain_timeout: Duration::from_secs(5),
        }
    }
}

/// Simulation gate parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Bound on the relay simulation call.
    pub timeout: Duration,
    /// Bundles using more gas than this are rejected regardless of what
    /// they declare.
    pub gas_ceiling: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(3), gas_ceiling: 30_000_000 }
    }
}

/// Competition monitor parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompetitionConfig {
    /// Bound on the conflict lookup. Lookups that take longer are treated as
    /// finding nothing.
    pub timeout: Duration,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(1) }
    }
}

/// Multi-channel submitter parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SubmissionConfig {
    /// Hard wall-clock budget for the whole fan-out.
    pub latency_budget: Duration,
    /// Number of consecutive blocks, starting at the target, each bundle is
    /// submitted for.
    pub block_window: u64,
    /// Maximum number of channel calls in flight at once.
    pub concurrency_limit: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self { latency_budget: Duration::from_millis(500), block_window: 1, concurrency_limit: 8 }
    }
}

/// Inclusion verifier parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Blocks awaited past the last targeted block before its contents are
    /// read.
    pub confirmation_margin: u64,
    /// Interval between chain height polls.
    pub poll_interval: Duration,
    /// Expected time between blocks.
    pub block_time: Duration,
    /// Extra blocks of waiting tolerated before verification gives up.
    pub slack_blocks: u64,
    /// Bound on the relay status lookup.
    pub relay_timeout: Duration,
}

impl VerifierConfig {
    /// Maximum time to wait for the chain to advance by `blocks` blocks.
    pub fn wait_limit(&self, blocks: u64) -> Duration {
        let blocks = blocks.saturating_add(self.slack_blocks);
        self.block_time.saturating_mul(u32::try_from(blocks).unwrap_or(u32::MAX))
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            confirmation_margin: DEFAULT_CONFIRMATION_MARGIN,
            poll_interval: Duration::from_secs(1),
            block_time: Duration::from_secs(12),
            slack_blocks: 2,
            relay_timeout: Duration::from_secs(2),
        }
    }
}

/// Retry coordinator parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Number of attempts after the first. A campaign builds at most
    /// `max_retries + 1` bundles.
    pub max_retries: u32,
    /// Optional overall deadline for the campaign.
    pub deadline: Option<Duration>,
    /// Pause between a failed attempt and the next one.
    pub retry_backoff: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { max_retries: 2, deadline: None, retry_backoff: Duration::from_secs(1) }
    }
}

/// Configuration for a whole delivery campaign.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Target selection.
    pub scheduler: SchedulerConfig,
    /// Simulation gate.
    pub simulation: SimulationConfig,
    /// Competition monitor.
    pub competition: CompetitionConfig,
    /// Multi-channel submitter.
    pub submission: SubmissionConfig,
    /// Inclusion verifier.
    pub verifier: VerifierConfig,
    /// Retry coordinator.
    pub coordinator: CoordinatorConfig,
}

impl EngineConfig {
    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.divisor == 0 {
            return Err(ConfigError::ZeroDivisor);
        }
        if self.submission.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.submission.block_window == 0 {
            return Err(ConfigError::ZeroBlockWindow);
        }

        let durations = [
            ("chain timeout", self.scheduler.chain_timeout),
            ("simulation timeout", self.simulation.timeout),
            ("competition timeout", self.competition.timeout),
            ("latency budget", self.submission.latency_budget),
            ("poll interval", self.verifier.poll_interval),
            ("block time", self.verifier.block_time),
            ("relay timeout", self.verifier.relay_timeout),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(ConfigError::ZeroDuration(name));
        }
        if self.coordinator.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDuration("deadline"));
        }
        Ok(())
    }
}
