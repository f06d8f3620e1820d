use crate::ChainReader;
use courier_types::{config::SchedulerConfig, BlockTarget, SlotCalculator};
use std::time::Duration;
use tracing::{debug, instrument};

/// Errors returned by [`TargetScheduler`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ScheduleError {
    /// The chain height could not be read in time.
    #[error("chain height unavailable: {0}")]
    ChainUnavailable(#[source] Box<dyn core::error::Error + Send + Sync>),
}

/// Select the target for a chain at `height`.
///
/// Outside fast mode this is the smallest multiple of the divisor strictly
/// greater than `height + fast_offset`. In fast mode it is
/// `height + fast_offset`, but never the current block. A zero divisor is
/// treated as one.
pub fn schedule_from(height: u64, config: &SchedulerConfig) -> BlockTarget {
    let divisor = config.divisor.max(1);
    let block_number = if config.fast {
        height.saturating_add(config.fast_offset.max(1))
    } else {
        let floor = height.saturating_add(config.fast_offset);
        (floor / divisor).saturating_add(1).saturating_mul(divisor)
    };
    BlockTarget::new(block_number, divisor, block_number.saturating_sub(height))
}

/// Picks the next block a bundle should target.
#[derive(Debug, Clone)]
pub struct TargetScheduler<C> {
    chain: C,
    config: SchedulerConfig,
    slots: SlotCalculator,
}

impl<C> TargetScheduler<C> {
    /// Create a new scheduler.
    pub const fn new(chain: C, config: SchedulerConfig, slots: SlotCalculator) -> Self {
        Self { chain, config, slots }
    }

    /// Get a reference to the chain reader.
    pub const fn chain(&self) -> &C {
        &self.chain
    }

    /// Get the scheduler configuration.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Wall-clock time left before the target block, assuming one block per
    /// slot.
    pub const fn lead_time(&self, target: &BlockTarget) -> Duration {
        self.slots.lead_time(target.lead_blocks())
    }
}

impl<C> TargetScheduler<C>
where
    C: ChainReader + Sync,
{
    /// Read the chain height and select the next target.
    #[instrument(skip_all, fields(divisor = self.config.divisor, fast = self.config.fast))]
    pub async fn next_target(&self) -> Result<BlockTarget, ScheduleError> {
        let height = tokio::time::timeout(self.config.chain_timeout, self.chain.block_number())
            .await
            .map_err(|elapsed| ScheduleError::ChainUnavailable(Box::new(elapsed)))?
            .map_err(|error| ScheduleError::ChainUnavailable(Box::new(error)))?;

        let target = schedule_from(height, &self.config);
        debug!(
            height,
            target = target.block_number(),
            lead_secs = self.lead_time(&target).as_secs(),
            "Selected target block"
        );
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(divisor: u64, fast_offset: u64, fast: bool) -> SchedulerConfig {
        SchedulerConfig { divisor, fast_offset, fast, ..Default::default() }
    }

    #[test]
    fn next_multiple_of_divisor() {
        let target = schedule_from(19_999_950, &SchedulerConfig::default());
        assert_eq!(target.block_number(), 20_000_000);
        assert_eq!(target.lead_blocks(), 50);
        assert!(target.qualifies());
    }

    #[test]
    fn offset_pushes_past_boundary() {
        // 19_999_999 + 1 is a multiple, but the target must be strictly
        // greater than height + offset.
        let target = schedule_from(19_999_999, &SchedulerConfig::default());
        assert_eq!(target.block_number(), 20_000_100);
    }

    #[test]
    fn fast_mode_ignores_divisor() {
        let target = schedule_from(1_234, &config(100, 2, true));
        assert_eq!(target.block_number(), 1_236);
        assert!(!target.qualifies());

        let target = schedule_from(1_234, &config(100, 0, true));
        assert_eq!(target.block_number(), 1_235);
    }

    #[test]
    fn lead_time_uses_slot_duration() {
        let scheduler =
            TargetScheduler::new((), SchedulerConfig::default(), SlotCalculator::new(12));
        let target = schedule_from(95, &SchedulerConfig::default());
        assert_eq!(scheduler.lead_time(&target), Duration::from_secs(60));
    }

    proptest! {
        #[test]
        fn target_is_always_in_the_future(
            height in 0u64..u64::MAX / 4,
            divisor in 1u64..100_000,
            fast_offset in 0u64..64,
            fast in any::<bool>(),
        ) {
            let target = schedule_from(height, &config(divisor, fast_offset, fast));
            prop_assert!(target.block_number() > height);
            prop_assert_eq!(target.observed_height(), height);
            if !fast {
                prop_assert!(target.qualifies());
                prop_assert!(target.block_number() > height + fast_offset);
                prop_assert!(target.block_number() - divisor <= height + fast_offset);
            }
        }
    }
}
