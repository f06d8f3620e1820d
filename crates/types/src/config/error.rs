/// Error type for [`crate::config`] module. Captures engine configuration
/// values that can never produce a working campaign.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The target divisor must be at least 1.
    #[error("target divisor must be at least 1")]
    ZeroDivisor,
    /// A timeout or budget was zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    /// The submitter must allow at least one concurrent channel call.
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
    /// Each bundle must target at least one block.
    #[error("block window must be at least 1")]
    ZeroBlockWindow,
}
