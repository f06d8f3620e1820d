use crate::BuildRequest;
use alloy::primitives::{Bytes, TxHash, B256};
use core::future::Future;
use courier_types::{
    Bundle, BundleAck, BundleDraft, BundleId, BundleStats, CompetingBundle, RelayBundleStatus,
    SimulationResult,
};

/// Read access to the chain the bundles target.
///
/// This is the authoritative source of truth for inclusion.
pub trait ChainReader {
    /// The error type returned by chain reads.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Get the current chain height.
    fn block_number(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Get the base fee of the latest block, in wei.
    fn base_fee(&self) -> impl Future<Output = Result<u128, Self::Error>> + Send;

    /// Get the hashes of the transactions in block `number`, or `None` if the
    /// block is not available.
    fn block_transactions(
        &self,
        number: u64,
    ) -> impl Future<Output = Result<Option<Vec<TxHash>>, Self::Error>> + Send;
}

/// A trait for dry-running bundles against chain state.
pub trait BundleSimulator {
    /// The error type returned by simulation.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Simulate `txs` as if included in `block_number`, on top of the state
    /// after `state_block`, or the latest state if `None`.
    ///
    /// A bundle that executes but reverts is an `Ok` result with
    /// `success == false`.
    fn simulate_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
        state_block: Option<u64>,
    ) -> impl Future<Output = Result<SimulationResult, Self::Error>> + Send;
}

/// A trait for looking up bundles that conflict with ours.
pub trait ConflictSource {
    /// The error type returned by lookups.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Find a bundle conflicting with `txs` at `block_number`.
    fn conflicting_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
    ) -> impl Future<Output = Result<Option<CompetingBundle>, Self::Error>> + Send;
}

/// A trait for reading the relay's self-reported bundle status.
pub trait BundleStatusSource {
    /// The error type returned by lookups.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Get the relay's report on a bundle submitted for `block_number`.
    fn bundle_status(
        &self,
        bundle_hash: B256,
        block_number: u64,
    ) -> impl Future<Output = Result<RelayBundleStatus, Self::Error>> + Send;
}

/// A trait for cancelling submitted bundles.
pub trait BundleCanceller {
    /// The error type returned by cancellation.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Cancel every submission tagged with the bundle id.
    fn cancel_bundle(&self, id: BundleId) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A trait for submitting bundles to a builder endpoint.
///
/// Each implementor is one delivery endpoint. Combined with a block number
/// it forms a channel of the [`MultiChannelSubmitter`].
///
/// [`MultiChannelSubmitter`]: crate::MultiChannelSubmitter
pub trait BundleSubmitter {
    /// The error type returned by submission operations.
    type Error: core::error::Error + Send + Sync + 'static;

    /// The name of the endpoint.
    fn endpoint(&self) -> &str;

    /// Submit a bundle for inclusion in `block_number`.
    fn submit_bundle(
        &self,
        bundle: &Bundle,
        block_number: u64,
    ) -> impl Future<Output = Result<BundleAck, Self::Error>> + Send;
}

/// A trait for producing signed bundle payloads.
///
/// The engine treats the payload as opaque. Implementors own keys, nonces,
/// and fee construction.
pub trait BundleSource {
    /// The error type returned when no bundle can be built.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Build a fresh bundle for the given attempt.
    fn build_bundle(
        &self,
        request: &BuildRequest,
    ) -> impl Future<Output = Result<BundleDraft, Self::Error>> + Send;
}

/// A trait for persisting [`BundleStats`] snapshots.
///
/// Sinks are append-only: every call carries a full snapshot, and readers
/// keep the last snapshot per bundle id and target block.
pub trait StatsSink {
    /// The error type returned by the sink.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Persist a snapshot.
    fn record(&self, stats: &BundleStats) -> Result<(), Self::Error>;
}
