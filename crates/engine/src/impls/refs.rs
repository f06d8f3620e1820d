use crate::{BundleCanceller, BundleStatusSource, BundleSimulator, ChainReader, ConflictSource};
use alloy::primitives::{Bytes, TxHash, B256};
use courier_types::{BundleId, CompetingBundle, RelayBundleStatus, SimulationResult};

impl<T: ChainReader + Sync> ChainReader for &T {
    type Error = T::Error;

    async fn block_number(&self) -> Result<u64, Self::Error> {
        (**self).block_number().await
    }

    async fn base_fee(&self) -> Result<u128, Self::Error> {
        (**self).base_fee().await
    }

    async fn block_transactions(&self, number: u64) -> Result<Option<Vec<TxHash>>, Self::Error> {
        (**self).block_transactions(number).await
    }
}

impl<T: BundleSimulator + Sync> BundleSimulator for &T {
    type Error = T::Error;

    async fn simulate_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
        state_block: Option<u64>,
    ) -> Result<SimulationResult, Self::Error> {
        (**self).simulate_bundle(txs, block_number, state_block).await
    }
}

impl<T: ConflictSource + Sync> ConflictSource for &T {
    type Error = T::Error;

    async fn conflicting_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
    ) -> Result<Option<CompetingBundle>, Self::Error> {
        (**self).conflicting_bundle(txs, block_number).await
    }
}

impl<T: BundleStatusSource + Sync> BundleStatusSource for &T {
    type Error = T::Error;

    async fn bundle_status(
        &self,
        bundle_hash: B256,
        block_number: u64,
    ) -> Result<RelayBundleStatus, Self::Error> {
        (**self).bundle_status(bundle_hash, block_number).await
    }
}

impl<T: BundleCanceller + Sync> BundleCanceller for &T {
    type Error = T::Error;

    async fn cancel_bundle(&self, id: BundleId) -> Result<(), Self::Error> {
        (**self).cancel_bundle(id).await
    }
}
