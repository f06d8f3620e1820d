use crate::{BundleCanceller, BundleStatusSource, BundleSimulator, BundleSubmitter, ConflictSource};
use alloy::primitives::{Bytes, B256};
use courier_relay::{RelayClient, RelayError};
use courier_types::{
    Bundle, BundleAck, BundleId, CompetingBundle, RelayBundleStatus, SimulationResult,
};

impl BundleSimulator for RelayClient {
    type Error = RelayError;

    async fn simulate_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
        state_block: Option<u64>,
    ) -> Result<SimulationResult, Self::Error> {
        self.call_bundle(txs, block_number, state_block).await.map(Into::into)
    }
}

impl ConflictSource for RelayClient {
    type Error = RelayError;

    async fn conflicting_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
    ) -> Result<Option<CompetingBundle>, Self::Error> {
        RelayClient::conflicting_bundle(self, txs, block_number)
            .await
            .map(|response| response.into_competing())
    }
}

impl BundleStatusSource for RelayClient {
    type Error = RelayError;

    async fn bundle_status(
        &self,
        bundle_hash: B256,
        block_number: u64,
    ) -> Result<RelayBundleStatus, Self::Error> {
        self.bundle_stats(bundle_hash, block_number).await.map(Into::into)
    }
}

impl BundleCanceller for RelayClient {
    type Error = RelayError;

    async fn cancel_bundle(&self, id: BundleId) -> Result<(), Self::Error> {
        RelayClient::cancel_bundle(self, id).await
    }
}

impl BundleSubmitter for RelayClient {
    type Error = RelayError;

    fn endpoint(&self) -> &str {
        self.name()
    }

    async fn submit_bundle(
        &self,
        bundle: &Bundle,
        block_number: u64,
    ) -> Result<BundleAck, Self::Error> {
        let response = self.send_bundle(bundle.txs(), block_number, bundle.id()).await?;
        Ok(BundleAck { bundle_hash: response.bundle_hash })
    }
}
