use crate::ChainReader;
use alloy::{
    eips::BlockNumberOrTag,
    primitives::TxHash,
    providers::Provider,
    transports::TransportError,
};

/// A [`ChainReader`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct RpcChain<P>(P);

impl<P> RpcChain<P> {
    /// Wrap a provider.
    pub const fn new(provider: P) -> Self {
        Self(provider)
    }

    /// Get a reference to the provider.
    pub const fn provider(&self) -> &P {
        &self.0
    }

    /// Unwrap the provider.
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P> ChainReader for RpcChain<P>
where
    P: Provider + Send + Sync,
{
    type Error = TransportError;

    async fn block_number(&self) -> Result<u64, Self::Error> {
        self.0.get_block_number().await
    }

    async fn base_fee(&self) -> Result<u128, Self::Error> {
        let block = self.0.get_block_by_number(BlockNumberOrTag::Latest).await?;
        let base_fee = block.and_then(|block| block.header.base_fee_per_gas);
        Ok(base_fee.map(u128::from).unwrap_or_default())
    }

    async fn block_transactions(&self, number: u64) -> Result<Option<Vec<TxHash>>, Self::Error> {
        let block = self.0.get_block_by_number(BlockNumberOrTag::Number(number)).await?;
        Ok(block.map(|block| block.transactions.hashes().collect()))
    }
}
