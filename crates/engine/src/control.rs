use crate::{
    BundleCanceller, BundleSimulator, BundleSource, BundleStatusSource, BundleSubmitter,
    CampaignError, CampaignReport, ChainReader, ConflictSource, RetryCoordinator, StatsSink,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Operator control over a campaign running on its own task.
#[derive(Debug)]
pub struct CampaignHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<CampaignReport, CampaignError>>,
}

impl CampaignHandle {
    /// Ask the campaign to stop. It finishes the step in progress only as far
    /// as recording what was already sent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// A token that stops the campaign when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// True once the campaign task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the campaign to end.
    pub async fn wait(self) -> Result<CampaignReport, CampaignError> {
        self.task.await?
    }
}

impl<C, R, S, B, K> RetryCoordinator<C, R, S, B, K>
where
    C: ChainReader + Send + Sync + 'static,
    R: BundleSimulator
        + ConflictSource
        + BundleStatusSource
        + BundleCanceller
        + Send
        + Sync
        + 'static,
    S: BundleSubmitter + Send + Sync + 'static,
    B: BundleSource + Send + Sync + 'static,
    K: StatsSink + Send + Sync + 'static,
{
    /// Run the campaign on a new task.
    pub fn spawn(self) -> CampaignHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(token).await });
        CampaignHandle { cancel, task }
    }
}
