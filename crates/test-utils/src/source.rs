use crate::{payloads::test_draft, MockError};
use courier_engine::{BuildRequest, BundleSource};
use courier_types::BundleDraft;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// A mock [`BundleSource`] that builds [`test_draft`] payloads and records
/// every request. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBundleSource {
    failing_attempts: Arc<Mutex<Vec<u32>>>,
    drafts: Arc<Mutex<Option<BundleDraft>>>,
    requests: Arc<Mutex<Vec<BuildRequest>>>,
    delay: Arc<Mutex<Duration>>,
}

impl MockBundleSource {
    /// Create a new mock bundle source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail to build on the given attempts.
    pub fn failing_on(self, attempts: impl IntoIterator<Item = u32>) -> Self {
        self.failing_attempts.lock().unwrap().extend(attempts);
        self
    }

    /// Return `draft` for every attempt instead of a fresh test draft.
    pub fn with_draft(self, draft: BundleDraft) -> Self {
        *self.drafts.lock().unwrap() = Some(draft);
        self
    }

    /// Take `delay` of tokio time to build each bundle.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl BundleSource for MockBundleSource {
    type Error = MockError;

    async fn build_bundle(&self, request: &BuildRequest) -> Result<BundleDraft, Self::Error> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing_attempts.lock().unwrap().contains(&request.attempt) {
            return Err(MockError::new(format!("no payload for attempt {}", request.attempt)));
        }
        let fixed = self.drafts.lock().unwrap().clone();
        Ok(fixed.unwrap_or_else(|| test_draft(request.attempt)))
    }
}
