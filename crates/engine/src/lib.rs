//! Courier delivery engine.
//!
//! A campaign delivers one opaque, pre-signed bundle into a predictable
//! future block through a private relay network. The [`RetryCoordinator`]
//! drives each attempt through the [`TargetScheduler`], the
//! [`SimulationGate`], the [`CompetitionMonitor`], the
//! [`MultiChannelSubmitter`] and the [`InclusionVerifier`], retrying against
//! a new target until the bundle lands or the campaign expires.
//!
//! Collaborators are reached through traits: [`ChainReader`] for chain
//! state, the relay traits implemented by [`courier_relay::RelayClient`],
//! [`BundleSource`] for payload construction and [`StatsSink`] for the
//! append-only audit log.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod competition;
pub use competition::{CompetitionError, CompetitionMonitor, CompetitionReport};

mod control;
pub use control::CampaignHandle;

mod coordinator;
pub use coordinator::{
    CampaignError, CampaignOutcome, CampaignReport, CampaignState, ExpiryReason, RetryCoordinator,
    Transition,
};

mod impls;
pub use impls::{FileBundleSource, FileSourceError, RpcChain};

mod request;
pub use request::{AttemptAdvice, BuildRequest};

mod scheduler;
pub use scheduler::{schedule_from, ScheduleError, TargetScheduler};

mod simulation;
pub use simulation::{SimulationError, SimulationGate};

mod sink;
pub use sink::{JsonlStatsSink, MemoryStatsSink, SinkError};

mod submitter;
pub use submitter::{MultiChannelSubmitter, SubmissionReport, SubmitError};

mod traits;
pub use traits::{
    BundleCanceller, BundleSimulator, BundleSource, BundleStatusSource, BundleSubmitter,
    ChainReader, ConflictSource, StatsSink,
};

mod verifier;
pub use verifier::{InclusionVerifier, Verification, VerifyError};
