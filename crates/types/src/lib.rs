//! Courier types shared by the relay client, the engine, and its tests.
//!
//! The data model follows a single delivery campaign: a [`BlockTarget`] is
//! selected, a [`Bundle`] is built and simulated into a
//! [`SimulationResult`], fanned out as [`SubmissionAttempt`]s, and finally
//! resolved into an [`InclusionOutcome`]. Every step is recorded in an
//! append-only [`BundleStats`] audit record.

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
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod block;
pub use block::BlockTarget;

mod bundle;
pub use bundle::{Bundle, BundleDraft, BundleId, BundleStatus, StatusTransitionError};

/// Engine configuration.
pub mod config;
pub use config::{ConfigError, EngineConfig};

mod conflict;
pub use conflict::{CompetingBundle, ConflictKind};

mod sim;
pub use sim::SimulationResult;

mod slot;
pub use slot::SlotCalculator;

mod stats;
pub use stats::{BundleStats, InclusionOutcome, RelayBundleStatus};

mod submission;
pub use submission::{AttemptOutcome, BundleAck, ChannelId, SubmissionAttempt};
