//! Courier network constants.
//!
//! This crate contains the per-network constants used by the courier engine:
//! chain ids, default relay endpoints, and the slot timing needed to turn a
//! block lead into wall-clock time.

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

mod chains;
pub use chains::{holesky, mainnet, sepolia};

#[cfg(any(test, feature = "test-utils"))]
pub use chains::test_utils;

mod types;
pub use types::{KnownNetworks, NetworkConstants, ParseNetworkError};

/// Default divisor used to select qualifying target blocks.
pub const DEFAULT_DIVISOR: u64 = 100;

/// Default number of blocks awaited after the target block before its
/// contents are treated as final.
pub const DEFAULT_CONFIRMATION_MARGIN: u64 = 1;
