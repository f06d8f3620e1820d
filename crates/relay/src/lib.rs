//! Courier relay client.
//!
//! A JSON-RPC client for Flashbots-style relays and builder endpoints,
//! covering bundle simulation, submission, cancellation, and the relay's
//! stats and conflict lookups.

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

/// The [`RelayClient`].
pub mod client;
pub use client::{RelayClient, SIGNATURE_HEADER};

/// Errors returned by the [`RelayClient`].
pub mod error;
pub use error::RelayError;

/// Request and response types for the relay.
pub mod types;
pub use types::{
    BuilderTimestamp, BundleGasPricing, BundleStatsResponse, CallBundleResponse,
    CallBundleTxResult, ConflictingBundleResponse, SendBundleResponse,
};
