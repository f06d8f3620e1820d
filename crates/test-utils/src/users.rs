use alloy::{
    primitives::{Address, B256},
    signers::local::PrivateKeySigner,
};
use std::sync::LazyLock;

/// Make a wallet with a deterministic keypair.
pub fn make_wallet(i: u8) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&B256::repeat_byte(i)).unwrap()
}

/// Deterministic signers for tests.
pub static TEST_SIGNERS: LazyLock<[PrivateKeySigner; 10]> =
    LazyLock::new(|| core::array::from_fn(|i| make_wallet(i as u8 + 1)));

/// Addresses of [`TEST_SIGNERS`].
pub static TEST_USERS: LazyLock<[Address; 10]> =
    LazyLock::new(|| core::array::from_fn(|i| TEST_SIGNERS[i].address()));
