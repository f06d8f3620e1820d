use crate::{test_constants::CHAIN_ID, users::TEST_SIGNERS};
use alloy::{
    consensus::{constants::GWEI_TO_WEI, SignableTransaction, TxEip1559, TxEnvelope},
    eips::eip2718::Encodable2718,
    primitives::{Address, Bytes, TxKind, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use courier_types::BundleDraft;

/// Gas declared by [`test_draft`] bundles.
pub const TEST_MAX_GAS: u64 = 100_000;

/// Sign a transaction with a wallet.
pub fn sign_tx_with_key_pair(wallet: &PrivateKeySigner, tx: TxEip1559) -> TxEnvelope {
    let signature = wallet.sign_hash_sync(&tx.signature_hash()).unwrap();
    tx.into_signed(signature).into()
}

/// Make a simple send transaction paying `priority_gwei` to the builder.
pub fn simple_send(to: Address, amount: U256, nonce: u64, priority_gwei: u128) -> TxEip1559 {
    TxEip1559 {
        nonce,
        gas_limit: 21_000,
        to: TxKind::Call(to),
        value: amount,
        chain_id: CHAIN_ID,
        max_fee_per_gas: GWEI_TO_WEI as u128 * 100,
        max_priority_fee_per_gas: GWEI_TO_WEI as u128 * priority_gwei,
        ..Default::default()
    }
}

/// A signed, EIP-2718 encoded send from the first test signer.
pub fn signed_payload(nonce: u64, priority_gwei: u128) -> Bytes {
    let tx = simple_send(Address::repeat_byte(0x31), U256::from(1), nonce, priority_gwei);
    sign_tx_with_key_pair(&TEST_SIGNERS[0], tx).encoded_2718().into()
}

/// A one-transaction draft. The priority fee grows with the attempt, so
/// every attempt has distinct transaction hashes.
pub fn test_draft(attempt: u32) -> BundleDraft {
    let payload = signed_payload(0, u128::from(attempt));
    let max_cost = U256::from(GWEI_TO_WEI) * U256::from(TEST_MAX_GAS);
    BundleDraft::new(vec![payload], TEST_MAX_GAS, max_cost)
}
