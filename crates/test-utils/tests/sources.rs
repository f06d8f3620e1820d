//! Tests for the collaborators that feed the engine: payload files, the
//! provider-backed chain reader and the relay client.

use alloy::{
    consensus::TxEnvelope,
    eips::eip2718::Decodable2718,
    primitives::U64,
    providers::ProviderBuilder,
    transports::mock::Asserter,
};
use courier_engine::{
    BuildRequest, BundleCanceller, BundleSimulator, BundleSource, BundleStatusSource,
    BundleSubmitter, ChainReader, ConflictSource, FileBundleSource, RpcChain,
};
use courier_relay::RelayClient;
use courier_test_utils::payloads::{test_draft, TEST_MAX_GAS};
use courier_types::{BlockTarget, Bundle};

#[test]
fn bundle_hashes_match_transaction_hashes() {
    let bundle = Bundle::new(test_draft(1));
    let envelope = TxEnvelope::decode_2718(&mut bundle.txs()[0].as_ref()).unwrap();
    assert_eq!(bundle.tx_hashes(), &[*envelope.tx_hash()]);
    assert_eq!(bundle.declared_max_gas(), TEST_MAX_GAS);
}

#[test]
fn retries_produce_distinct_payloads() {
    let first = Bundle::new(test_draft(1));
    let second = Bundle::new(test_draft(2));
    assert_ne!(first.tx_hashes(), second.tx_hashes());
}

#[tokio::test]
async fn file_source_reads_written_draft() {
    let draft = test_draft(3);
    let path = std::env::temp_dir().join(format!("courier-payload-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_vec_pretty(&draft).unwrap()).unwrap();

    let source = FileBundleSource::new(&path);
    let request = BuildRequest::new(1, BlockTarget::new(100, 100, 5), 0);
    assert_eq!(source.build_bundle(&request).await.unwrap(), draft);

    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn rpc_chain_reads_height() {
    let asserter = Asserter::new();
    let chain = RpcChain::new(ProviderBuilder::new().connect_mocked_client(asserter.clone()));

    asserter.push_success(&U64::from(19_999_950u64));
    assert_eq!(chain.block_number().await.unwrap(), 19_999_950);

    asserter.push_failure_msg("node unavailable");
    assert!(chain.block_number().await.is_err());
}

fn relay_collaborator<R>(_: &R)
where
    R: BundleSimulator + ConflictSource + BundleStatusSource + BundleCanceller + Send + Sync,
{
}

fn builder_endpoint<S: BundleSubmitter + Send + Sync>(_: &S) {}

#[test]
fn relay_client_plays_every_relay_role() {
    let client = RelayClient::new_from_string("http://localhost:18545").unwrap();
    relay_collaborator(&client);
    builder_endpoint(&client);
}
