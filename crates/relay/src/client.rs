use crate::{
    error::{RelayError, Result},
    types::{
        BundleStatsParams, BundleStatsResponse, CallBundleParams, CallBundleResponse,
        CancelBundleParams, ConflictingBundleResponse, RpcRequest, RpcResponse,
        SendBundleParams, SendBundleResponse,
    },
};
use alloy::{
    hex,
    primitives::{keccak256, Address, Bytes, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use courier_constants::NetworkConstants;
use courier_types::BundleId;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, instrument, warn};

/// The relay authentication header.
pub const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

const CALL_BUNDLE: &str = "eth_callBundle";
const SEND_BUNDLE: &str = "eth_sendBundle";
const CANCEL_BUNDLE: &str = "eth_cancelBundle";
const BUNDLE_STATS: &str = "flashbots_getBundleStatsV2";
const CONFLICTING_BUNDLE: &str = "flashbots_getConflictingBundle";

/// JSON-RPC client for a Flashbots-style relay or builder endpoint.
///
/// Requests are signed with the configured identity key, if any. The key is
/// only a reputation identity and never signs bundle transactions.
#[derive(Debug, Clone)]
pub struct RelayClient {
    /// Human readable name of the endpoint, used as the channel name.
    name: String,
    /// The URL of the endpoint.
    url: reqwest::Url,
    /// The reqwest client used to send requests.
    client: reqwest::Client,
    /// Identity used to sign request bodies.
    signer: Option<PrivateKeySigner>,
    /// JSON-RPC request id counter.
    ids: Arc<AtomicU64>,
}

impl RelayClient {
    /// Create a new client with the given URL and reqwest client.
    pub fn new_with_client(url: reqwest::Url, client: reqwest::Client) -> Self {
        let name = url.host_str().unwrap_or("relay").to_string();
        Self { name, url, client, signer: None, ids: Arc::new(AtomicU64::new(1)) }
    }

    /// Instantiate a new client with the given URL and a new reqwest client.
    pub fn new(url: reqwest::Url) -> Self {
        Self::new_with_client(url, reqwest::Client::new())
    }

    /// Create a new client given a string URL.
    pub fn new_from_string(url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(url)?;
        Ok(Self::new(url))
    }

    /// Connect to the default relay of a network.
    pub fn for_network(constants: NetworkConstants) -> Result<Self> {
        Self::new_from_string(constants.relay_url())
    }

    /// Sign requests with the given identity key.
    pub fn with_signer(mut self, signer: PrivateKeySigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Override the endpoint name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the endpoint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the endpoint URL.
    pub const fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// Get the client used to send requests.
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Get the address of the signing identity, if any.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Produce the signature header value for a request body.
    ///
    /// The relay expects an EIP-191 signature over the hex encoding of the
    /// body's keccak hash, prefixed by the signer address.
    pub fn sign_body(&self, body: &[u8]) -> Result<Option<String>> {
        let Some(signer) = &self.signer else { return Ok(None) };
        let digest = hex::encode_prefixed(keccak256(body));
        let signature = signer.sign_message_sync(digest.as_bytes())?;
        Ok(Some(format!("{}:{}", signer.address(), hex::encode_prefixed(signature.as_bytes()))))
    }

    /// Send a JSON-RPC request. `params` must serialize to the positional
    /// parameter array.
    async fn request<P, R>(&self, method: &'static str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.ids.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_vec(&RpcRequest::new(id, method, params))?;

        let mut request = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(signature) = self.sign_body(&body)? {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request
            .body(body)
            .send()
            .await
            .inspect_err(|e| warn!(%e, method, "Failed to contact relay"))?;

        let status = response.status();
        let bytes = response.bytes().await?;

        // Relays may attach a JSON-RPC error object to non-2xx responses.
        let parsed = serde_json::from_slice::<RpcResponse>(&bytes);
        if !status.is_success() {
            if let Ok(Err(error)) = parsed.map(RpcResponse::into_result::<serde_json::Value>) {
                return Err(RelayError::Rpc { code: error.code, message: error.message });
            }
            warn!(%status, method, "Relay returned error status");
            return Err(status.into());
        }

        match parsed
            .inspect_err(|e| warn!(%e, method, "Failed to parse response from relay"))?
            .into_result::<R>()
        {
            Ok(result) => result.map_err(Into::into),
            Err(error) => {
                debug!(code = error.code, message = %error.message, method, "Relay RPC error");
                Err(RelayError::Rpc { code: error.code, message: error.message })
            }
        }
    }

    /// Simulate a bundle at `block_number` on top of the state after
    /// `state_block`, or the latest state when `state_block` is `None`.
    #[instrument(skip_all, fields(endpoint = %self.name, block_number))]
    pub async fn call_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
        state_block: Option<u64>,
    ) -> Result<CallBundleResponse> {
        let state_block_number = match state_block {
            Some(number) => format!("{number:#x}"),
            None => "latest".to_string(),
        };
        self.request(CALL_BUNDLE, [CallBundleParams { txs, block_number, state_block_number }])
            .await
    }

    /// Send a bundle for inclusion in `block_number`, tagged with the bundle
    /// id as its replacement UUID.
    #[instrument(skip_all, fields(endpoint = %self.name, block_number, %id))]
    pub async fn send_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
        id: BundleId,
    ) -> Result<SendBundleResponse> {
        let replacement_uuid = id.to_string();
        self.request(SEND_BUNDLE, [SendBundleParams { txs, block_number, replacement_uuid }]).await
    }

    /// Cancel every bundle sent with the given replacement UUID.
    #[instrument(skip_all, fields(endpoint = %self.name, %id))]
    pub async fn cancel_bundle(&self, id: BundleId) -> Result<()> {
        self.request::<_, serde_json::Value>(
            CANCEL_BUNDLE,
            [CancelBundleParams { replacement_uuid: id.to_string() }],
        )
        .await
        .map(drop)
    }

    /// Get the relay's stats for a bundle.
    #[instrument(skip_all, fields(endpoint = %self.name, %bundle_hash, block_number))]
    pub async fn bundle_stats(
        &self,
        bundle_hash: B256,
        block_number: u64,
    ) -> Result<BundleStatsResponse> {
        self.request(BUNDLE_STATS, [BundleStatsParams { bundle_hash, block_number }]).await
    }

    /// Get the bundle that prevented ours from landing in `block_number`.
    #[instrument(skip_all, fields(endpoint = %self.name, block_number))]
    pub async fn conflicting_bundle(
        &self,
        txs: &[Bytes],
        block_number: u64,
    ) -> Result<ConflictingBundleResponse> {
        // This method takes positional parameters rather than an object.
        self.request(CONFLICTING_BUNDLE, (txs, format!("{block_number:#x}"))).await
    }
}
