use alloy::primitives::{Bytes, B256, U256};
use chrono::{DateTime, Utc};
use courier_types::{CompetingBundle, ConflictKind, RelayBundleStatus, SimulationResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    pub(crate) const fn new(id: u64, method: &'a str, params: P) -> Self {
        Self { jsonrpc: "2.0", id, method, params }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub(crate) code: i64,
    pub(crate) message: String,
}

/// A JSON-RPC 2.0 response envelope. The result is kept as raw JSON until
/// the error member has been checked.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Split the response into its result or its error object.
    pub(crate) fn into_result<T: DeserializeOwned>(
        self,
    ) -> Result<Result<T, serde_json::Error>, RpcErrorObject> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(serde_json::from_value(self.result.unwrap_or(serde_json::Value::Null)))
    }
}

/// Per-transaction result of `eth_callBundle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallBundleTxResult {
    /// Hash of the simulated transaction.
    pub tx_hash: B256,
    /// Gas used by the transaction.
    #[serde(default)]
    pub gas_used: u64,
    /// Execution error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Revert data, if the transaction reverted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert: Option<String>,
}

impl CallBundleTxResult {
    /// The failure description, if the transaction failed.
    pub fn failure(&self) -> Option<String> {
        match (&self.error, &self.revert) {
            (Some(error), Some(revert)) => Some(format!("{error}: {revert}")),
            (Some(error), None) => Some(error.clone()),
            (None, Some(revert)) => Some(format!("reverted: {revert}")),
            (None, None) => None,
        }
    }
}

/// Response to `eth_callBundle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallBundleResponse {
    /// Hash of the simulated bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_hash: Option<B256>,
    /// Effective gas price of the bundle.
    #[serde(default)]
    pub bundle_gas_price: U256,
    /// Change of the proposer's balance.
    #[serde(default)]
    pub coinbase_diff: U256,
    /// Total gas used.
    #[serde(default)]
    pub total_gas_used: u64,
    /// Block the simulation state was taken from.
    #[serde(default)]
    pub state_block_number: u64,
    /// Per-transaction results.
    #[serde(default)]
    pub results: Vec<CallBundleTxResult>,
}

impl CallBundleResponse {
    /// The first transaction failure, if any transaction failed.
    pub fn first_failure(&self) -> Option<String> {
        self.results.iter().find_map(|r| r.failure().map(|f| format!("tx {}: {f}", r.tx_hash)))
    }
}

impl From<CallBundleResponse> for SimulationResult {
    fn from(response: CallBundleResponse) -> Self {
        match response.first_failure() {
            Some(reason) => {
                Self::failed(response.total_gas_used, response.coinbase_diff, reason)
            }
            None => Self::succeeded(response.total_gas_used, response.coinbase_diff),
        }
    }
}

/// A builder's timestamped acknowledgement in the v2 bundle stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderTimestamp {
    /// Builder public key.
    #[serde(default)]
    pub pubkey: Option<String>,
    /// When the builder saw the bundle.
    pub timestamp: DateTime<Utc>,
}

/// Response to `flashbots_getBundleStatsV2`.
///
/// Also accepts the v1 shape, whose `isSentToMiners` and `sentToMinersAt`
/// fields map onto builder consideration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleStatsResponse {
    /// The relay considered the sender high priority.
    #[serde(default)]
    pub is_high_priority: bool,
    /// The relay simulated the bundle.
    #[serde(default)]
    pub is_simulated: bool,
    /// When the relay simulated the bundle.
    #[serde(default)]
    pub simulated_at: Option<DateTime<Utc>>,
    /// When the relay received the bundle.
    #[serde(default, alias = "submittedAt")]
    pub received_at: Option<DateTime<Utc>>,
    /// Builders that considered the bundle.
    #[serde(default)]
    pub considered_by_builders_at: Vec<BuilderTimestamp>,
    /// Builders that sealed a block with the bundle.
    #[serde(default)]
    pub sealed_by_builders_at: Vec<BuilderTimestamp>,
    /// v1: the relay forwarded the bundle.
    #[serde(default, skip_serializing)]
    is_sent_to_miners: bool,
    /// v1: when the relay forwarded the bundle.
    #[serde(default, skip_serializing)]
    sent_to_miners_at: Option<DateTime<Utc>>,
}

impl From<BundleStatsResponse> for RelayBundleStatus {
    fn from(stats: BundleStatsResponse) -> Self {
        let first_builder = stats.considered_by_builders_at.iter().map(|b| b.timestamp).min();
        Self {
            is_simulated: stats.is_simulated,
            is_sent_to_builders: stats.is_sent_to_miners
                || !stats.considered_by_builders_at.is_empty(),
            is_high_priority: stats.is_high_priority,
            submitted_at: stats.received_at,
            simulated_at: stats.simulated_at,
            sent_to_builders_at: first_builder.or(stats.sent_to_miners_at),
        }
    }
}

/// Gas pricing of one side of a bundle conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleGasPricing {
    /// Total gas used.
    #[serde(default)]
    pub gas_used: u64,
    /// Payment to the proposer.
    #[serde(default)]
    pub coinbase_diff: U256,
    /// Effective priority fee per gas, if the relay computed it.
    #[serde(default)]
    pub effective_priority_fee: Option<U256>,
}

impl BundleGasPricing {
    /// The effective priority fee, computed from the proposer payment when
    /// the relay did not report it.
    pub fn priority_fee(&self) -> U256 {
        if let Some(fee) = self.effective_priority_fee {
            return fee;
        }
        if self.gas_used == 0 {
            return U256::ZERO;
        }
        self.coinbase_diff / U256::from(self.gas_used)
    }
}

/// Response to `flashbots_getConflictingBundle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingBundleResponse {
    /// Relay conflict classification.
    ///
    /// 0: none, 1: nonce collision, 2: error, 3: coinbase payment,
    /// 4: gas used, 5: no bundles landed.
    #[serde(default)]
    pub conflict_type: u8,
    /// Pricing of the bundle that landed instead of ours.
    #[serde(default)]
    pub conflicting_bundle_gas_pricing: Option<BundleGasPricing>,
    /// Pricing of our bundle.
    #[serde(default)]
    pub target_bundle_gas_pricing: Option<BundleGasPricing>,
}

impl ConflictingBundleResponse {
    /// The conflict kind, if the relay reports one.
    pub const fn conflict_kind(&self) -> Option<ConflictKind> {
        match self.conflict_type {
            1 => Some(ConflictKind::NonceConflict),
            3 => Some(ConflictKind::GasPriceConflict),
            2 | 4 => Some(ConflictKind::StorageConflict),
            _ => None,
        }
    }

    /// Convert into a [`CompetingBundle`], if a conflict was reported.
    pub fn into_competing(self) -> Option<CompetingBundle> {
        let kind = self.conflict_kind()?;
        let fee = self
            .conflicting_bundle_gas_pricing
            .map(|pricing| pricing.priority_fee())
            .unwrap_or_default();
        Some(CompetingBundle::new(kind, fee))
    }
}

/// Parameters of `flashbots_getBundleStatsV2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BundleStatsParams {
    pub(crate) bundle_hash: B256,
    #[serde(with = "alloy::serde::quantity")]
    pub(crate) block_number: u64,
}

/// Parameters of `eth_cancelBundle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelBundleParams {
    pub(crate) replacement_uuid: String,
}

/// Parameters of `eth_callBundle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallBundleParams<'a> {
    pub(crate) txs: &'a [Bytes],
    #[serde(with = "alloy::serde::quantity")]
    pub(crate) block_number: u64,
    pub(crate) state_block_number: String,
}

/// Parameters of `eth_sendBundle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendBundleParams<'a> {
    pub(crate) txs: &'a [Bytes],
    #[serde(with = "alloy::serde::quantity")]
    pub(crate) block_number: u64,
    pub(crate) replacement_uuid: String,
}

/// Response to `eth_sendBundle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBundleResponse {
    /// Hash of the bundle, as computed by the relay.
    #[serde(default)]
    pub bundle_hash: Option<B256>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_bundle_with_revert_fails() {
        let response: CallBundleResponse = serde_json::from_value(json!({
            "bundleGasPrice": "476190476193",
            "bundleHash": "0x73b1e258c7a42fd0230b2fd05529c5d4b6fcb66c227783f8bece8aeacdd1db2e",
            "coinbaseDiff": "20000000000126000",
            "totalGasUsed": 42000,
            "stateBlockNumber": 5221585,
            "results": [{
                "txHash": "0x669b4704a7d993a946cdd6e2f95233f308ce0c4649d2e04944e8299efcaa098a",
                "gasUsed": 21000
            }, {
                "txHash": "0xa839ee83465657cac01adc1d50d96c1b586ed498120a84a64749c0034b4f19fa",
                "gasUsed": 21000,
                "error": "execution reverted",
                "revert": "0x"
            }]
        }))
        .unwrap();

        let sim = SimulationResult::from(response);
        assert!(!sim.success);
        assert_eq!(sim.gas_used, 42000);
        assert_eq!(sim.coinbase_diff, U256::from(20000000000126000u64));
        assert!(sim.revert_reason.unwrap().contains("execution reverted"));
    }

    #[test]
    fn call_bundle_success() {
        let response: CallBundleResponse = serde_json::from_value(json!({
            "coinbaseDiff": "0x10",
            "totalGasUsed": 21000,
            "results": [{
                "txHash": "0x669b4704a7d993a946cdd6e2f95233f308ce0c4649d2e04944e8299efcaa098a",
                "gasUsed": 21000
            }]
        }))
        .unwrap();
        let sim = SimulationResult::from(response);
        assert!(sim.success);
        assert_eq!(sim.coinbase_diff, U256::from(16));
    }

    #[test]
    fn stats_v2_decoding() {
        let stats: BundleStatsResponse = serde_json::from_value(json!({
            "isHighPriority": true,
            "isSimulated": true,
            "simulatedAt": "2022-10-06T21:36:06.317Z",
            "receivedAt": "2022-10-06T21:36:06.250Z",
            "consideredByBuildersAt": [
                { "pubkey": "0x81ba", "timestamp": "2022-10-06T21:36:06.343Z" },
                { "pubkey": "0x81bb", "timestamp": "2022-10-06T21:36:06.342Z" }
            ],
            "sealedByBuildersAt": []
        }))
        .unwrap();

        let status = RelayBundleStatus::from(stats);
        assert!(status.is_simulated);
        assert!(status.is_sent_to_builders);
        assert!(status.is_high_priority);
        assert_eq!(
            status.sent_to_builders_at.unwrap().to_rfc3339(),
            "2022-10-06T21:36:06.342+00:00"
        );
        assert!(status.submitted_at.is_some());
    }

    #[test]
    fn stats_v1_decoding() {
        let stats: BundleStatsResponse = serde_json::from_value(json!({
            "isSimulated": true,
            "isSentToMiners": true,
            "isHighPriority": false,
            "simulatedAt": "2021-08-06T21:36:06.317Z",
            "submittedAt": "2021-08-06T21:36:06.250Z",
            "sentToMinersAt": "2021-08-06T21:36:06.343Z"
        }))
        .unwrap();

        let status = RelayBundleStatus::from(stats);
        assert!(status.is_sent_to_builders);
        assert!(!status.is_high_priority);
        assert!(status.submitted_at.is_some());
        assert!(status.sent_to_builders_at.is_some());
    }

    #[test]
    fn conflicting_bundle_mapping() {
        let response: ConflictingBundleResponse = serde_json::from_value(json!({
            "conflictType": 1,
            "conflictingBundleGasPricing": {
                "gasUsed": 100000,
                "coinbaseDiff": "3000000000000000"
            }
        }))
        .unwrap();

        let competing = response.into_competing().unwrap();
        assert_eq!(competing.conflict_kind, ConflictKind::NonceConflict);
        assert_eq!(competing.competitor_priority_fee, U256::from(30_000_000_000u64));

        let none: ConflictingBundleResponse =
            serde_json::from_value(json!({ "conflictType": 0 })).unwrap();
        assert!(none.into_competing().is_none());
    }

    #[test]
    fn rpc_error_is_surfaced() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "bundle not found" }
        }))
        .unwrap();
        let err = response.into_result::<SendBundleResponse>().unwrap_err();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "bundle not found");
    }

    #[test]
    fn send_params_encoding() {
        let txs = [Bytes::from_static(&[0x02, 0x01])];
        let params = SendBundleParams {
            txs: &txs,
            block_number: 100,
            replacement_uuid: "id".to_string(),
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({ "txs": ["0x0201"], "blockNumber": "0x64", "replacementUuid": "id" })
        );
    }
}
