use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use courier_constants::{KnownNetworks, NetworkConstants, DEFAULT_DIVISOR};
use courier_types::EngineConfig;
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Deliver a pre-signed bundle into a targeted future block.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about)]
pub(crate) struct Args {
    /// Network to target: mainnet, sepolia or holesky.
    #[arg(long, default_value = "mainnet")]
    pub(crate) network: KnownNetworks,

    /// Execution node JSON-RPC endpoint.
    #[arg(long, env = "ETH_RPC_URL")]
    pub(crate) rpc_url: Url,

    /// Relay endpoint. Defaults to the network's relay.
    #[arg(long, env = "FLASHBOTS_RELAY_URL")]
    pub(crate) relay_url: Option<Url>,

    /// Extra builder endpoints to fan out to. Repeatable.
    #[arg(long = "builder-url")]
    pub(crate) builder_urls: Vec<Url>,

    /// Key identifying us to the relay. Never used to sign transactions.
    #[arg(long, env = "FLASHBOTS_SIGNING_KEY", hide_env_values = true)]
    pub(crate) signing_key: Option<PrivateKeySigner>,

    /// JSON file holding the signed bundle payload. Re-read on every attempt.
    #[arg(long)]
    pub(crate) payload: PathBuf,

    /// Only target blocks divisible by this number.
    #[arg(long, default_value_t = DEFAULT_DIVISOR)]
    pub(crate) divisor: u64,

    /// Target a nearby block regardless of divisibility. For rehearsals.
    #[arg(long)]
    pub(crate) fast: bool,

    /// Minimum number of blocks between the chain head and the target.
    #[arg(long, default_value_t = 1)]
    pub(crate) fast_offset: u64,

    /// Retries after the first attempt.
    #[arg(long, default_value_t = 2)]
    pub(crate) max_retries: u32,

    /// Wall-clock budget for fanning a bundle out, in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub(crate) latency_budget_ms: u64,

    /// Consecutive blocks, starting at the target, to submit for.
    #[arg(long, default_value_t = 1)]
    pub(crate) block_window: u64,

    /// Give up after this many seconds.
    #[arg(long)]
    pub(crate) deadline_secs: Option<u64>,

    /// File the stats log is appended to.
    #[arg(long, default_value = "courier-stats.jsonl")]
    pub(crate) stats_out: PathBuf,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub(crate) log_level: String,
}

impl Args {
    /// Engine configuration for the selected network.
    pub(crate) fn engine_config(&self, network: &NetworkConstants) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.scheduler.divisor = self.divisor;
        config.scheduler.fast = self.fast;
        config.scheduler.fast_offset = self.fast_offset;
        config.submission.latency_budget = Duration::from_millis(self.latency_budget_ms);
        config.submission.block_window = self.block_window;
        config.verifier.block_time = network.block_time();
        config.coordinator.max_retries = self.max_retries;
        config.coordinator.deadline = self.deadline_secs.map(Duration::from_secs);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: [&str; 5] =
        ["courier", "--rpc-url", "http://localhost:8545", "--payload", "bundle.json"];

    fn parse(extra: &[&str]) -> Args {
        Args::try_parse_from(BASE.iter().chain(extra)).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.network, KnownNetworks::Mainnet);
        assert!(args.relay_url.is_none());
        assert!(args.builder_urls.is_empty());

        let config = args.engine_config(&args.network.constants());
        assert_eq!(config, {
            let mut expected = EngineConfig::default();
            expected.verifier.block_time = Duration::from_secs(12);
            expected
        });
        config.validate().unwrap();
    }

    #[test]
    fn overrides() {
        let args = parse(&[
            "--network",
            "holesky",
            "--divisor",
            "10",
            "--fast",
            "--max-retries",
            "5",
            "--latency-budget-ms",
            "250",
            "--block-window",
            "3",
            "--deadline-secs",
            "600",
            "--builder-url",
            "https://a.example",
            "--builder-url",
            "https://b.example",
        ]);
        assert_eq!(args.network, KnownNetworks::Holesky);
        assert_eq!(args.builder_urls.len(), 2);

        let config = args.engine_config(&args.network.constants());
        assert_eq!(config.scheduler.divisor, 10);
        assert!(config.scheduler.fast);
        assert_eq!(config.coordinator.max_retries, 5);
        assert_eq!(config.submission.latency_budget, Duration::from_millis(250));
        assert_eq!(config.submission.block_window, 3);
        assert_eq!(config.coordinator.deadline, Some(Duration::from_secs(600)));
    }

    #[test]
    fn zero_divisor_fails_validation() {
        let args = parse(&["--divisor", "0"]);
        assert!(args.engine_config(&args.network.constants()).validate().is_err());
    }

    #[test]
    fn rejects_unknown_network() {
        let mut argv = BASE.to_vec();
        argv.extend(["--network", "goerli"]);
        assert!(Args::try_parse_from(argv).is_err());
    }
}
