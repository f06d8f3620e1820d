//! `courier`: deliver a pre-signed bundle into a targeted future block.
//!
//! Reads the bundle payload from a file on every attempt, fans it out to the
//! relay and any extra builders, and retries with a later target until it
//! lands or the attempt budget runs out. Stats for every bundle are appended
//! to a JSON lines file. The final outcome is printed to stdout as JSON.

mod args;
use args::Args;

use alloy::{providers::ProviderBuilder, signers::local::PrivateKeySigner};
use clap::Parser;
use courier_constants::NetworkConstants;
use courier_engine::{
    CampaignError, CampaignReport, FileBundleSource, JsonlStatsSink, MultiChannelSubmitter,
    RetryCoordinator, RpcChain,
};
use courier_relay::RelayClient;
use courier_types::SlotCalculator;
use eyre::WrapErr;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn relay_client(args: &Args, network: NetworkConstants) -> eyre::Result<RelayClient> {
    match &args.relay_url {
        Some(url) => Ok(RelayClient::new(url.clone())),
        None => RelayClient::for_network(network)
            .wrap_err_with(|| format!("no usable default relay for {}", network.name())),
    }
}

fn print_report(report: &CampaignReport) -> eyre::Result<()> {
    let summary = serde_json::json!({
        "outcome": report.outcome,
        "bundles": report.bundles(),
        "transitions": report.transitions,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let network = args.network.constants();
    let config = args.engine_config(&network);

    let identity = args.signing_key.clone().unwrap_or_else(|| {
        warn!("no signing key given, using a throwaway relay identity");
        PrivateKeySigner::random()
    });

    let relay = relay_client(&args, network)?.with_signer(identity.clone());
    let endpoints: Vec<RelayClient> = std::iter::once(relay.clone())
        .chain(
            args.builder_urls
                .iter()
                .map(|url| RelayClient::new(url.clone()).with_signer(identity.clone())),
        )
        .collect();

    info!(
        network = network.name(),
        relay = relay.name(),
        identity = %identity.address(),
        channels = endpoints.len(),
        payload = %args.payload.display(),
        "starting campaign"
    );

    let chain = RpcChain::new(ProviderBuilder::new().connect_http(args.rpc_url.clone()));
    let submitter = MultiChannelSubmitter::new(endpoints, config.submission);
    let source = FileBundleSource::new(&args.payload);
    let sink = JsonlStatsSink::open(&args.stats_out)?;

    let coordinator = RetryCoordinator::new(
        chain,
        relay,
        submitter,
        source,
        sink,
        config,
        SlotCalculator::from(network),
    )?;
    let handle = coordinator.spawn();

    let token = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping campaign");
            token.cancel();
        }
    });

    match handle.wait().await {
        Ok(report) => {
            print_report(&report)?;
            if let Some(block) = report.outcome.included_block() {
                info!(block, bundles = report.bundles(), "bundle included");
                Ok(ExitCode::SUCCESS)
            } else {
                warn!(outcome = ?report.outcome, bundles = report.bundles(), "not included");
                Ok(ExitCode::FAILURE)
            }
        }
        Err(CampaignError::Schedule { source, history, .. }) => {
            error!(%source, bundles = history.len(), "campaign aborted");
            Err(source.into())
        }
        Err(e) => Err(e.into()),
    }
}
