//! Command line front-end for batched ERC-20 airdrops.
//!
//! - `check`: parse the form, read the token and report whether it can be sent
//! - `send`: as `check`, then approve if needed and send the batch
//! - `clear-cache`: forget the last entered form

use action::{SubmitOutcome, Submitter};
use airdrop::{
    cache::FormCache,
    check,
    config::Config,
    display_amount, interrupt, log_transitions,
    metrics::{install_prometheus_exporter, Metrics},
    resolve_form, send,
};
use clap::{Args, Parser, Subcommand};
use client::ProviderChainClient;
use input::Form;
use lifecycle::TransactionLifecycle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "airdrop")]
#[command(about = "Send an ERC-20 token to many recipients in one transaction")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the token and report whether the form can be sent
    Check(FormArgs),

    /// Approve if needed, then send the batch
    Send(FormArgs),

    /// Forget the cached form
    ClearCache,
}

/// Form fields. Anything not given falls back to the cached form.
#[derive(Args)]
struct FormArgs {
    /// Token contract address
    #[arg(short, long)]
    token: Option<String>,

    /// Recipients, separated by commas or newlines
    #[arg(short, long, conflicts_with = "recipients_file")]
    recipients: Option<String>,

    /// File with recipients, one per line
    #[arg(long)]
    recipients_file: Option<String>,

    /// Amounts in base units, separated by commas, spaces or newlines
    #[arg(short, long, conflicts_with = "amounts_file")]
    amounts: Option<String>,

    /// File with amounts
    #[arg(long)]
    amounts_file: Option<String>,

    /// Print the check as JSON
    #[arg(long)]
    json: bool,
}

impl FormArgs {
    async fn resolve(&self, cached: Form) -> eyre::Result<Form> {
        let recipients = match &self.recipients_file {
            Some(path) => Some(tokio::fs::read_to_string(path).await?),
            None => self.recipients.clone(),
        };
        let amounts = match &self.amounts_file {
            Some(path) => Some(tokio::fs::read_to_string(path).await?),
            None => self.amounts.clone(),
        };

        Ok(resolve_form(cached, self.token.clone(), recipients, amounts))
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = Config::from_file(&cli.config)?;
    let cache = FormCache::new(config.cache_path());

    let (args, submit) = match &cli.command {
        Command::ClearCache => {
            if cache.clear()? {
                info!(path = %cache.path().display(), "Form cache cleared");
            } else {
                info!(path = %cache.path().display(), "No form cache to clear");
            }
            return Ok(());
        }
        Command::Check(args) => (args, false),
        Command::Send(args) => (args, true),
    };

    let private_key = cli.private_key.as_deref().ok_or_else(|| {
        eyre::eyre!("A private key is required, pass --private-key or set PRIVATE_KEY")
    })?;
    let owner = client::signer_address(private_key)?;
    let provider = client::create_wallet_provider(&config.rpc_url, private_key)?;
    let client = ProviderChainClient::new(provider);
    let routers = config.router_table()?;

    info!(rpc_url = %config.rpc_url, %owner, "Connected");

    let form = args.resolve(cache.load()).await?;
    let check = check(&client, &routers, &form, owner).await?;
    cache.save(&form)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else {
        println!("{check}");
    }

    if !submit {
        return Ok(());
    }
    if !check.is_ready() {
        eyre::bail!("Form is not ready to send");
    }

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }
    let metrics = Metrics::new();

    let lifecycle = TransactionLifecycle::new(config.lifecycle_config());
    let submitter = Submitter::new(client, routers, lifecycle.clone())
        .with_confirmations(config.confirmations);
    let _transitions = log_transitions(&lifecycle);

    let sending = send(&submitter, &form, &check.token, owner, &metrics);
    tokio::pin!(sending);

    let outcome = tokio::select! {
        outcome = &mut sending => outcome,
        _ = tokio::signal::ctrl_c() => {
            if interrupt(&lifecycle) {
                // dismissed or already finished, either way it returns promptly
                sending.await
            } else {
                warn!(
                    tx_hash = ?lifecycle.tx_hash(),
                    "Interrupted while waiting for confirmation, the transaction may still be mined"
                );
                return Ok(());
            }
        }
    };

    match outcome? {
        SubmitOutcome::Confirmed { approval, transfer } => {
            if let Some(approval) = approval {
                println!("Approved in {}", approval.tx_hash);
            }
            println!(
                "Sent {} to {} recipients in {}",
                display_amount(check.details.total, check.details.decimals),
                check.recipients,
                transfer.tx_hash
            );
        }
        SubmitOutcome::Cancelled => println!("Cancelled: the wallet never signed"),
    }

    Ok(())
}
