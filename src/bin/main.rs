//! Feebump CLI
//!
//!   feebump bump [--apply]   → run the fee-escalation monitor
//!   feebump prioritise       → announce unconfirmed txs to mining nodes
//!   feebump wallets          → print loaded wallets as a JSON array
//!
//! Configuration: `--config <path>` (default feebump.json), then
//! BITCOIN_RPC_URL / BITCOIN_RPC_USER / BITCOIN_RPC_PASS / FEEBUMP_APPLY,
//! then flags. A `.env` file in the working directory fills unset variables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use feebump::config::{load_dotenv, DEFAULT_CONFIG_PATH};
use feebump::logging::init_logging;
use feebump::{install_signal_handlers, Config, HttpRpcClient, Ledger, Monitor, Prioritiser};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "feebump", version, about = "Escalate fees of stuck unconfirmed wallet transactions")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the fee-escalation monitor
    Bump {
        /// Submit bumpfee instead of logging what would be done
        #[arg(long)]
        apply: bool,
    },
    /// Run the prioritisation broadcaster
    Prioritise,
    /// Print wallets loaded on the node and exit
    Wallets,
}

fn main() {
    let cli = Cli::parse();
    load_dotenv(Path::new(".env"));

    if let Err(err) = run(cli) {
        eprintln!("{}", json!({ "error": format!("{:#}", err) }));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(&cli.config).context("loading configuration")?;
    if let Some(path) = cli.log_file {
        config.log_file = Some(path);
    }
    init_logging(config.log_file.as_deref()).context("opening log file")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    runtime.block_on(async move {
        let ledger = Ledger::new(HttpRpcClient::new(&config.rpc)?);
        match cli.command {
            Command::Bump { apply } => {
                let bumpfee = config.bumpfee.clone().with_apply(config.bumpfee.apply || apply);
                let shutdown = bumpfee.graceful_shutdown.then(|| install_signal_handlers().subscribe());
                Monitor::start(ledger, &bumpfee).await.run(shutdown).await;
            }
            Command::Prioritise => {
                config.prioritise.validate()?;
                let shutdown = config.prioritise.graceful_shutdown.then(|| install_signal_handlers().subscribe());
                Prioritiser::connect(ledger, &config.prioritise).await?.run(shutdown).await;
            }
            Command::Wallets => {
                let wallets = ledger.list_wallets().await.context("listwallets")?;
                println!("{}", serde_json::to_string(&wallets)?);
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}
