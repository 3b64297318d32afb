//! Symposium CLI: browse and act on the Symposium voting contract.

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinHandle;

use symposium_chain::ChainClient;
use symposium_client::{ClientConfig, Session, WriteTracker};
use symposium_store::views::updated_since;
use symposium_types::{
    Address, ChainId, Clock, DurationOption, OpinionDraft, OpinionId, ProposalDraft, ProposalId,
    Stance, SystemClock, Timestamp, TxHash,
};

#[derive(Parser)]
#[command(name = "symposium", about = "Symposium decentralized voting client")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SYMPOSIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Ethereum JSON-RPC endpoint.
    #[arg(long, env = "SYMPOSIUM_RPC_URL")]
    rpc_url: Option<String>,

    /// Chain the contract lives on (57054 = Sonic Blaze testnet).
    #[arg(long, env = "SYMPOSIUM_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Contract address override.
    #[arg(long, env = "SYMPOSIUM_CONTRACT")]
    contract: Option<Address>,

    /// Node-managed account to send transactions from.
    #[arg(long, env = "SYMPOSIUM_SENDER")]
    sender: Option<Address>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SYMPOSIUM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SYMPOSIUM_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List all proposals.
    List,
    /// Show one proposal with its opinions.
    Show { id: u64 },
    /// Create a proposal.
    Propose {
        #[arg(long)]
        title: String,
        #[arg(long)]
        details: String,
        /// 1d, 3d, 1w, 2w or 30d.
        #[arg(long, default_value = "1d")]
        duration: DurationOption,
        /// Display name shown until the next chain read.
        #[arg(long, default_value = "@you")]
        proposed_by: String,
    },
    /// Stake an opinion on a proposal.
    Opine {
        proposal: u64,
        #[arg(long, conflicts_with = "oppose", required_unless_present = "oppose")]
        support: bool,
        #[arg(long)]
        oppose: bool,
        text: String,
        #[arg(long, default_value = "anonymous")]
        author: String,
    },
    /// Vote for an existing opinion.
    Vote { proposal: u64, opinion: u64 },
    /// Lock in the winning side of an expired proposal.
    Finalize { proposal: u64 },
    /// Claim the reward of a finalized proposal.
    Claim { proposal: u64 },
    /// Follow contract events and print what changed, until ctrl-c.
    Watch,
    /// Run offline against sample data with simulated drift, until ctrl-c.
    Demo {
        #[arg(long)]
        tick_secs: Option<u64>,
    },
    /// List the proposal durations the contract accepts.
    Durations,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(id) = cli.chain_id {
        config.chain_id = ChainId(id);
    }
    if cli.contract.is_some() {
        config.contract_address = cli.contract;
    }
    if cli.sender.is_some() {
        config.sender = cli.sender;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    symposium_utils::init_logging(config.log_format()?, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Command::Durations => {
            for d in DurationOption::ALL {
                println!("{:<4} {:<8} {}s", d.short(), d.label(), d.secs());
            }
            return Ok(());
        }
        Command::Demo { tick_secs } => {
            config.simulate = true;
            if let Some(secs) = tick_secs {
                config.tick_interval_secs = secs.max(1);
            }
            let session = Session::offline(config, clock.clone());
            session.start_simulation().await;
            follow(&session, clock.as_ref()).await;
            session.dispose().await;
            return Ok(());
        }
        _ => {}
    }

    let chain: Arc<dyn ChainClient> = Arc::new(config.connect()?);
    let session = Session::init(config, chain, clock.clone()).await?;
    let result = run(&session, cli.command, clock.as_ref()).await;
    session.dispose().await;
    result
}

async fn run(session: &Session, command: Command, clock: &dyn Clock) -> anyhow::Result<()> {
    let store = session.store();
    let tracker = WriteTracker::new();

    let written = match command {
        Command::List => {
            let proposals = store.proposals();
            if proposals.is_empty() {
                println!("no proposals yet");
            }
            for p in &proposals {
                println!("{}", render::row(p, clock.now()));
            }
            None
        }
        Command::Show { id } => {
            let p = store
                .proposal(ProposalId(id))
                .ok_or_else(|| anyhow::anyhow!("proposal {id} not found"))?;
            print!("{}", render::detail(&p, clock.now()));
            None
        }
        Command::Propose {
            title,
            details,
            duration,
            proposed_by,
        } => {
            let draft = ProposalDraft {
                title,
                description: details,
                proposed_by,
                duration,
            };
            let printer = print_transitions(&tracker);
            Some((printer, session.create_proposal(draft, &tracker).await))
        }
        Command::Opine {
            proposal,
            oppose,
            text,
            author,
            ..
        } => {
            let draft = OpinionDraft {
                stance: if oppose { Stance::Oppose } else { Stance::Support },
                content: text,
                author,
            };
            let printer = print_transitions(&tracker);
            let result = session
                .add_opinion(ProposalId(proposal), draft, &tracker)
                .await;
            Some((printer, result))
        }
        Command::Vote { proposal, opinion } => {
            let printer = print_transitions(&tracker);
            let result = session
                .vote_for_opinion(ProposalId(proposal), OpinionId(opinion), &tracker)
                .await;
            Some((printer, result))
        }
        Command::Finalize { proposal } => {
            let printer = print_transitions(&tracker);
            let result = session
                .finalize_proposal(ProposalId(proposal), &tracker)
                .await;
            Some((printer, result))
        }
        Command::Claim { proposal } => {
            let printer = print_transitions(&tracker);
            let result = session.claim_reward(ProposalId(proposal), &tracker).await;
            Some((printer, result))
        }
        Command::Watch => {
            session.start_event_bridge().await?;
            follow(session, clock).await;
            None
        }
        Command::Demo { .. } | Command::Durations => None,
    };

    if let Some((printer, result)) = written {
        tokio::task::yield_now().await;
        printer.abort();
        let hash = result?;
        report_success(session, &tracker, &hash);
    }
    Ok(())
}

/// Print in-flight transitions as they happen; the caller prints the outcome.
fn print_transitions(tracker: &WriteTracker) -> JoinHandle<()> {
    let mut rx = tracker.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            if status.is_in_flight() {
                println!("  {status}");
            }
        }
    })
}

fn report_success(session: &Session, tracker: &WriteTracker, hash: &TxHash) {
    println!("  {}", tracker.status());
    println!("  {}", session.config().tx_url(hash));
}

/// Print every version change with the proposals updated since the last
/// one, until ctrl-c.
async fn follow(session: &Session, clock: &dyn Clock) {
    let shutdown = session.shutdown_controller().clone();
    let signal = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };

    let store = session.store();
    let mut versions = store.subscribe();
    let mut since = Timestamp::new(clock.now().as_secs().saturating_sub(1));
    for p in &store.proposals() {
        println!("{}", render::row(p, clock.now()));
    }

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            changed = versions.changed() => {
                if changed.is_err() {
                    break;
                }
                let version = *versions.borrow_and_update();
                let now = clock.now();
                let proposals = store.proposals();
                let updated = updated_since(&proposals, since);
                println!("version {version}: {} updated", updated.len());
                for p in updated {
                    println!("  {}", render::row(p, now));
                }
                since = now;
            }
        }
    }
    signal.abort();
}
