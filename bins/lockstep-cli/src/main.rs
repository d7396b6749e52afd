//! lockstep — Command-line front end for a Lockstep escrow.
//!
//! Each invocation loads the snapshot from the data directory, runs one
//! operation atomically, persists, and prints the result as JSON.
//! Amounts are in base units; durations and timepoints are in seconds.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use lockstep_core::clock::{Clock, ManualClock, SystemClock};
use lockstep_core::types::{AccountId, PositionId};
use lockstep_ledger::Escrow;
use lockstep_node::{EscrowNode, NodeConfig};

/// Lockstep locked-position escrow.
#[derive(Parser)]
#[command(name = "lockstep")]
#[command(version, about = "Lock tokens, earn time-weighted voting power.")]
struct Cli {
    /// Config file (TOML). `LOCKSTEP_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overriding the configured one.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: "text" or "json".
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Run as if the clock read this unix timestamp.
    #[arg(long, global = true)]
    at: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Credit test funds to an account.
    Fund(FundArgs),
    /// Lock funds into a new position.
    Mint(MintArgs),
    /// Add funds to an existing position.
    TopUp(TopUpArgs),
    /// Split a position by shares.
    Split(SplitArgs),
    /// Fold one position into another.
    Merge(MergeArgs),
    /// Extend a position's commitment.
    Extend(ExtendArgs),
    /// Redeem an expired position.
    Burn(BurnArgs),
    /// Attribute an account's voting power to a delegatee.
    Delegate(DelegateArgs),
    /// Set or clear a position's controller.
    Approve(ApproveArgs),
    /// Grant or revoke an operator over all of an owner's positions.
    Operator(OperatorArgs),
    /// Transfer a position to another owner.
    Transfer(TransferArgs),
    /// Vesting coordinator subcommands.
    Vest {
        #[command(subcommand)]
        action: VestAction,
    },
    /// Show one position.
    Show(ShowArgs),
    /// Show an account's votes, now or at a past time.
    Votes(VotesArgs),
    /// Show total voting power and locked amount.
    Total(TotalArgs),
}

#[derive(Subcommand)]
enum VestAction {
    /// Park a position under a vesting schedule.
    Deposit(VestDepositArgs),
    /// Return a parked position with its unelapsed commitment.
    Withdraw(VestReleaseArgs),
    /// Burn a parked position after its schedule ended.
    Claim(VestReleaseArgs),
}

#[derive(Args)]
struct FundArgs {
    #[arg(long)]
    account: AccountId,
    #[arg(long)]
    amount: u128,
}

#[derive(Args)]
struct MintArgs {
    /// Payer of the locked funds.
    #[arg(long)]
    from: AccountId,
    /// Owner of the new position (default: the payer).
    #[arg(long)]
    owner: Option<AccountId>,
    #[arg(long)]
    amount: u128,
    /// Commitment in seconds.
    #[arg(long)]
    duration: u64,
}

#[derive(Args)]
struct TopUpArgs {
    #[arg(long)]
    from: AccountId,
    #[arg(long)]
    position: u64,
    #[arg(long)]
    amount: u128,
}

#[derive(Args)]
struct SplitArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    position: u64,
    /// Comma-separated shares, e.g. 5,3,2.
    #[arg(long, value_delimiter = ',', required = true)]
    shares: Vec<u128>,
}

#[derive(Args)]
struct MergeArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    source: u64,
    #[arg(long)]
    target: u64,
}

#[derive(Args)]
struct ExtendArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    position: u64,
    /// New remaining commitment in seconds.
    #[arg(long)]
    duration: u64,
}

#[derive(Args)]
struct BurnArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    position: u64,
    /// Payee (default: the caller).
    #[arg(long)]
    receiver: Option<AccountId>,
}

#[derive(Args)]
struct DelegateArgs {
    #[arg(long)]
    account: AccountId,
    #[arg(long)]
    to: AccountId,
}

#[derive(Args)]
struct ApproveArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    position: u64,
    /// New controller; omit to clear.
    #[arg(long)]
    controller: Option<AccountId>,
}

#[derive(Args)]
struct OperatorArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    operator: AccountId,
    #[arg(long)]
    revoke: bool,
}

#[derive(Args)]
struct TransferArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    to: AccountId,
    #[arg(long)]
    position: u64,
}

#[derive(Args)]
struct VestDepositArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    position: u64,
}

#[derive(Args)]
struct VestReleaseArgs {
    #[arg(long)]
    caller: AccountId,
    #[arg(long)]
    position: u64,
    /// Receiver (default: the caller).
    #[arg(long)]
    receiver: Option<AccountId>,
}

#[derive(Args)]
struct ShowArgs {
    #[arg(long)]
    position: u64,
}

#[derive(Args)]
struct VotesArgs {
    #[arg(long)]
    account: AccountId,
    /// Past timepoint to query instead of the current value.
    #[arg(long)]
    timepoint: Option<u64>,
}

#[derive(Args)]
struct TotalArgs {
    /// Past timepoint to query instead of the current value.
    #[arg(long)]
    timepoint: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = NodeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format.clone() {
        config.log_format = format;
    }
    init_logging(&config.log_level, &config.log_format);

    let clock: Arc<dyn Clock> = match cli.at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };
    let node = EscrowNode::open(&config, clock)
        .with_context(|| format!("Failed to open escrow at {}", config.data_dir.display()))?;

    let output = run(&node, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(node: &EscrowNode, command: Commands) -> Result<serde_json::Value> {
    let value = match command {
        Commands::Fund(args) => {
            node.fund(&args.account, args.amount).context("Fund failed")?;
            json!({ "account": args.account, "balance": node.balance_of(&args.account).to_string() })
        }
        Commands::Mint(args) => {
            let owner = args.owner.unwrap_or(args.from);
            let id = node
                .execute(|e| e.mint(&args.from, &owner, args.amount, args.duration))
                .context("Mint failed")?;
            position_json(node, id)
        }
        Commands::TopUp(args) => {
            let id = PositionId(args.position);
            node.execute(|e| e.top_up(&args.from, id, args.amount))
                .context("Top-up failed")?;
            position_json(node, id)
        }
        Commands::Split(args) => {
            let ids = node
                .execute(|e| e.split(&args.caller, PositionId(args.position), &args.shares))
                .context("Split failed")?;
            serde_json::Value::Array(ids.into_iter().map(|id| position_json(node, id)).collect())
        }
        Commands::Merge(args) => {
            let target = PositionId(args.target);
            node.execute(|e| e.merge(&args.caller, PositionId(args.source), target))
                .context("Merge failed")?;
            position_json(node, target)
        }
        Commands::Extend(args) => {
            let id = PositionId(args.position);
            node.execute(|e| e.update_commitment_duration(&args.caller, id, args.duration))
                .context("Extend failed")?;
            position_json(node, id)
        }
        Commands::Burn(args) => {
            let receiver = args.receiver.unwrap_or(args.caller);
            let paid = node
                .execute(|e| e.burn(&args.caller, &receiver, PositionId(args.position)))
                .context("Burn failed")?;
            json!({ "receiver": receiver, "paid": paid.to_string() })
        }
        Commands::Delegate(args) => {
            node.execute(|e| e.delegate(&args.account, &args.to))
                .context("Delegate failed")?;
            json!({ "account": args.account, "delegatee": args.to })
        }
        Commands::Approve(args) => {
            let id = PositionId(args.position);
            node.execute(|e| e.approve(&args.caller, id, args.controller))
                .context("Approve failed")?;
            json!({ "position": id, "controller": args.controller })
        }
        Commands::Operator(args) => {
            let approved = !args.revoke;
            node.execute(|e: &mut Escrow| {
                e.set_operator(&args.caller, &args.operator, approved);
                Ok(())
            })
            .context("Operator update failed")?;
            json!({ "owner": args.caller, "operator": args.operator, "approved": approved })
        }
        Commands::Transfer(args) => {
            let id = PositionId(args.position);
            node.execute(|e| e.transfer_position(&args.caller, &args.to, id))
                .context("Transfer failed")?;
            position_json(node, id)
        }
        Commands::Vest { action } => match action {
            VestAction::Deposit(args) => {
                let id = PositionId(args.position);
                node.execute(|e| e.deposit(&args.caller, id))
                    .context("Vesting deposit failed")?;
                position_json(node, id)
            }
            VestAction::Withdraw(args) => {
                let id = PositionId(args.position);
                let receiver = args.receiver.unwrap_or(args.caller);
                node.execute(|e| e.withdraw(&args.caller, &receiver, id))
                    .context("Vesting withdraw failed")?;
                position_json(node, id)
            }
            VestAction::Claim(args) => {
                let receiver = args.receiver.unwrap_or(args.caller);
                let paid = node
                    .execute(|e| e.claim(&args.caller, &receiver, PositionId(args.position)))
                    .context("Vesting claim failed")?;
                json!({ "receiver": receiver, "paid": paid.to_string() })
            }
        },
        Commands::Show(args) => position_json(node, PositionId(args.position)),
        Commands::Votes(args) => {
            let votes = match args.timepoint {
                Some(t) => node
                    .read(|e| e.ledger().past_votes(&args.account, t))
                    .context("Past votes query failed")?,
                None => node.read(|e| e.ledger().votes(&args.account)),
            };
            json!({
                "account": args.account,
                "delegatee": node.read(|e| e.ledger().delegates(&args.account)),
                "votes": votes.to_string(),
                "balance": node.balance_of(&args.account).to_string(),
            })
        }
        Commands::Total(args) => {
            let power = match args.timepoint {
                Some(t) => node
                    .read(|e| e.ledger().past_total_voting_power(t))
                    .context("Past total query failed")?,
                None => node.read(|e| e.ledger().total_voting_power()),
            };
            json!({
                "total_voting_power": power.to_string(),
                "total_locked": node.read(|e| e.ledger().total_locked()).to_string(),
                "custody": node.custody().to_string(),
            })
        }
    };
    Ok(value)
}

/// JSON view of a position, its current power, and any vesting record.
/// u128 values are rendered as strings.
fn position_json(node: &EscrowNode, id: PositionId) -> serde_json::Value {
    node.read(|e| {
        let ledger = e.ledger();
        match ledger.position(id) {
            Some(p) => json!({
                "id": p.id,
                "owner": p.owner,
                "locked_amount": p.locked_amount.to_string(),
                "remaining_duration": p.remaining_duration,
                "created_at": p.created_at,
                "voting_power": ledger.voting_power(id).map(|v| v.to_string()).ok(),
                "vesting": e.vesting_record(id).map(|r| json!({
                    "start": r.start,
                    "end": r.end,
                    "amount": r.amount.to_string(),
                    "custodian": r.custodian,
                })),
            }),
            None => json!({ "id": id, "live": false }),
        }
    })
}

/// Initialize the tracing subscriber with the given level and format.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
