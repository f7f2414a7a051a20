use std::path::{Path, PathBuf};

use alloy_primitives::{Address, B256};
use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use vault_core::{
    authorization::{sign_withdraw, SignatureParts},
    units::{describe, parse_amount},
    Amount,
};
use withdraw_ledger::{Call, Environment, Transaction};

mod keys;
mod store;

#[derive(Parser)]
#[command(name = "vault", version, about = "Signature-authorised withdraw vault")]
struct Cli {
    /// JSON state file holding accounts, the ledger and receipts.
    #[arg(long, global = true, env = "VAULT_STATE", default_value = "vault-state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a fresh environment with genesis balances.
    Init {
        /// Genesis allocation as ADDRESS=AMOUNT; repeatable.
        #[arg(long = "alloc", value_parser = parse_alloc, required = true)]
        allocations: Vec<(Address, Amount)>,
        #[arg(long)]
        force: bool,
    },
    /// Deploy the ledger, funding it with --value from --from.
    Deploy {
        #[arg(long)]
        from: Address,
        #[arg(long, value_parser = parse_amount)]
        value: Amount,
    },
    /// Funds held by the ledger.
    Balance,
    /// Current replay-protection nonce.
    Nonce,
    /// Address that deployed the ledger.
    Owner,
    /// Remaining withdraw allowance of --spender.
    Allowance {
        #[arg(long)]
        spender: Address,
    },
    /// Balance of an externally owned account.
    Account {
        #[arg(long)]
        address: Address,
    },
    /// Owner sets the allowance of --spender.
    AddSpender {
        #[arg(long)]
        from: Address,
        #[arg(long)]
        spender: Address,
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
    },
    /// Owner sends --value into the ledger.
    Deposit {
        #[arg(long)]
        from: Address,
        #[arg(long, value_parser = parse_amount)]
        value: Amount,
    },
    /// Sign a withdraw authorisation off-chain and print (v, r, s).
    #[command(group(ArgGroup::new("secret").required(true).args(["key", "key_file"])))]
    SignWithdraw {
        /// Secret key as hex.
        #[arg(long, env = "VAULT_SIGNING_KEY", hide_env_values = true)]
        key: Option<String>,
        /// File containing the secret key as hex (see `keygen`).
        #[arg(long)]
        key_file: Option<PathBuf>,
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
        /// Defaults to the ledger's current nonce read from the state file.
        #[arg(long)]
        nonce: Option<u64>,
    },
    /// Spender submits a signed withdrawal.
    Withdraw {
        #[arg(long)]
        from: Address,
        #[arg(long, value_parser = parse_amount)]
        amount: Amount,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        v: u8,
        #[arg(long)]
        r: B256,
        #[arg(long)]
        s: B256,
    },
    /// Print every applied transaction.
    Receipts,
    /// Generate a secp256k1 keypair into --out-dir.
    Keygen {
        #[arg(long)]
        out_dir: PathBuf,
    },
}

fn parse_alloc(raw: &str) -> Result<(Address, Amount), String> {
    let (address, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=AMOUNT, got {raw:?}"))?;
    let address = address
        .trim()
        .parse::<Address>()
        .map_err(|err| format!("invalid address {address:?}: {err}"))?;
    let amount = parse_amount(amount).map_err(|err| err.to_string())?;
    Ok((address, amount))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn transact(path: &Path, tx: Transaction) -> Result<()> {
    let mut env = store::load(path)?;
    let call = tx.call.name();
    let receipt = env
        .execute(tx)
        .with_context(|| format!("{call} reverted"))?;
    let root = store::save(path, &env)?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    tracing::debug!(%root, "state root");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let path = cli.state.as_path();
    match cli.command {
        Command::Init { allocations, force } => {
            let env = Environment::genesis(allocations).context("genesis allocations overflow")?;
            let root = store::create(path, &env, force)?;
            println!("initialised {} (root {root})", path.display());
        }
        Command::Deploy { from, value } => {
            transact(path, Transaction::new(from, Call::Deploy).with_value(value))?
        }
        Command::Balance => println!("{}", describe(store::load(path)?.ledger()?.balance())),
        Command::Nonce => println!("{}", store::load(path)?.ledger()?.nonce()),
        Command::Owner => println!("{}", store::load(path)?.ledger()?.owner()),
        Command::Allowance { spender } => {
            println!("{}", describe(store::load(path)?.ledger()?.allowance(&spender)))
        }
        Command::Account { address } => {
            println!("{}", describe(store::load(path)?.account_balance(&address)))
        }
        Command::AddSpender {
            from,
            spender,
            amount,
        } => transact(path, Transaction::new(from, Call::AddSpender { spender, amount }))?,
        Command::Deposit { from, value } => {
            transact(path, Transaction::new(from, Call::Deposit).with_value(value))?
        }
        Command::SignWithdraw {
            key,
            key_file,
            amount,
            nonce,
        } => {
            let signer = match (key, key_file) {
                (Some(hex), _) => keys::parse_secret_hex(&hex)?,
                (None, Some(file)) => keys::read_secret_file(&file)?,
                (None, None) => bail!("either --key or --key-file is required"),
            };
            let nonce = match nonce {
                Some(nonce) => nonce,
                None => store::load(path)
                    .context("no --nonce given and the ledger nonce could not be read")?
                    .ledger()?
                    .nonce(),
            };
            let SignatureParts { v, r, s } = sign_withdraw(&signer, amount, nonce)?;
            let out = json!({
                "address": signer.address(),
                "amount": amount.to_string(),
                "nonce": nonce,
                "v": v,
                "r": r,
                "s": s,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Withdraw {
            from,
            amount,
            nonce,
            v,
            r,
            s,
        } => {
            let signature = SignatureParts { v, r, s };
            transact(
                path,
                Transaction::new(
                    from,
                    Call::Withdraw {
                        amount,
                        nonce,
                        signature,
                    },
                ),
            )?
        }
        Command::Receipts => {
            let env = store::load(path)?;
            println!("{}", serde_json::to_string_pretty(env.receipts())?);
        }
        Command::Keygen { out_dir } => {
            let signer = keys::generate();
            keys::write_keypair(&out_dir, &signer)?;
            println!("{} → {}", signer.address(), out_dir.display());
        }
    }
    Ok(())
}

fn main() {
    init_tracing();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
