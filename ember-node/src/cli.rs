use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use ember_crypto::account::Account;
use ember_types::account::validate_account_id;
use ember_types::constants::NATIVE_TOKEN;
use ember_types::primitives::{Algorithm, Timestamp};
use ember_types::transaction::{Action, Transaction};
use ember_vm::executor::Executor;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::store::open_store;

#[derive(Parser)]
#[command(name = "ember", about = "Ember gas engine node", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "ember.toml")]
    pub config: String,
    /// Log level when RUST_LOG is unset (overrides the config file)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new node configuration
    Init {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        dir: String,
    },
    /// Generate a new account key and write its account file
    Keygen {
        /// Account name (5-11 characters of a-z, 0-9, _)
        #[arg(long)]
        id: String,
        /// Signing algorithm: "ed25519" or "secp256k1"
        #[arg(short, long, default_value = "ed25519")]
        algorithm: Algorithm,
        /// Where to write the account JSON; printed to stdout if omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Seed the configured genesis accounts into the state store
    Genesis,
    /// Build, sign and execute a single-action transaction
    Exec {
        /// Account file of the publisher
        #[arg(long)]
        account: String,
        /// Additional signer account files (repeatable)
        #[arg(long = "sign")]
        signers: Vec<String>,
        /// Target contract, e.g. "gas.ember"
        #[arg(long)]
        contract: String,
        /// Operation name, e.g. "PledgeGas"
        #[arg(long)]
        action: String,
        /// JSON array of positional arguments
        #[arg(long, default_value = "[]")]
        args: String,
        /// Most gas the transaction may consume
        #[arg(long, default_value_t = 10_000)]
        gas_limit: i64,
    },
    /// Show an account's refreshed gas entry
    GasInfo {
        account: String,
    },
    /// Show an account's spendable and frozen token balance
    Balance {
        account: String,
        #[arg(long, default_value = NATIVE_TOKEN)]
        token: String,
    },
}

pub fn run(cli: Cli) -> Result<(), NodeError> {
    match cli.command {
        Command::Init { dir } => {
            NodeConfig::init(&dir)?;
            tracing::info!("Node configuration initialized in {}", dir);
            Ok(())
        }
        Command::Keygen {
            id,
            algorithm,
            output,
        } => {
            validate_account_id(&id)?;
            let account = Account::generate(id, algorithm);
            let json = account.to_json()?;
            println!("Account: {}", account.id);
            println!("Algorithm: {}", account.algorithm());
            println!("Public key: {}", hex::encode(account.public_key()?));
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    tracing::info!("Account file written to {}", path);
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Genesis => {
            let config = NodeConfig::load(&cli.config)?;
            let store = open_store(&config.storage)?;
            let created = crate::genesis::apply_genesis(&store, &config.genesis)?;
            println!("Genesis applied: {created} account(s)");
            Ok(())
        }
        Command::Exec {
            account,
            signers,
            contract,
            action,
            args,
            gas_limit,
        } => {
            let config = NodeConfig::load(&cli.config)?;
            let publisher = load_account(&account)?;
            let now = now_nanos()?;

            let mut tx = Transaction::new(
                publisher.id.clone(),
                vec![Action::new(contract, action, args)],
                now,
                gas_limit,
            );
            tx = publisher.sign(&tx)?;
            for path in &signers {
                tx = load_account(path)?.sign(&tx)?;
            }

            let executor = Executor::new(open_store(&config.storage)?);
            let receipt = executor.execute(&tx, now)?;
            if !receipt.is_success() {
                tracing::warn!(tx = %hex::encode(receipt.tx_hash), "transaction failed");
            }
            println!("{}", to_json(&receipt)?);
            Ok(())
        }
        Command::GasInfo { account } => {
            let config = NodeConfig::load(&cli.config)?;
            let executor = Executor::new(open_store(&config.storage)?);
            let info = executor.gas_info(&account, now_nanos()?)?;
            println!("{}", to_json(&info)?);
            Ok(())
        }
        Command::Balance { account, token } => {
            let config = NodeConfig::load(&cli.config)?;
            let executor = Executor::new(open_store(&config.storage)?);
            let now = now_nanos()?;
            println!("Balance: {} {}", executor.balance(&token, &account, now)?, token);
            println!("Frozen: {} {}", executor.frozen_balance(&token, &account, now)?, token);
            Ok(())
        }
    }
}

/// Read an account file written by `keygen`.
pub fn load_account(path: &str) -> Result<Account, NodeError> {
    let json = std::fs::read_to_string(path).map_err(|e| NodeError::AccountError {
        reason: format!("failed to read '{}': {}", path, e),
    })?;
    Account::from_json(&json).map_err(|e| NodeError::AccountError {
        reason: format!("failed to parse '{}': {}", path, e),
    })
}

fn now_nanos() -> Result<Timestamp, NodeError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| NodeError::ConfigError {
            reason: format!("system clock is before the unix epoch: {e}"),
        })?;
    Timestamp::try_from(elapsed.as_nanos()).map_err(|_| NodeError::ConfigError {
        reason: "system clock out of range".to_string(),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, NodeError> {
    serde_json::to_string_pretty(value).map_err(|e| NodeError::ConfigError {
        reason: format!("failed to encode output: {e}"),
    })
}
