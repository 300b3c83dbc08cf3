// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cold Storage Node
//!
//! Entry point for the `cold-storage-node` binary. Parses CLI arguments,
//! initializes logging, opens the vault store and runs one subcommand:
//!
//! - `init`   : create the data directory and bind the store's domain tag
//! - `apply`  : run a transaction script, printing one outcome per line
//! - `balance`: print a vault's balance and sequence number
//! - `message`: print the canonical message for a transfer, hex-encoded,
//!   and sign it when a secret key is given
//! - `version`: print build version information

mod cli;
mod logging;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use cold_storage_contracts::{ColdStorage, TransactionOutcome};
use cold_storage_protocol::config::EngineConfig;
use cold_storage_protocol::crypto::VaultKeypair;
use cold_storage_protocol::storage::VaultDb;
use cold_storage_protocol::vault::{AccountId, Amount, TransferIntent, VaultEngine};

use cli::{ColdStorageCli, Commands};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = ColdStorageCli::parse();
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Init(args) => init_store(args),
        Commands::Apply(args) => apply_script(args),
        Commands::Balance(args) => print_balance(args),
        Commands::Message(args) => print_message(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens the store under `args.data_dir`, bound to the configured domain.
fn open_store(args: &cli::StoreArgs) -> Result<(VaultDb, EngineConfig)> {
    let config = script::load_engine_config(args.config.as_deref())?;
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let db = VaultDb::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.bind_domain(&config.domain_tag).with_context(|| {
        format!(
            "failed to bind store at {} to domain {}",
            db_path.display(),
            config.domain_tag
        )
    })?;
    tracing::info!(
        path = %db_path.display(),
        vaults = db.vault_count(),
        domain = %config.domain_tag,
        "vault store opened"
    );
    Ok((db, config))
}

/// Opens the store and loads every vault into a fresh engine.
fn open_engine(args: &cli::StoreArgs) -> Result<VaultEngine> {
    let (db, config) = open_store(args)?;
    VaultEngine::with_store(config, db).with_context(|| {
        format!("failed to load vaults from {}", args.data_dir.display())
    })
}

/// Creates the data directory and binds its store to the configured domain.
fn init_store(args: cli::StoreArgs) -> Result<()> {
    let engine = open_engine(&args)?;

    println!("Store initialized.");
    println!("  Data directory : {}", args.data_dir.display());
    println!("  Domain tag     : {}", engine.domain_tag());
    println!("  Vaults         : {}", engine.vault_count());
    Ok(())
}

/// Runs every step of a script through the contract, printing each outcome
/// as a JSON line.
fn apply_script(args: cli::ApplyArgs) -> Result<()> {
    let steps = script::load_script(&args.script)?;
    let contract = ColdStorage::new(open_engine(&args.store)?);

    let (mut executed, mut reverted) = (0usize, 0usize);
    for (index, step) in steps.into_iter().enumerate() {
        let outcome = contract.submit(step.into_transaction());
        println!(
            "{}",
            serde_json::to_string(&outcome).context("failed to encode outcome")?
        );
        match outcome {
            TransactionOutcome::Executed { .. } => executed += 1,
            TransactionOutcome::Reverted { .. } => {
                reverted += 1;
                if args.stop_on_revert {
                    tracing::warn!(step = index, "stopping at reverted step");
                    break;
                }
            }
        }
    }

    contract.engine().flush().context("failed to flush vault store")?;
    tracing::info!(executed, reverted, "script applied");
    Ok(())
}

/// Reads one vault record straight from the store.
fn print_balance(args: cli::BalanceArgs) -> Result<()> {
    let owner: AccountId = args
        .account
        .parse()
        .with_context(|| format!("invalid account id: {}", args.account))?;
    let (db, _config) = open_store(&args.store)?;
    let vault = db
        .get_vault(&owner)
        .with_context(|| format!("failed to read vault {owner}"))?
        .with_context(|| format!("no vault for {owner}"))?;

    println!(
        "{}",
        json!({
            "owner": vault.owner(),
            "balance": vault.balance(),
            "sequence_number": vault.sequence_number(),
        })
    );
    Ok(())
}

fn print_message(args: cli::MessageArgs) -> Result<()> {
    let config = script::load_engine_config(args.config.as_deref())?;
    let intent = TransferIntent {
        sender: args
            .sender
            .parse()
            .with_context(|| format!("invalid sender: {}", args.sender))?,
        recipient: args
            .recipient
            .parse()
            .with_context(|| format!("invalid recipient: {}", args.recipient))?,
        amount: args
            .amount
            .parse::<Amount>()
            .with_context(|| format!("invalid amount: {}", args.amount))?,
        sequence_number: args.sequence_number,
    };
    let engine = VaultEngine::new(config);
    let message = engine.canonical_message(&intent);

    let signature = match &args.secret_key {
        Some(secret) => {
            let keypair = VaultKeypair::from_secret_hex(args.signing_algorithm, secret)
                .context("invalid --secret-key")?;
            let signature = engine
                .sign_intent(&keypair, &intent, args.hash)
                .context("failed to sign transfer")?;
            Some(json!({
                "public_key": keypair.public_key(),
                "signature": signature,
            }))
        }
        None => None,
    };

    println!(
        "{}",
        json!({
            "domain_tag": engine.domain_tag(),
            "intent": intent,
            "message": message.to_hex(),
            "signed": signature,
        })
    );
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("cold-storage-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol          {}", cold_storage_protocol::config::PROTOCOL_VERSION);
    println!("signing           {}", cold_storage_protocol::config::SIGNING_ALGORITHMS);
}
