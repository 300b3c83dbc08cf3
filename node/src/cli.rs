//! # CLI Interface
//!
//! Defines the command-line argument structure for `cold-storage-node`
//! using `clap` derive. Supports five subcommands: `init`, `apply`,
//! `balance`, `message`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use cold_storage_protocol::crypto::{HashAlgorithm, SigningAlgorithm};

/// Cold storage vault node.
///
/// Keeps dual-key custody vaults in a local store and applies transaction
/// scripts to them. Outcomes are printed to stdout as JSON lines; logs go
/// to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "cold-storage-node",
    about = "Dual-key cold storage vault node",
    version,
    propagate_version = true
)]
pub struct ColdStorageCli {
    /// Log output format: "pretty" or "json".
    #[arg(
        long,
        global = true,
        env = "COLD_STORAGE_LOG_FORMAT",
        default_value = "pretty"
    )]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and bind its store to the configured
    /// domain tag.
    Init(StoreArgs),
    /// Apply a JSON transaction script to the store.
    Apply(ApplyArgs),
    /// Print a vault's balance and sequence number.
    Balance(BalanceArgs),
    /// Print the canonical message signers must sign for a transfer, and
    /// optionally sign it.
    Message(MessageArgs),
    /// Print version information and exit.
    Version,
}

/// Where the vault store lives and how the engine is configured.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to the data directory holding the vault store.
    #[arg(
        long,
        short = 'd',
        env = "COLD_STORAGE_DATA_DIR",
        default_value = "./cold-storage-data"
    )]
    pub data_dir: PathBuf,

    /// Path to the engine configuration file (JSON).
    ///
    /// When omitted, the default user domain tag is used.
    #[arg(long, short = 'c', env = "COLD_STORAGE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `apply` subcommand.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Path to the transaction script (JSON array of steps).
    pub script: PathBuf,

    /// Stop at the first reverted transaction instead of continuing.
    #[arg(long)]
    pub stop_on_revert: bool,
}

/// Arguments for the `balance` subcommand.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Vault owner, as hex (`0x` prefix optional).
    pub account: String,
}

/// Arguments for the `message` subcommand.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Sending vault, as hex.
    #[arg(long)]
    pub sender: String,

    /// Receiving vault, as hex.
    #[arg(long)]
    pub recipient: String,

    /// Amount as a decimal string with up to 8 fractional digits.
    #[arg(long)]
    pub amount: String,

    /// The sender's current sequence number.
    #[arg(long)]
    pub sequence_number: u64,

    /// Path to the engine configuration file (JSON); supplies the domain tag
    /// and the default prehash.
    #[arg(long, short = 'c', env = "COLD_STORAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Hex secret key to sign the message with.
    #[arg(long, env = "COLD_STORAGE_SIGNING_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Scheme of `--secret-key`: ED25519 or ECDSA_P256.
    #[arg(long, default_value = "ED25519")]
    pub signing_algorithm: SigningAlgorithm,

    /// Prehash for the signature: SHA2_256, SHA3_256 or BLAKE3. Falls back
    /// to the configured default.
    #[arg(long)]
    pub hash: Option<HashAlgorithm>,
}
