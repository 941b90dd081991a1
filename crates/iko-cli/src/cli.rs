use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "iko",
    about = "Kittycash initial coin offering ledger node",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a ledger node until Ctrl-C
    Run(RunArgs),
    /// Generate a key pair
    Keygen,
    /// Print the default node configuration as TOML
    Config,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Public key to trust as master decision maker
    #[arg(long = "master-public-key", visible_alias = "pk")]
    pub master_public_key: Option<String>,

    /// Keep the chain in memory only
    #[arg(short, long)]
    pub memory: bool,

    /// Inject generated genesis transactions on startup
    #[arg(short, long)]
    pub test: bool,

    /// Only valid in test mode, signs the injected transactions
    #[arg(long = "test-secret-key", visible_alias = "sk")]
    pub test_secret_key: Option<String>,

    /// Only valid in test mode, number of genesis transactions to inject
    #[arg(long = "test-injection-count", visible_alias = "tc")]
    pub test_injection_count: Option<u64>,

    /// Transactions buffered per feed subscriber
    #[arg(long)]
    pub feed_capacity: Option<usize>,
}
