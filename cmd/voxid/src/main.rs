//! voxid - classify speaker sex from six short voice recordings.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    ClassifyCommand, ConfigCommand, DatasetCommand, ExtractCommand, PromptsCommand, ScoreCommand,
    TrainCommand,
};

/// voxid - classify speaker sex from six short voice recordings.
///
/// Each recording answers one prompt (five sustained vowels, then counting
/// from 0 to 9) and is scored by that prompt's own model; the session
/// decision averages the six probabilities.
///
/// Configuration is stored in ~/.voxid/config.yaml.
#[derive(Parser)]
#[command(name = "voxid")]
#[command(about = "Voice-based sex classification")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.voxid/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config(ConfigCommand),
    /// Build per-prompt datasets from a labeled corpus
    Dataset(DatasetCommand),
    /// Train every prompt's model from its dataset
    Train(TrainCommand),
    /// Print the feature vector of one recording
    Extract(ExtractCommand),
    /// Score one recording against one prompt's model
    Score(ScoreCommand),
    /// Classify a full session of recordings
    Classify(ClassifyCommand),
    /// List the prompts in stage order
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG takes precedence over -v.
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Dataset(cmd) => cmd.run(&cli).await,
        Commands::Train(cmd) => cmd.run(&cli).await,
        Commands::Extract(cmd) => cmd.run(&cli).await,
        Commands::Score(cmd) => cmd.run(&cli).await,
        Commands::Classify(cmd) => cmd.run(&cli).await,
        Commands::Prompts(cmd) => cmd.run(&cli).await,
    }
}
