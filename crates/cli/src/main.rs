mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ProviderArgs, SiteArgs};
use output::OutputFormat;

/// Deploy static-site redirects and headers to edge key-value stores
#[derive(Parser)]
#[command(name = "hedgerules")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Sync both stores and deploy both edge functions
  Deploy {
    #[command(flatten)]
    site: SiteArgs,

    /// Parse and validate only, print the desired store contents
    #[arg(long)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Show what a deploy would change without writing
  Diff {
    #[command(flatten)]
    site: SiteArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },

  /// Manage key-value stores of the local edge provider
  Store {
    #[command(subcommand)]
    command: StoreCommands,
  },

  /// Print version
  Version,
}

#[derive(Subcommand)]
enum StoreCommands {
  /// Create an empty key-value store
  Create {
    /// Store name
    name: String,

    #[command(flatten)]
    provider: ProviderArgs,
  },

  /// List key-value stores
  List {
    #[command(flatten)]
    provider: ProviderArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Deploy { site, dry_run, output } => cmd::cmd_deploy(&site, dry_run, output),
    Commands::Diff { site, output } => cmd::cmd_diff(&site, output),
    Commands::Store { command } => match command {
      StoreCommands::Create { name, provider } => cmd::cmd_store_create(&name, &provider),
      StoreCommands::List { provider, output } => cmd::cmd_store_list(&provider, output),
    },
    Commands::Version => {
      cmd::cmd_version();
      Ok(())
    }
  }
}
