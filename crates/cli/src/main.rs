mod cmd;
mod logging;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};

use output::OutputFormat;
use settings::Settings;

/// Render configuration files from a live stack topology
#[derive(Parser)]
#[command(name = "stacktmpl")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  settings: Settings,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Watch the topology and re-render on every change (default)
  Run,

  /// Fetch one snapshot, render every template once and exit
  Once {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Load the render specs and list them without contacting the provider
  Check {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  let command = cli.command.unwrap_or(Commands::Run);
  let json = matches!(
    command,
    Commands::Once {
      output: OutputFormat::Json
    } | Commands::Check {
      output: OutputFormat::Json
    }
  );
  let _log_guard = logging::init(cli.settings.debug, cli.settings.logfile.as_deref(), json)?;

  match command {
    Commands::Run => cmd::cmd_run(&cli.settings),
    Commands::Once { output } => cmd::cmd_once(&cli.settings, output),
    Commands::Check { output } => cmd::cmd_check(&cli.settings, output),
  }
}
