//! Stratus control CLI
//!
//! Thin client over the daemon's control socket: formats one request,
//! prints the daemon's response. All actual work happens in `stratusd`.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use stratus_core::Config;
use stratus_ipc::{client, Command};

#[derive(Parser)]
#[command(name = "stratus", version, about = "Control client for the stratus daemon")]
struct Cli {
    /// Control socket path (defaults to the configured one)
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Add a watch to a file or directory
    Add {
        path: PathBuf,
        /// Watch directories recursively
        #[arg(short, long)]
        recursive: bool,
    },
    /// Delete a watch from a file or directory
    Del { path: PathBuf },
    /// Show tracked local files or available remote files
    List {
        #[arg(value_enum)]
        scope: ListScope,
    },
    /// Download watched files into a target directory
    Download {
        target: PathBuf,
        /// A 64-character hash or an exact watched path
        selector: Option<String>,
    },
}

#[derive(ValueEnum, Clone)]
enum ListScope {
    Local,
    Remote,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Add { path, recursive } => Command::AddWatch { path, recursive },
            CliCommand::Del { path } => Command::DelWatch { path },
            CliCommand::List {
                scope: ListScope::Local,
            } => Command::ListLocal,
            CliCommand::List {
                scope: ListScope::Remote,
            } => Command::ListRemote,
            CliCommand::Download { target, selector } => Command::Download { target, selector },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let socket = cli.socket.unwrap_or_else(|| {
        Config::load_or_default(&Config::default_path())
            .control
            .socket_path
    });

    let response = client::send_request(&socket, &cli.command.into()).await?;
    println!("{response}");
    Ok(())
}
