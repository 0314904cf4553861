//! # ferry
//!
//! **ferry** publishes local projects to a hosting account and fetches them
//! back as ready-to-run working copies.
//!
//! - `ferry upload <path> <repo> -m <msg>` stages, commits and pushes a project
//! - `ferry download <repo> [path]` clones or updates a project, installs
//!   dependencies and drops in the helper script
//! - `ferry sync` downloads every project listed in `config.toml`
//! - `ferry repos` / `ferry create` talk to the hosting account

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use ferry::{
    cmd_create, cmd_download, cmd_repos, cmd_resolve, cmd_status, cmd_sync, cmd_upload,
    ferry_home,
};

#[derive(Parser, Debug)]
#[command(
    name = "ferry",
    version,
    about = "ferry - publish and fetch project working copies",
    arg_required_else_help = true
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Stage, commit and push a project directory
    Upload {
        path: PathBuf,
        /// Repository URL, `account/repo` or a repo name under the configured account
        repo: String,
        #[arg(short, long)]
        message: String,
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Clone or update a project and prepare it for use
    Download {
        repo: String,
        path: Option<PathBuf>,
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Download every project listed in config.toml
    Sync,
    /// Show the working copy state of a directory
    Status { path: PathBuf },
    /// Print the canonical remote URL for a reference
    Resolve { reference: String },
    /// List repositories of the configured account
    Repos,
    /// Create a repository under the configured account
    Create {
        name: String,
        #[arg(long)]
        private: bool,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Print the ferry home directory
    Home,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cmd = cli.cmd.unwrap();

    match cmd {
        Cmd::Upload {
            path,
            repo,
            message,
            branch,
        } => cmd_upload(&path, &repo, &message, branch.as_deref()),
        Cmd::Download { repo, path, branch } => {
            cmd_download(&repo, path.as_deref(), branch.as_deref())
        }
        Cmd::Sync => cmd_sync(),
        Cmd::Status { path } => cmd_status(&path),
        Cmd::Resolve { reference } => cmd_resolve(&reference),
        Cmd::Repos => cmd_repos(),
        Cmd::Create {
            name,
            private,
            description,
        } => cmd_create(&name, private, description.as_deref()),
        Cmd::Home => {
            println!("{}", ferry_home()?.display());
            Ok(())
        }
    }
}
