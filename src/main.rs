use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lintpost::config::{Channel, Config};
use lintpost::engine::CleanupMode;
use lintpost::feedback;
use lintpost::github::{self, GithubClient};
use lintpost::reporter::Reporter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lintpost",
    about = "Idempotent lint and build feedback for GitHub pull requests",
    version
)]
struct Args {
    /// Repository as owner/name (discovered from the git remote when omitted)
    #[arg(long)]
    repo: Option<String>,

    /// Path to the local checkout (for remote discovery and config)
    #[arg(long, default_value = ".")]
    path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Post feedback items onto a pull request
    Report {
        /// Pull request number
        #[arg(long)]
        pr: u64,

        /// JSON file containing the feedback items to post
        #[arg(long)]
        input: PathBuf,

        /// Override the configured channel
        #[arg(long)]
        channel: Option<Channel>,

        /// Override the configured identifier
        #[arg(long)]
        identifier: Option<String>,
    },
    /// Remove or strike through comments posted by previous runs
    Cleanup {
        /// Pull request number
        #[arg(long)]
        pr: u64,

        /// Override the configured identifier
        #[arg(long)]
        identifier: Option<String>,

        /// Override the configured cleanup mode
        #[arg(long)]
        mode: Option<CleanupModeArg>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CleanupModeArg {
    Normal,
    KeepHistory,
    Replace,
}

impl From<CleanupModeArg> for CleanupMode {
    fn from(arg: CleanupModeArg) -> Self {
        match arg {
            CleanupModeArg::Normal => CleanupMode::Normal,
            CleanupModeArg::KeepHistory => CleanupMode::KeepHistory,
            CleanupModeArg::Replace => CleanupMode::Replace,
        }
    }
}

fn resolve_repo(args: &Args) -> Result<(String, String)> {
    if let Some(value) = &args.repo {
        let (owner, name) = value
            .split_once('/')
            .context("--repo must be owner/name")?;
        if owner.is_empty() || name.is_empty() {
            anyhow::bail!("--repo must be owner/name");
        }
        return Ok((owner.to_string(), name.to_string()));
    }
    github::get_remote_info(&args.path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (owner, repo) = resolve_repo(&args)?;
    let mut config = Config::load(&args.path);

    match args.command {
        Command::Report {
            pr,
            input,
            channel,
            identifier,
        } => {
            if let Some(channel) = channel {
                config.channel = channel;
            }
            if let Some(identifier) = identifier {
                config.identifier = identifier;
            }

            let items = feedback::load_items(&input)?;
            eprintln!(
                "Posting {} feedback item(s) to {}/{}#{} as '{}'...",
                items.len(),
                owner,
                repo,
                pr,
                config.identifier
            );

            let client = GithubClient::new(&owner, &repo, config.api_base.as_deref())?;
            Reporter::new(&client, &config, pr).report(&items).await?;
            eprintln!("Done.");
        }
        Command::Cleanup {
            pr,
            identifier,
            mode,
        } => {
            if let Some(identifier) = identifier {
                config.identifier = identifier;
            }
            if let Some(mode) = mode {
                config.cleanup_mode = mode.into();
            }

            eprintln!(
                "Cleaning up '{}' comments on {}/{}#{}...",
                config.identifier, owner, repo, pr
            );

            let client = GithubClient::new(&owner, &repo, config.api_base.as_deref())?;
            Reporter::new(&client, &config, pr).cleanup().await?;
            eprintln!("Done.");
        }
    }

    Ok(())
}
