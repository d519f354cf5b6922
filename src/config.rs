//! Configuration
//!
//! Read from `.lintpost.toml` in the repository root when present;
//! everything has a sensible default and CLI flags override the file.

use crate::engine::CleanupMode;
use crate::router::{OverflowPolicy, ANNOTATION_BATCH_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = ".lintpost.toml";

/// Which surface a report lands on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Per-line review comments on the diff.
    #[default]
    Review,
    /// One summary comment on the PR conversation.
    Summary,
    /// Check-run annotations.
    Checks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scopes every comment this tool tracks. Run two tools against one PR
    /// by giving each its own identifier.
    pub identifier: String,
    pub channel: Channel,
    /// Where out-of-range and over-limit items go.
    pub overflow: OverflowPolicy,
    pub cleanup_mode: CleanupMode,
    /// Hard per-call item limit for the primary channel.
    pub batch_limit: usize,
    /// Override for GitHub Enterprise installs.
    pub api_base: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identifier: "lintpost".to_string(),
            channel: Channel::default(),
            overflow: OverflowPolicy::default(),
            cleanup_mode: CleanupMode::default(),
            batch_limit: ANNOTATION_BATCH_LIMIT,
            api_base: None,
        }
    }
}

impl Config {
    /// Load config from the repo root, or return defaults. A corrupt file
    /// warns and falls back rather than failing the run.
    pub fn load(repo_root: &Path) -> Self {
        let path = repo_root.join(CONFIG_FILE);
        if let Ok(content) = fs::read_to_string(&path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(err) => {
                    eprintln!(
                        "  Warning: {} is invalid ({}). Using defaults.",
                        path.display(),
                        err
                    );
                }
            }
        }
        Self::default()
    }
}
