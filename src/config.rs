use anyhow::{Context, Result};
use std::env;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands, ConflictPolicy};
use crate::paths::{confined_join, normalize};

pub const ROOT_ENV: &str = "PLUGIN_SORTER_ROOT";
pub const REPOSITORY_DIR: &str = "plugins";
pub const STAGING_DIR: &str = "unsorted";

/// Resolved paths and knobs for one run. Every component receives what it
/// needs from here; nothing reads global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    pub repository_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub report_dir: PathBuf,
    pub workers: usize,
    pub conflict_policy: ConflictPolicy,
}

impl Config {
    pub fn new(root: &Path) -> Result<Self> {
        let root = normalize(
            &std::path::absolute(root)
                .with_context(|| format!("Failed to resolve root: {}", root.display()))?,
        );
        let repository_dir = confined_join(&root, &[REPOSITORY_DIR])?;
        Ok(Self {
            report_dir: repository_dir.clone(),
            repository_dir,
            staging_dir: confined_join(&root, &[STAGING_DIR])?,
            root,
            workers: default_workers(),
            conflict_policy: ConflictPolicy::Prompt,
        })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Self::new(&resolve_root(cli)?)?;
        match &cli.command {
            Commands::Sort {
                folder,
                on_conflict,
            } => {
                if let Some(folder) = folder {
                    config = config.with_staging_folder(folder)?;
                }
                config.conflict_policy = *on_conflict;
            }
            Commands::Report { path, workers, .. } => {
                if let Some(path) = path {
                    config.report_dir = confined_join(&config.root, &[path.to_string_lossy().as_ref()])?;
                }
                if let Some(n) = workers {
                    config = config.with_workers(*n);
                }
            }
        }
        Ok(config)
    }

    /// Staging folder relative to the root; refused if it leaves the root.
    pub fn with_staging_folder(mut self, folder: &str) -> Result<Self> {
        self.staging_dir = confined_join(&self.root, &[folder])?;
        Ok(self)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

pub fn resolve_root(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.root.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var(ROOT_ENV) {
        return Ok(PathBuf::from(p));
    }

    env::current_dir().context("Failed to resolve current directory")
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
