use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::placer::{ConflictResolver, Placement, PlacementKind, RepositoryPlacer, ensure_dir};
use crate::record::PluginRecord;
use crate::scan::staged_jars;

#[derive(Debug, Serialize)]
pub struct SortFailure {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SortSummary {
    pub placed: usize,
    pub already_present: usize,
    pub overwritten: usize,
    pub skipped: usize,
    pub failures: Vec<SortFailure>,
}

impl SortSummary {
    fn record(&mut self, placement: &Placement) {
        match placement.kind {
            PlacementKind::Placed => self.placed += 1,
            PlacementKind::AlreadyPresent => self.already_present += 1,
            PlacementKind::Overwritten => self.overwritten += 1,
            PlacementKind::Skipped => self.skipped += 1,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sorts the staging folder into the repository, one jar at a time.
pub struct Sorter {
    config: Config,
    placer: RepositoryPlacer,
}

impl Sorter {
    pub fn new(config: Config) -> Self {
        let placer = RepositoryPlacer::new(config.repository_dir.clone());
        Self { config, placer }
    }

    /// Failures on one jar leave it staged and move on to the next; a path
    /// traversal aborts the whole run.
    pub fn run(&self, resolver: &mut dyn ConflictResolver) -> Result<SortSummary> {
        ensure_dir(&self.config.staging_dir)?;
        ensure_dir(&self.config.repository_dir)?;

        let mut summary = SortSummary::default();
        for jar in staged_jars(&self.config.staging_dir)? {
            match self.sort_one(&jar, resolver) {
                Ok(placement) => summary.record(&placement),
                Err(e) if e.is_fatal() => {
                    error!("Aborting sort at ({}): {e}", jar.display());
                    return Err(e);
                }
                Err(e) => {
                    error!("Could not sort ({}): {e}", jar.display());
                    summary.failures.push(SortFailure {
                        path: jar,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            placed = summary.placed,
            already_present = summary.already_present,
            overwritten = summary.overwritten,
            skipped = summary.skipped,
            failed = summary.failures.len(),
            "Sort finished"
        );
        Ok(summary)
    }

    pub fn sort_one(
        &self,
        jar: &Path,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<Placement> {
        let record = PluginRecord::open(jar)?;
        self.placer.place(&record, resolver)
    }
}
