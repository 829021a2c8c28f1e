//! Repository-wide report: which server versions each jar's bytecode targets.
//!
//! Jars are discovered with a parallel directory walk and then inspected on a
//! dedicated rayon pool. Each task opens its own archive, builds a
//! [`PluginRecord`] and sends exactly one [`ReportEntry`] back over a channel,
//! so a bad jar yields an error entry instead of stopping the scan. Paths the
//! walk could not read come first, also as error entries; the rest arrive in
//! completion order.

use rayon::ThreadPool;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use tracing::{debug, warn};

use crate::error::{PluginError, Result};
use crate::record::PluginRecord;
use crate::scan::scan_jars;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub name: String,
    pub version: String,
    pub nms_versions: BTreeSet<String>,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.nms_versions.iter().map(String::as_str).collect();
        write!(
            f,
            "{} v{} requires platform versions: {}",
            self.name,
            self.version,
            tokens.join(", ")
        )
    }
}

#[derive(Debug)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub outcome: Result<ReportLine>,
}

impl ReportEntry {
    pub fn to_json(&self) -> serde_json::Value {
        match &self.outcome {
            Ok(line) => serde_json::json!({
                "path": self.path,
                "name": line.name,
                "version": line.version,
                "nms_versions": line.nms_versions,
            }),
            Err(e) => serde_json::json!({
                "path": self.path,
                "error": e.kind(),
                "message": e.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(line) => fmt::Display::fmt(line, f),
            Err(e) => write!(f, "{}: failed ({}): {e}", self.path.display(), e.kind()),
        }
    }
}

/// Pure per-archive step: open, read the manifest, scan classes, close.
pub fn inspect(path: &Path) -> Result<ReportLine> {
    let mut record = PluginRecord::inspect(path)?;
    let nms_versions = record.nms_versions()?.clone();
    Ok(ReportLine {
        name: record.manifest.name,
        version: record.manifest.version,
        nms_versions,
    })
}

/// Lazily yields one entry per discovered jar. The pool lives as long as the
/// stream, so dropping it early just discards unread results.
pub struct ReportStream {
    pending: VecDeque<ReportEntry>,
    rx: Receiver<ReportEntry>,
    expected: usize,
    _pool: ThreadPool,
}

impl ReportStream {
    pub fn expected(&self) -> usize {
        self.expected
    }
}

impl Iterator for ReportStream {
    type Item = ReportEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.pending.pop_front().or_else(|| self.rx.recv().ok())
    }
}

pub fn scan_repository(root: &Path, workers: usize) -> Result<ReportStream> {
    if !root.is_dir() {
        return Err(PluginError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }
    let walk = scan_jars(root);
    debug!(
        "Found {} jars under ({}), {} unreadable",
        walk.jars.len(),
        root.display(),
        walk.errors.len()
    );
    let mut stream = dispatch(walk.jars, workers)?;
    for err in walk.errors {
        stream.expected += 1;
        stream.pending.push_back(ReportEntry {
            path: err_path(&err, root),
            outcome: Err(err),
        });
    }
    Ok(stream)
}

fn err_path(err: &PluginError, fallback: &Path) -> PathBuf {
    match err {
        PluginError::Io { path, .. } => path.clone(),
        _ => fallback.to_path_buf(),
    }
}

/// Inspects `jars` on a pool of `workers` threads.
pub fn dispatch(jars: Vec<PathBuf>, workers: usize) -> Result<ReportStream> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("report-worker-{i}"))
        .build()
        .map_err(|e| PluginError::io(PathBuf::new(), std::io::Error::other(e)))?;

    let (tx, rx) = mpsc::channel();
    let expected = jars.len();
    for path in jars {
        let tx = tx.clone();
        pool.spawn(move || {
            let outcome = inspect(&path);
            if let Err(e) = &outcome {
                warn!("Failed to inspect ({}): {e}", path.display());
            }
            let _ = tx.send(ReportEntry { path, outcome });
        });
    }
    drop(tx);

    Ok(ReportStream {
        pending: VecDeque::new(),
        rx,
        expected,
        _pool: pool,
    })
}
