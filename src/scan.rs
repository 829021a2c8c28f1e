use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::warn;

use crate::error::{PluginError, Result};

fn is_jar(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "jar")
}

/// Outcome of a recursive walk: jars found, plus every entry the walker
/// could not read (dangling links, unreadable directories, link loops).
#[derive(Debug, Default)]
pub struct JarWalk {
    pub jars: Vec<PathBuf>,
    pub errors: Vec<PluginError>,
}

/// Every `*.jar` file under `base_path`, recursively, in no particular order.
/// Symlinks are followed.
pub fn scan_jars(base_path: &Path) -> JarWalk {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(true)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_some_and(|t| t.is_file()) && is_jar(path) {
                        let _ = tx.send(Ok(path.to_path_buf()));
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(err));
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut walk = JarWalk::default();
    for item in rx {
        match item {
            Ok(path) => walk.jars.push(path),
            Err(err) => {
                let err = walk_error(base_path, err);
                warn!("Skipped during walk: {err}");
                walk.errors.push(err);
            }
        }
    }
    walk
}

fn walk_error(base_path: &Path, err: ignore::Error) -> PluginError {
    let path = error_path(&err).unwrap_or(base_path).to_path_buf();
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    PluginError::io(path, source)
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::Loop { child, .. } => Some(child),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}

/// `*.jar` files directly inside `dir`, sorted by name.
pub fn staged_jars(dir: &Path) -> Result<Vec<PathBuf>> {
    let read = std::fs::read_dir(dir).map_err(|e| PluginError::io(dir, e))?;
    let mut jars = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| PluginError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && is_jar(&path) {
            jars.push(path);
        }
    }
    jars.sort();
    Ok(jars)
}
