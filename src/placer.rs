//! Places inspected jars into the repository at
//! `<repository>/<Name>/<version>/<name>.jar`.
//!
//! An existing file at the destination is compared by SHA-256. Identical
//! content counts as already placed; different content goes to the
//! [`ConflictResolver`] and is only replaced when it agrees. Destination writes
//! go through a sibling temp file and a rename, so readers never observe a
//! truncated jar.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{PluginError, Result};
use crate::manifest::PluginManifest;
use crate::paths::{check_segment, confined_join};
use crate::record::PluginRecord;

/// An incoming jar whose content differs from the one already placed.
#[derive(Debug)]
pub struct Conflict<'a> {
    pub existing: &'a Path,
    pub incoming: &'a PluginManifest,
    pub source: &'a Path,
}

pub trait ConflictResolver {
    /// Returns `true` to overwrite the existing file.
    fn confirm_overwrite(&mut self, conflict: &Conflict<'_>) -> Result<bool>;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&Conflict<'_>) -> bool,
{
    fn confirm_overwrite(&mut self, conflict: &Conflict<'_>) -> Result<bool> {
        Ok(self(conflict))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverwrite;

impl ConflictResolver for AlwaysOverwrite {
    fn confirm_overwrite(&mut self, _conflict: &Conflict<'_>) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverOverwrite;

impl ConflictResolver for NeverOverwrite {
    fn confirm_overwrite(&mut self, _conflict: &Conflict<'_>) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    Placed,
    AlreadyPresent,
    Skipped,
    Overwritten,
}

#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    pub kind: PlacementKind,
    pub destination: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RepositoryPlacer {
    repository: PathBuf,
}

impl RepositoryPlacer {
    /// `repository` must be absolute and normalized; every destination is
    /// confined to it.
    pub fn new(repository: PathBuf) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }

    pub fn destination(&self, manifest: &PluginManifest) -> Result<PathBuf> {
        let name = manifest.name_segment();
        let version = manifest.version_segment();
        check_segment(&self.repository, &manifest.name, &name)?;
        check_segment(&self.repository, &manifest.version, &version)?;
        confined_join(
            &self.repository,
            &[&name, &version, &manifest.jar_file_name()],
        )
    }

    /// Moves `record.path` into the repository. On any error, or when the
    /// resolver declines, the source stays where it is.
    pub fn place(
        &self,
        record: &PluginRecord,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<Placement> {
        let source = record.path.as_path();
        let destination = self.destination(&record.manifest)?;

        let bytes = std::fs::read(source).map_err(|e| PluginError::io(source, e))?;

        if let Some(version_dir) = destination.parent() {
            if let Some(name_dir) = version_dir.parent() {
                ensure_dir(name_dir)?;
            }
            ensure_dir(version_dir)?;
        }

        let kind = if !destination.exists() {
            atomic_write(&destination, &bytes)?;
            PlacementKind::Placed
        } else if digest_file(&destination)? == digest_bytes(&bytes) {
            debug!(
                "Identical file already at ({}), dropping staged copy",
                destination.display()
            );
            PlacementKind::AlreadyPresent
        } else {
            let conflict = Conflict {
                existing: &destination,
                incoming: &record.manifest,
                source,
            };
            if !resolver.confirm_overwrite(&conflict)? {
                warn!(
                    "Kept existing ({}); ({}) left in staging",
                    destination.display(),
                    source.display()
                );
                return Ok(Placement {
                    kind: PlacementKind::Skipped,
                    destination,
                });
            }
            atomic_write(&destination, &bytes)?;
            PlacementKind::Overwritten
        };

        std::fs::remove_file(source).map_err(|e| PluginError::io(source, e))?;
        info!("Placed ({}) to ({})", source.display(), destination.display());

        Ok(Placement { kind, destination })
    }
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn digest_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| PluginError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| PluginError::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Create-if-absent; losing a creation race to another run is not an error.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| PluginError::io(dir, e))?;
    info!("Folder created ({})", dir.display());
    Ok(())
}

fn atomic_write(destination: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = destination.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    if let Err(e) = std::fs::write(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(PluginError::io(&tmp, e));
    }
    if let Err(e) = std::fs::rename(&tmp, destination) {
        let _ = std::fs::remove_file(&tmp);
        return Err(PluginError::io(destination, e));
    }
    Ok(())
}
