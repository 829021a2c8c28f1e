use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::archive::Archive;
use crate::error::Result;
use crate::manifest::{MANIFEST_ENTRY, PluginManifest, parse_manifest};
use crate::nms;

/// One inspected jar: its declared identity plus, once requested, the server
/// versions its bytecode references.
#[derive(Debug, Clone, Serialize)]
pub struct PluginRecord {
    pub path: PathBuf,
    pub manifest: PluginManifest,
    nms_versions: Option<BTreeSet<String>>,
}

impl PluginRecord {
    /// Reads `plugin.yml` only. The archive is closed before returning.
    pub fn open(path: &Path) -> Result<Self> {
        let mut archive = Archive::open(path)?;
        let manifest = read_manifest(&mut archive)?;
        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            nms_versions: None,
        })
    }

    /// Reads `plugin.yml` and scans every class entry in one pass over the archive.
    pub fn inspect(path: &Path) -> Result<Self> {
        let mut archive = Archive::open(path)?;
        let manifest = read_manifest(&mut archive)?;
        let versions = nms::scan_archive(&mut archive)?;
        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            nms_versions: Some(versions),
        })
    }

    /// Scans the archive on first use and caches the result.
    pub fn nms_versions(&mut self) -> Result<&BTreeSet<String>> {
        if self.nms_versions.is_none() {
            let mut archive = Archive::open(&self.path)?;
            self.nms_versions = Some(nms::scan_archive(&mut archive)?);
        }
        Ok(self.nms_versions.get_or_insert_with(BTreeSet::new))
    }

    pub fn cached_nms_versions(&self) -> Option<&BTreeSet<String>> {
        self.nms_versions.as_ref()
    }
}

fn read_manifest(archive: &mut Archive) -> Result<PluginManifest> {
    let bytes = archive.read_entry(MANIFEST_ENTRY)?;
    parse_manifest(&bytes, archive.path())
}
