use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{PluginError, Result};

/// Upper bound for entries read whole into memory.
pub const MAX_ENTRY_BYTES: u64 = 16 * 1024 * 1024;

// The central directory's declared size is untrusted; never preallocate more.
const PREALLOC_LIMIT: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub is_class_file: bool,
}

/// A read-only, memory-mapped jar. Dropping it (or calling [`Archive::close`])
/// releases the mapping; the borrow checker rules out use after close.
pub struct Archive {
    path: PathBuf,
    zip: ZipArchive<Cursor<Mmap>>,
}

impl Archive {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PluginError::io(path, e))?;
        let len = file.metadata().map_err(|e| PluginError::io(path, e))?.len();
        if len == 0 {
            return Err(PluginError::Archive {
                path: path.to_path_buf(),
                source: ZipError::InvalidArchive("empty file"),
            });
        }
        // SAFETY: The file is opened read-only. The mapping outlives the `File`
        // handle and is released when the archive is dropped.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| PluginError::io(path, e))?;
        let zip = ZipArchive::new(Cursor::new(mmap)).map_err(|source| PluginError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Walks the central directory in stored order. Every call re-walks it.
    pub fn entries(&mut self) -> Result<Vec<EntryInfo>> {
        let mut out = Vec::with_capacity(self.zip.len());
        for i in 0..self.zip.len() {
            let entry = self.zip.by_index(i).map_err(|e| zip_err(&self.path, e))?;
            let name = entry.name().to_string();
            out.push(EntryInfo {
                is_class_file: !entry.is_dir() && name.ends_with(".class"),
                name,
            });
        }
        Ok(out)
    }

    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        self.read_entry_limited(name, MAX_ENTRY_BYTES)
    }

    /// Reads `name` whole, failing with `Archive` once more than `limit`
    /// bytes come out of it.
    pub fn read_entry_limited(&mut self, name: &str, limit: u64) -> Result<Vec<u8>> {
        let entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(PluginError::EntryNotFound {
                    path: self.path.clone(),
                    entry: name.to_string(),
                });
            }
            Err(e) => return Err(zip_err(&self.path, e)),
        };
        let mut buf = Vec::with_capacity(entry.size().min(limit).min(PREALLOC_LIMIT) as usize);
        entry
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| PluginError::io(&self.path, e))?;
        if buf.len() as u64 > limit {
            return Err(PluginError::Archive {
                path: self.path.clone(),
                source: ZipError::InvalidArchive("entry exceeds size limit"),
            });
        }
        Ok(buf)
    }

    /// Streams every `.class` entry to `visit`, in central directory order.
    pub fn for_each_class_entry<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&str, &mut dyn Read) -> std::io::Result<()>,
    {
        for i in 0..self.zip.len() {
            let mut entry = self.zip.by_index(i).map_err(|e| zip_err(&self.path, e))?;
            if entry.is_dir() || !entry.name().ends_with(".class") {
                continue;
            }
            let name = entry.name().to_string();
            visit(&name, &mut entry).map_err(|e| PluginError::io(&self.path, e))?;
        }
        Ok(())
    }

    pub fn close(self) {}
}

fn zip_err(path: &Path, e: ZipError) -> PluginError {
    match e {
        ZipError::Io(source) => PluginError::io(path, source),
        source => PluginError::Archive {
            path: path.to_path_buf(),
            source,
        },
    }
}
