//! Directory-backed store
//!
//! Layout under the root:
//!
//! ```text
//! <root>/<name>/<zoom>/header.json
//! <root>/<name>/<zoom>/tiles.bin
//! <root>/<name>/<zoom>/attributes/<attribute>.json
//! ```

use super::{check_name, BackingStore};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tilestack_core::{Error, LayerId, Result};
use tracing::debug;

const HEADER_FILE: &str = "header.json";
const TILES_FILE: &str = "tiles.bin";
const ATTRIBUTES_DIR: &str = "attributes";

/// A catalog rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store; the root directory is created lazily on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn name_dir(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name))
    }

    fn zoom_dir(&self, id: &LayerId) -> Result<PathBuf> {
        Ok(self.name_dir(&id.name)?.join(id.zoom.to_string()))
    }

    fn attribute_path(&self, id: &LayerId, attribute: &str) -> Result<PathBuf> {
        check_name(attribute)?;
        Ok(self
            .zoom_dir(id)?
            .join(ATTRIBUTES_DIR)
            .join(format!("{}.json", attribute)))
    }

    fn read(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| Error::from_io(path, e))
    }

    /// Write through a sibling temp file so readers never see half a blob
    fn write(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| Error::from_io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| Error::from_io(path, e))
    }

    fn remove_dir(path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::from_io(path, e)),
        }
    }

    /// Subdirectory names of `dir`; a missing directory has none
    fn list_dirs(dir: &Path) -> Result<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::from_io(dir, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::from_io(dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| Error::from_io(entry.path(), e))?
                .is_dir();
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl BackingStore for FileStore {
    fn root(&self) -> String {
        self.root.display().to_string()
    }

    fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let mut ids = Vec::new();
        for name in Self::list_dirs(&self.root)? {
            if check_name(&name).is_err() {
                continue;
            }
            ids.extend(
                self.zooms(&name)?
                    .into_iter()
                    .map(|zoom| LayerId::new(name.clone(), zoom)),
            );
        }
        Ok(ids)
    }

    fn zooms(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.name_dir(name)?;
        let mut zooms: Vec<u32> = Self::list_dirs(&dir)?
            .iter()
            .filter_map(|z| z.parse::<u32>().ok())
            .filter(|z| dir.join(z.to_string()).join(HEADER_FILE).is_file())
            .collect();
        zooms.sort_unstable();
        Ok(zooms)
    }

    fn has_header(&self, id: &LayerId) -> Result<bool> {
        Ok(self.zoom_dir(id)?.join(HEADER_FILE).is_file())
    }

    fn read_header(&self, id: &LayerId) -> Result<Vec<u8>> {
        Self::read(&self.zoom_dir(id)?.join(HEADER_FILE))
    }

    fn write_header(&self, id: &LayerId, bytes: &[u8]) -> Result<()> {
        Self::write(&self.zoom_dir(id)?.join(HEADER_FILE), bytes)
    }

    fn tiles_location(&self, id: &LayerId) -> String {
        format!("{}/{}/{}", id.name, id.zoom, TILES_FILE)
    }

    fn read_tiles(&self, id: &LayerId) -> Result<Vec<u8>> {
        Self::read(&self.zoom_dir(id)?.join(TILES_FILE))
    }

    fn write_tiles(&self, id: &LayerId, bytes: &[u8]) -> Result<()> {
        Self::write(&self.zoom_dir(id)?.join(TILES_FILE), bytes)
    }

    fn read_attribute(&self, id: &LayerId, attribute: &str) -> Result<Vec<u8>> {
        Self::read(&self.attribute_path(id, attribute)?)
    }

    fn write_attribute(&self, id: &LayerId, attribute: &str, bytes: &[u8]) -> Result<()> {
        Self::write(&self.attribute_path(id, attribute)?, bytes)
    }

    fn delete(&self, id: &LayerId) -> Result<()> {
        // Leaves <root>/<name> in place even when it ends up empty.
        Self::remove_dir(&self.zoom_dir(id)?)
    }

    fn delete_name(&self, name: &str) -> Result<()> {
        Self::remove_dir(&self.name_dir(name)?)
    }
}
