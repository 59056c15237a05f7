//! In-process store for tests and dry runs

use super::{check_name, BackingStore};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tilestack_core::{Error, LayerId, Result};

#[derive(Debug, Default)]
struct Entry {
    header: Option<Vec<u8>>,
    tiles: Option<Vec<u8>>,
    attributes: BTreeMap<String, Vec<u8>>,
}

/// A store that keeps every blob in memory.
///
/// Mirrors [`FileStore`](super::FileStore) semantics, including the residual
/// empty name entry left behind by per-zoom deletes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    names: Mutex<BTreeMap<String, BTreeMap<u32, Entry>>>,
    mutations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write or delete calls that reached the store
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Whether any location, even an empty one, exists for `name`
    pub fn has_location(&self, name: &str) -> bool {
        self.lock().map(|n| n.contains_key(name)).unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, BTreeMap<u32, Entry>>>> {
        self.names
            .lock()
            .map_err(|_| Error::Other("memory store lock poisoned".into()))
    }

    fn read_with<F>(&self, id: &LayerId, what: &str, f: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&Entry) -> Option<&Vec<u8>>,
    {
        let names = self.lock()?;
        names
            .get(&id.name)
            .and_then(|zooms| zooms.get(&id.zoom))
            .and_then(f)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{} of layer {}", what, id)))
    }

    fn write_with<F>(&self, id: &LayerId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Entry),
    {
        check_name(&id.name)?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut names = self.lock()?;
        let entry = names
            .entry(id.name.clone())
            .or_default()
            .entry(id.zoom)
            .or_default();
        f(entry);
        Ok(())
    }
}

impl BackingStore for MemoryStore {
    fn root(&self) -> String {
        "memory://".to_string()
    }

    fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let names = self.lock()?;
        Ok(names
            .iter()
            .flat_map(|(name, zooms)| {
                zooms
                    .iter()
                    .filter(|(_, entry)| entry.header.is_some())
                    .map(move |(zoom, _)| LayerId::new(name.clone(), *zoom))
            })
            .collect())
    }

    fn has_header(&self, id: &LayerId) -> Result<bool> {
        let names = self.lock()?;
        Ok(names
            .get(&id.name)
            .and_then(|zooms| zooms.get(&id.zoom))
            .is_some_and(|entry| entry.header.is_some()))
    }

    fn read_header(&self, id: &LayerId) -> Result<Vec<u8>> {
        self.read_with(id, "header", |e| e.header.as_ref())
    }

    fn write_header(&self, id: &LayerId, bytes: &[u8]) -> Result<()> {
        self.write_with(id, |e| e.header = Some(bytes.to_vec()))
    }

    fn tiles_location(&self, id: &LayerId) -> String {
        format!("{}/{}/tiles", id.name, id.zoom)
    }

    fn read_tiles(&self, id: &LayerId) -> Result<Vec<u8>> {
        self.read_with(id, "tiles", |e| e.tiles.as_ref())
    }

    fn write_tiles(&self, id: &LayerId, bytes: &[u8]) -> Result<()> {
        self.write_with(id, |e| e.tiles = Some(bytes.to_vec()))
    }

    fn read_attribute(&self, id: &LayerId, attribute: &str) -> Result<Vec<u8>> {
        self.read_with(id, attribute, |e| e.attributes.get(attribute))
    }

    fn write_attribute(&self, id: &LayerId, attribute: &str, bytes: &[u8]) -> Result<()> {
        self.write_with(id, |e| {
            e.attributes.insert(attribute.to_string(), bytes.to_vec());
        })
    }

    fn delete(&self, id: &LayerId) -> Result<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut names = self.lock()?;
        if let Some(zooms) = names.get_mut(&id.name) {
            zooms.remove(&id.zoom);
        }
        Ok(())
    }

    fn delete_name(&self, name: &str) -> Result<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.lock()?.remove(name);
        Ok(())
    }
}
