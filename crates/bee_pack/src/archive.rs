use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use camino::Utf8Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{PackError, Result};

/// Key used to compare archive paths: `/` separators, no leading slash,
/// lower case.
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_lowercase()
}

/// The zip archive stored in a map's pakfile lump.
///
/// Entries already in the lump are kept as they are and copied raw on
/// serialisation unless an insert replaces them. New entries are stored
/// uncompressed, which the engine requires for packed content.
pub struct EmbeddedArchive {
    source: Option<ZipArchive<Cursor<Vec<u8>>>>,
    /// Normalised names of the source entries, by index.
    existing: Vec<String>,
    /// Pending inserts keyed by normalised name: (stored name, data).
    added: BTreeMap<String, (String, Vec<u8>)>,
}

impl Default for EmbeddedArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedArchive {
    pub fn new() -> Self {
        Self {
            source: None,
            existing: Vec::new(),
            added: BTreeMap::new(),
        }
    }

    /// Opens the lump bytes. An empty lump is an empty archive.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::new());
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut existing = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            existing.push(normalize_name(archive.by_index_raw(index)?.name()));
        }

        Ok(Self {
            source: Some(archive),
            existing,
            added: BTreeMap::new(),
        })
    }

    /// Adds or replaces an entry. Returns `true` if an entry with the same
    /// name (ignoring case and separators) was replaced.
    pub fn insert(&mut self, name: &str, data: Vec<u8>) -> bool {
        let key = normalize_name(name);
        let stored = name.replace('\\', "/").trim_start_matches('/').to_string();
        let replaced_existing = self.existing.contains(&key);
        let replaced_added = self.added.insert(key, (stored, data)).is_some();
        replaced_existing || replaced_added
    }

    /// Adds or replaces an entry with the contents of a file on disk.
    pub fn insert_file(&mut self, name: &str, path: &Utf8Path) -> Result<bool> {
        let data = std::fs::read(path).map_err(|source| PackError::ReadResource {
            path: path.to_owned(),
            source,
        })?;
        Ok(self.insert(name, data))
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.added.contains_key(&key) || self.existing.contains(&key)
    }

    /// Number of entries the serialised archive will have.
    pub fn len(&self) -> usize {
        let kept = self
            .existing
            .iter()
            .filter(|name| !self.added.contains_key(*name))
            .count();
        kept + self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current contents of an entry.
    pub fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let key = normalize_name(name);
        if let Some((_, data)) = self.added.get(&key) {
            return Ok(Some(data.clone()));
        }

        let (Some(source), Some(index)) = (
            self.source.as_mut(),
            self.existing.iter().position(|existing| *existing == key),
        ) else {
            return Ok(None);
        };

        let mut file = source.by_index(index)?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Serialises the archive.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        if let Some(source) = self.source.as_mut() {
            for index in 0..source.len() {
                let file = source.by_index_raw(index)?;
                if self.added.contains_key(&normalize_name(file.name())) {
                    continue;
                }
                writer.raw_copy_file(file)?;
            }
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in self.added.values() {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
