use std::collections::{BTreeMap, BTreeSet};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

/// One file to pack, as requested by the editor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileListEntry {
    /// Logical path looked up through the resource roots.
    pub source_path: String,
    /// Path the file gets inside the map's archive.
    pub archive_path: String,
    /// The file is a soundscript that must be listed in the sound manifest.
    pub is_soundscript: bool,
}

/// The `<map>.filelist.txt` side-car written next to the map.
///
/// Each line names a file, optionally followed by a tab and the archive path
/// to store it under. A leading `#` marks a soundscript. Lines are matched
/// case-insensitively and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    entries: BTreeMap<(String, String), bool>,
}

impl FileList {
    /// Side-car path for a map: `maps/foo.bsp` -> `maps/foo.filelist.txt`.
    pub fn path_for_map(map_path: &Utf8Path) -> Utf8PathBuf {
        map_path.with_extension("filelist.txt")
    }

    /// Reads a file list. A missing file is an empty list, and lines that
    /// are not UTF-8 are skipped.
    pub fn load(path: &Utf8Path) -> io::Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Self::parse(&decode_lines(path, &bytes))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No file list at {}", path);
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut list = Self::default();
        for line in text.lines() {
            let line = line.trim().to_lowercase();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            let (is_soundscript, line) = match line.strip_prefix('#') {
                Some(rest) => (true, rest),
                None => (false, line.as_str()),
            };
            let (source, archive) = line.split_once('\t').unwrap_or((line, line));
            if source.is_empty() {
                continue;
            }
            let archive = if archive.is_empty() { source } else { archive };

            let flag = list
                .entries
                .entry((source.to_string(), archive.to_string()))
                .or_insert(false);
            *flag |= is_soundscript;
        }
        list
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries sorted by source path, then archive path.
    pub fn entries(&self) -> Vec<FileListEntry> {
        self.entries
            .iter()
            .map(|((source, archive), is_soundscript)| FileListEntry {
                source_path: source.clone(),
                archive_path: archive.clone(),
                is_soundscript: *is_soundscript,
            })
            .collect()
    }

    /// Archive paths of every entry marked as a soundscript.
    pub fn soundscripts(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|(_, is_soundscript)| **is_soundscript)
            .map(|((_, archive), _)| archive.clone())
            .collect()
    }
}

fn decode_lines(path: &Utf8Path, bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for (index, line) in bytes.split(|&b| b == b'\n').enumerate() {
        match std::str::from_utf8(line) {
            Ok(line) => {
                text.push_str(line);
                text.push('\n');
            }
            Err(_) => tracing::warn!(
                "Skipping undecodable line {} of {}: \"{}\"",
                index + 1,
                path,
                String::from_utf8_lossy(line).trim()
            ),
        }
    }
    text
}
