use std::collections::{BTreeSet, HashSet};

use bee_keyvalues::Property;
use camino::Utf8Path;

/// Block name of the manifest file.
pub const MANIFEST_BLOCK: &str = "game_sounds_manifest";

/// Placeholder entry Valve ships in its manifest. It is not a real script.
pub const SENTINEL: &str = "new_sound_scripts_must_go_below_here";

fn script_key(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

/// Loads the `game_sounds_manifest` block of the game's own manifest.
///
/// A fresh install may not have one, so any failure yields `None` and the
/// manifest is built from the additions alone.
pub fn load_original(path: &Utf8Path) -> Option<Property> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No original sound manifest at {}", path);
            return None;
        }
        Err(err) => {
            tracing::warn!("Failed to read sound manifest {}: {}", path, err);
            return None;
        }
    };

    let root = match Property::parse(&text, path.as_str()) {
        Ok(root) => root,
        Err(err) => {
            tracing::warn!("Ignoring unparsable sound manifest: {}", err);
            return None;
        }
    };

    let block = root.find_block(MANIFEST_BLOCK).cloned();
    if block.is_none() {
        tracing::warn!("{} has no {} block", path, MANIFEST_BLOCK);
    }
    block
}

/// Script paths for the new manifest: the original's `precache_file`
/// entries in order, then the additions. Duplicates and the sentinel are
/// dropped.
pub fn collect_scripts(original: Option<&Property>, additional: &BTreeSet<String>) -> Vec<String> {
    let existing = original
        .into_iter()
        .flat_map(|block| block.find_all("precache_file"))
        .filter_map(Property::as_str);

    let mut seen = HashSet::new();
    let mut scripts = Vec::new();
    for script in existing.chain(additional.iter().map(String::as_str)) {
        if script.to_lowercase().contains(SENTINEL) {
            tracing::debug!("Dropping manifest placeholder \"{}\"", script);
            continue;
        }
        if seen.insert(script_key(script)) {
            scripts.push(script.to_string());
        }
    }
    scripts
}

/// Renders a manifest listing only `precache_file` entries.
pub fn generate(original: Option<&Property>, additional: &BTreeSet<String>) -> String {
    let entries = collect_scripts(original, additional)
        .into_iter()
        .map(|script| Property::leaf("precache_file", script))
        .collect();
    Property::block(MANIFEST_BLOCK, entries).export()
}

pub fn write_manifest(path: &Utf8Path, text: &str) -> std::io::Result<()> {
    std::fs::write(path, text)?;
    tracing::info!("Written new soundscript manifest");
    Ok(())
}
