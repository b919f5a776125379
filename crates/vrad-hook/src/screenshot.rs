//! Replaces the thumbnails the puzzle editor shows for a map.
//!
//! The editor saves a screenshot as `untitled.jpg` in each player's puzzle
//! folder. Making that file read-only stops the game overwriting it, so a
//! chosen image can stay in place.

use std::fs;
use std::io;
use std::time::{Duration, SystemTime};

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::{HookConfig, HookPaths, ScreenshotType};

/// Marker file the editor writes when a map has been playtested.
pub const PLAYTEST_FLAG_PREFIX: &str = "bee2_playtest_flag";
/// Screenshots the hook made itself.
pub const OWN_SCREENSHOT_PREFIX: &str = "bee2_screenshot";
/// Screenshots older than this are not of the current map.
pub const MAX_SCREENSHOT_AGE: Duration = Duration::from_secs(2 * 60 * 60);

const TARGET_NAME: &str = "untitled.jpg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: Utf8PathBuf,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoScreenshot {
    pub chosen: Option<Utf8PathBuf>,
    /// A playtest flag is newer than the chosen screenshot.
    pub playtested: bool,
}

/// Every file in the game's screenshot folder, newest first.
pub fn list_candidates(dir: &Utf8Path) -> io::Result<Vec<Candidate>> {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!("No screenshot folder at {}", dir);
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        candidates.push(Candidate {
            path: entry.path().to_owned(),
            modified: metadata.modified()?,
        });
    }
    candidates.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(candidates)
}

/// Picks the newest screenshot taken in the last two hours, skipping the
/// hook's own files.
pub fn select_auto(candidates: &[Candidate], now: SystemTime) -> AutoScreenshot {
    let mut playtested = false;
    for candidate in candidates {
        let name = candidate.path.file_name().unwrap_or_default();
        if name.starts_with(PLAYTEST_FLAG_PREFIX) {
            playtested = true;
            continue;
        }
        if name.starts_with(OWN_SCREENSHOT_PREFIX) {
            continue;
        }

        let age = now.duration_since(candidate.modified).unwrap_or_default();
        if age > MAX_SCREENSHOT_AGE {
            tracing::info!("Screenshot \"{}\" too old ({}s)", candidate.path, age.as_secs());
            continue;
        }

        tracing::info!("Chosen \"{}\"", candidate.path);
        tracing::info!("Map Playtested: {}", playtested);
        return AutoScreenshot {
            chosen: Some(candidate.path.clone()),
            playtested,
        };
    }

    tracing::info!("No Auto Screenshot found!");
    AutoScreenshot {
        chosen: None,
        playtested,
    }
}

/// `untitled.jpg` in every sub-folder of the puzzles folder.
pub fn find_targets(puzzles_dir: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
    let entries = match puzzles_dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!("No puzzles folder at {}", puzzles_dir);
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let mut targets = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let target = entry.path().join(TARGET_NAME);
        if target.is_file() {
            targets.push(target);
        }
    }
    targets.sort();
    Ok(targets)
}

#[allow(clippy::permissions_set_readonly_false)]
fn set_readonly(path: &Utf8Path, readonly: bool) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(readonly);
    fs::set_permissions(path, permissions)
}

/// Copies `source` over every target and locks it, or with no source
/// unlocks every target so the game replaces it.
pub fn apply(source: Option<&Utf8Path>, targets: &[Utf8PathBuf]) -> io::Result<()> {
    match source {
        Some(source) => {
            for target in targets {
                tracing::info!("Replacing \"{}\"...", target);
                set_readonly(target, false)?;
                fs::copy(source, target)?;
                set_readonly(target, true)?;
            }
        }
        None => {
            tracing::info!("Using PeTI screenshot!");
            for target in targets {
                tracing::info!("Making \"{}\" replaceable...", target);
                set_readonly(target, false)?;
            }
        }
    }
    Ok(())
}

fn clean_screenshots(candidates: &[Candidate], keep: Option<&Utf8Path>) -> io::Result<()> {
    tracing::info!("Cleaning up screenshots...");
    for candidate in candidates {
        if Some(candidate.path.as_path()) != keep {
            fs::remove_file(&candidate.path)?;
        }
    }
    tracing::info!("Done!");
    Ok(())
}

/// Runs the configured screenshot handling before the map is compiled.
pub fn update_screenshots(config: &HookConfig, paths: &HookPaths) -> io::Result<()> {
    let source = match config.screenshot_type {
        ScreenshotType::Custom => {
            tracing::info!("Using custom screenshot!");
            let path = Utf8PathBuf::from(&config.screenshot);
            if !path.is_file() {
                tracing::warn!("\"{}\" not found!", path);
            }
            Some(path)
        }
        ScreenshotType::Auto => {
            tracing::info!("Using automatic screenshot!");
            let candidates = list_candidates(&paths.screenshots_dir(config.game_id))?;
            let picked = select_auto(&candidates, SystemTime::now());
            if config.clean_screenshots {
                clean_screenshots(&candidates, picked.chosen.as_deref())?;
            }
            picked.chosen
        }
        ScreenshotType::Peti => None,
    };

    let source = source.filter(|path| path.is_file());
    let targets = find_targets(&paths.puzzles_dir())?;
    apply(source.as_deref(), &targets)
}
