use std::collections::BTreeSet;

use bee_bsp::LumpId;
use camino::{Utf8Path, Utf8PathBuf};

use crate::archive::EmbeddedArchive;
use crate::filelist::{FileList, FileListEntry};
use crate::music::{self, MusicScriptSpec, MUSIC_SCRIPT_ARCHIVE_PATH};
use crate::resolver::ResourceResolver;
use crate::{sound_manifest, Result};

/// A generated file in the inject directory and where it goes in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedResource {
    pub file_name: &'static str,
    pub archive_path: &'static str,
}

pub const RESPONSE_DATA_FILE: &str = "response_data.nut";
pub const SOUND_MANIFEST_FILE: &str = "soundscript_manifest.txt";
pub const MUSIC_SCRIPT_FILE: &str = "music_script.txt";

/// Files injected from the inject directory whenever they exist.
pub const INJECTED_RESOURCES: [InjectedResource; 3] = [
    InjectedResource {
        file_name: RESPONSE_DATA_FILE,
        archive_path: "scripts/vscripts/BEE2/coop_response_data.nut",
    },
    InjectedResource {
        file_name: SOUND_MANIFEST_FILE,
        archive_path: "scripts/game_sounds_manifest.txt",
    },
    InjectedResource {
        file_name: MUSIC_SCRIPT_FILE,
        archive_path: MUSIC_SCRIPT_ARCHIVE_PATH,
    },
];

/// Everything the packing driver needs besides the map itself.
#[derive(Debug, Clone)]
pub struct PackContext {
    pub resolver: ResourceResolver,
    /// Directory generated files are written to and injected from.
    pub inject_dir: Utf8PathBuf,
    /// The game's own `game_sounds_manifest.txt`.
    pub original_manifest: Utf8PathBuf,
    /// Music to generate, if any.
    pub music: Option<MusicScriptSpec>,
}

/// Result of merging files into an archive.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub bytes: Vec<u8>,
    /// Archive paths of the packed file list entries.
    pub packed: Vec<String>,
    /// Source paths no resource root has.
    pub missing: Vec<String>,
    /// Archive paths of injected resources.
    pub injected: Vec<String>,
}

/// Summary of a [`pack_map`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    pub packed: Vec<String>,
    pub missing: Vec<String>,
    pub injected: Vec<String>,
}

impl From<MergeOutcome> for PackReport {
    fn from(outcome: MergeOutcome) -> Self {
        Self {
            packed: outcome.packed,
            missing: outcome.missing,
            injected: outcome.injected,
        }
    }
}

/// Adds the file list entries and injected files to the archive held in
/// `existing_lump` and serialises it.
///
/// Injected files are `(archive path, file on disk)` pairs and are skipped
/// when the file does not exist. They go in last, so they win over a file
/// list entry with the same archive path.
pub fn merge(
    existing_lump: Vec<u8>,
    resolver: &ResourceResolver,
    entries: &[FileListEntry],
    injected: &[(String, Utf8PathBuf)],
) -> Result<MergeOutcome> {
    let mut archive = EmbeddedArchive::from_bytes(existing_lump)?;
    tracing::debug!(" - Existing archive read ({} entries)", archive.len());

    let mut outcome = MergeOutcome::default();
    for entry in entries {
        let Some(path) = resolver.resolve(&entry.source_path) else {
            tracing::warn!("\"bee2/{}\" not found!", entry.source_path);
            outcome.missing.push(entry.source_path.clone());
            continue;
        };
        archive.insert_file(&entry.archive_path, &path)?;
        outcome.packed.push(entry.archive_path.clone());
    }
    tracing::debug!(" - Added files");

    for (archive_path, path) in injected {
        if !path.is_file() {
            tracing::debug!("Nothing to inject at {}", path);
            continue;
        }
        tracing::info!("Injecting \"{}\" into packfile", archive_path);
        archive.insert_file(archive_path, path)?;
        outcome.injected.push(archive_path.clone());
    }

    outcome.bytes = archive.into_bytes()?;
    Ok(outcome)
}

/// Writes or removes the generated music script. Returns whether it exists.
fn write_music_script(inject_dir: &Utf8Path, spec: Option<&MusicScriptSpec>) -> Result<bool> {
    let path = inject_dir.join(MUSIC_SCRIPT_FILE);
    match spec {
        Some(spec) => {
            std::fs::write(&path, music::generate(spec))?;
            tracing::info!("Generated music script ({:?})", spec.tracks());
            Ok(true)
        }
        None => {
            if path.is_file() {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed stale {}", path);
            }
            Ok(false)
        }
    }
}

/// Packs the map's file list plus generated resources into its pakfile.
///
/// Reads `<map>.filelist.txt` next to the map. Without one the generated
/// resources are still packed.
pub fn pack_map(ctx: &PackContext, map_path: &Utf8Path) -> Result<PackReport> {
    let file_list = FileList::load(&FileList::path_for_map(map_path))?;
    let entries = file_list.entries();
    if entries.is_empty() {
        tracing::info!("No files to pack!");
    } else {
        tracing::info!("Files to pack:");
        for entry in &entries {
            tracing::info!(" # \"{}\"", entry.source_path);
        }
    }

    std::fs::create_dir_all(&ctx.inject_dir)?;

    let mut soundscripts: BTreeSet<String> = file_list.soundscripts();
    if write_music_script(&ctx.inject_dir, ctx.music.as_ref())? {
        soundscripts.insert(MUSIC_SCRIPT_ARCHIVE_PATH.to_string());
    }

    let original = sound_manifest::load_original(&ctx.original_manifest);
    let manifest = sound_manifest::generate(original.as_ref(), &soundscripts);
    sound_manifest::write_manifest(&ctx.inject_dir.join(SOUND_MANIFEST_FILE), &manifest)?;

    tracing::info!("Packing files into {}", map_path);
    let existing = bee_bsp::read_lump(map_path, LumpId::PAKFILE)?;

    let injected: Vec<(String, Utf8PathBuf)> = INJECTED_RESOURCES
        .iter()
        .map(|res| (res.archive_path.to_string(), ctx.inject_dir.join(res.file_name)))
        .collect();
    let outcome = merge(existing, &ctx.resolver, &entries, &injected)?;

    bee_bsp::replace_lump(map_path, LumpId::PAKFILE, &outcome.bytes)?;
    tracing::info!(
        "Packing complete: {} packed, {} missing, {} injected",
        outcome.packed.len(),
        outcome.missing.len(),
        outcome.injected.len()
    );

    Ok(outcome.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::SoundRef;
    use std::fs;
    use std::io::{Cursor, Read, Write};
    use tempfile::{tempdir, TempDir};
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn read_entry(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        Some(data)
    }

    /// A minimal VBSP image: header, an entities lump and a pakfile lump.
    fn build_map(pak: &[u8]) -> Vec<u8> {
        let entities = b"{ }\0";
        let mut data = Vec::new();
        data.extend_from_slice(b"VBSP");
        data.extend_from_slice(&21i32.to_le_bytes());
        let ent_offset = bee_bsp::HEADER_SIZE as i32;
        let pak_offset = ent_offset + 4;
        for lump in 0..bee_bsp::HEADER_LUMPS {
            let (offset, length) = match lump {
                0 => (ent_offset, entities.len() as i32),
                40 => (pak_offset, pak.len() as i32),
                _ => (0, 0),
            };
            data.extend_from_slice(&offset.to_le_bytes());
            data.extend_from_slice(&length.to_le_bytes());
            data.extend_from_slice(&0i32.to_le_bytes());
            data.extend_from_slice(&[0; 4]);
        }
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(entities);
        data.extend_from_slice(pak);
        data
    }

    struct Workspace {
        _dir: TempDir,
        root: Utf8PathBuf,
        ctx: PackContext,
        map: Utf8PathBuf,
    }

    fn workspace(pak: &[u8]) -> Workspace {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        for folder in ["bee2", "bee2_dev", "maps", "inject", "portal2/scripts"] {
            fs::create_dir_all(root.join(folder)).unwrap();
        }
        let map = root.join("maps").join("preview.bsp");
        fs::write(&map, build_map(pak)).unwrap();

        let ctx = PackContext {
            resolver: ResourceResolver::new(vec![root.join("bee2"), root.join("bee2_dev")]),
            inject_dir: root.join("inject"),
            original_manifest: root.join("portal2/scripts/game_sounds_manifest.txt"),
            music: None,
        };
        Workspace {
            _dir: dir,
            root,
            ctx,
            map,
        }
    }

    #[test]
    fn test_merge_skips_missing_and_keeps_going() {
        let dir = tempdir().unwrap();
        let r1 = utf8(&dir.path().join("r1"));
        let r2 = utf8(&dir.path().join("r2"));
        fs::create_dir_all(r2.join("materials")).unwrap();
        fs::write(r2.join("materials/a.vmt"), b"shader").unwrap();
        let resolver = ResourceResolver::new(vec![r1, r2]);

        let entries = FileList::parse("materials/a.vmt\nmaterials/missing.vmt\n").entries();
        let outcome = merge(Vec::new(), &resolver, &entries, &[]).unwrap();

        assert_eq!(outcome.packed, vec!["materials/a.vmt"]);
        assert_eq!(outcome.missing, vec!["materials/missing.vmt"]);
        assert_eq!(read_entry(&outcome.bytes, "materials/a.vmt").unwrap(), b"shader");
        assert!(read_entry(&outcome.bytes, "materials/missing.vmt").is_none());
    }

    #[test]
    fn test_merge_renames_and_overrides_existing() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        fs::create_dir_all(root.join("models")).unwrap();
        fs::write(root.join("models/src.mdl"), b"new model").unwrap();
        let resolver = ResourceResolver::new(vec![root.clone()]);

        let lump = build_zip(&[("models/dest.mdl", b"old model"), ("keep.txt", b"keep")]);
        let entries = FileList::parse("models/src.mdl\tmodels/dest.mdl\n").entries();
        let outcome = merge(lump, &resolver, &entries, &[]).unwrap();

        assert_eq!(read_entry(&outcome.bytes, "models/dest.mdl").unwrap(), b"new model");
        assert_eq!(read_entry(&outcome.bytes, "keep.txt").unwrap(), b"keep");
        assert!(read_entry(&outcome.bytes, "models/src.mdl").is_none());
    }

    #[test]
    fn test_merge_injects_present_files_only() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        fs::write(root.join("manifest.txt"), b"manifest").unwrap();
        let injected = vec![
            ("scripts/game_sounds_manifest.txt".to_string(), root.join("manifest.txt")),
            ("scripts/absent.nut".to_string(), root.join("absent.nut")),
        ];

        let outcome = merge(Vec::new(), &ResourceResolver::new(vec![]), &[], &injected).unwrap();

        assert_eq!(outcome.injected, vec!["scripts/game_sounds_manifest.txt"]);
        assert!(read_entry(&outcome.bytes, "scripts/absent.nut").is_none());
    }

    #[test]
    fn test_merge_corrupt_archive_is_fatal() {
        let result = merge(b"garbage".to_vec(), &ResourceResolver::new(vec![]), &[], &[]);
        assert!(matches!(result, Err(crate::PackError::Archive(_))));
    }

    #[test]
    fn test_pack_map_without_file_list_injects_generated() {
        let ws = workspace(&[]);
        fs::write(ws.ctx.inject_dir.join(RESPONSE_DATA_FILE), b"responses").unwrap();
        let mut ctx = ws.ctx.clone();
        ctx.music = Some(MusicScriptSpec {
            base: SoundRef::Single("m.wav".to_string()),
            funnel: None,
            bounce_gel: None,
            speed_gel: None,
        });

        let report = pack_map(&ctx, &ws.map).unwrap();

        assert!(report.packed.is_empty());
        assert_eq!(
            report.injected,
            vec![
                "scripts/vscripts/BEE2/coop_response_data.nut",
                "scripts/game_sounds_manifest.txt",
                MUSIC_SCRIPT_ARCHIVE_PATH,
            ]
        );

        let pak = bee_bsp::read_lump(&ws.map, LumpId::PAKFILE).unwrap();
        assert_eq!(
            read_entry(&pak, "scripts/vscripts/BEE2/coop_response_data.nut").unwrap(),
            b"responses"
        );
        let manifest =
            String::from_utf8(read_entry(&pak, "scripts/game_sounds_manifest.txt").unwrap()).unwrap();
        assert!(manifest.contains("\"scripts/BEE2_generated_music.txt\""));
        let music = read_entry(&pak, MUSIC_SCRIPT_ARCHIVE_PATH).unwrap();
        assert!(String::from_utf8(music).unwrap().contains("\"#*m.wav\""));
    }

    #[test]
    fn test_pack_map_skips_undecodable_file_list_line() {
        let ws = workspace(&[]);
        fs::create_dir_all(ws.root.join("bee2/materials")).unwrap();
        fs::write(ws.root.join("bee2/materials/a.vmt"), b"shader").unwrap();
        fs::write(
            ws.root.join("maps/preview.filelist.txt"),
            b"materials/a.vmt\nmaterials/caf\xe9.vmt\n",
        )
        .unwrap();

        let report = pack_map(&ws.ctx, &ws.map).unwrap();

        assert_eq!(report.packed, vec!["materials/a.vmt"]);
        let pak = bee_bsp::read_lump(&ws.map, LumpId::PAKFILE).unwrap();
        assert_eq!(read_entry(&pak, "materials/a.vmt").unwrap(), b"shader");
    }

    #[test]
    fn test_pack_map_end_to_end() {
        let ws = workspace(&build_zip(&[("maps/preview/cubemap.vtf", b"vtf")]));
        fs::create_dir_all(ws.root.join("bee2/materials")).unwrap();
        fs::create_dir_all(ws.root.join("bee2_dev/scripts")).unwrap();
        fs::write(ws.root.join("bee2/materials/wall.vmt"), b"wall").unwrap();
        fs::write(ws.root.join("bee2_dev/scripts/bee2_items.txt"), b"items").unwrap();
        fs::write(ws.ctx.inject_dir.join(RESPONSE_DATA_FILE), b"responses").unwrap();
        fs::write(
            &ws.ctx.original_manifest,
            "game_sounds_manifest\n{\n\"precache_file\" \"scripts/game_sounds.txt\"\n\"precache_file\" \"!new_sound_scripts_must_go_below_here\"\n}\n",
        )
        .unwrap();
        fs::write(
            ws.root.join("maps/preview.filelist.txt"),
            "materials/wall.vmt\n#scripts/bee2_items.txt\nsound/missing.wav\n",
        )
        .unwrap();

        let mut ctx = ws.ctx.clone();
        ctx.music = Some(MusicScriptSpec {
            base: SoundRef::Single("music/base.wav".to_string()),
            funnel: None,
            bounce_gel: None,
            speed_gel: None,
        });
        let report = pack_map(&ctx, &ws.map).unwrap();

        assert_eq!(report.missing, vec!["sound/missing.wav"]);
        assert_eq!(report.injected.len(), 3);

        let pak = bee_bsp::read_lump(&ws.map, LumpId::PAKFILE).unwrap();
        assert_eq!(read_entry(&pak, "maps/preview/cubemap.vtf").unwrap(), b"vtf");
        assert_eq!(read_entry(&pak, "materials/wall.vmt").unwrap(), b"wall");
        assert_eq!(
            read_entry(&pak, "scripts/vscripts/BEE2/coop_response_data.nut").unwrap(),
            b"responses"
        );

        let manifest =
            String::from_utf8(read_entry(&pak, "scripts/game_sounds_manifest.txt").unwrap()).unwrap();
        assert_eq!(
            manifest,
            "\"game_sounds_manifest\"\n\t{\n\
             \t\"precache_file\" \"scripts/game_sounds.txt\"\n\
             \t\"precache_file\" \"scripts/BEE2_generated_music.txt\"\n\
             \t\"precache_file\" \"scripts/bee2_items.txt\"\n\
             \t}\n"
        );

        let music = read_entry(&pak, MUSIC_SCRIPT_ARCHIVE_PATH).unwrap();
        assert!(String::from_utf8(music).unwrap().contains("\"#*music/base.wav\""));

        let bsp = bee_bsp::open(&ws.map).unwrap();
        assert_eq!(bsp.lump(LumpId::ENTITIES), b"{ }\0");
    }

    #[test]
    fn test_pack_map_removes_stale_music() {
        let ws = workspace(&[]);
        fs::write(ws.ctx.inject_dir.join(MUSIC_SCRIPT_FILE), b"old music").unwrap();
        fs::write(ws.root.join("maps/preview.filelist.txt"), "sound/missing.wav\n").unwrap();

        let report = pack_map(&ws.ctx, &ws.map).unwrap();

        assert!(!ws.ctx.inject_dir.join(MUSIC_SCRIPT_FILE).exists());
        assert_eq!(report.injected, vec!["scripts/game_sounds_manifest.txt"]);
        let pak = bee_bsp::read_lump(&ws.map, LumpId::PAKFILE).unwrap();
        assert!(read_entry(&pak, MUSIC_SCRIPT_ARCHIVE_PATH).is_none());
    }
}
