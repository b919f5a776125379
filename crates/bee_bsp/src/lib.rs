//! Reading and rewriting lumps of Source engine BSP map files.
//!
//! The map is read into memory, the lump directory validated, and a rewrite
//! produces a full new image that is swapped in through a temporary file in
//! the same directory. Either the whole file is replaced or it is untouched.
//!
//! ```no_run
//! use bee_bsp::{read_lump, replace_lump, LumpId};
//!
//! # fn main() -> bee_bsp::Result<()> {
//! let pak = read_lump("maps/preview.bsp", LumpId::PAKFILE)?;
//! replace_lump("maps/preview.bsp", LumpId::PAKFILE, &pak)?;
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::path::Path;

mod bsp;
mod error;
mod game_lump;
mod header;

pub use bsp::Bsp;
pub use error::{BspError, Result};
pub use game_lump::{GameLumpDirectory, GameLumpEntry};
pub use header::{BspHeader, LumpEntry, LumpId, HEADER_LUMPS, HEADER_SIZE, SUPPORTED_VERSIONS};

/// Load and validate a BSP file.
pub fn open(path: impl AsRef<Path>) -> Result<Bsp> {
    Bsp::from_bytes(std::fs::read(path)?)
}

/// Read one lump's payload. A lump the map does not have is empty.
pub fn read_lump(path: impl AsRef<Path>, lump: LumpId) -> Result<Vec<u8>> {
    Ok(open(path)?.lump(lump).to_vec())
}

/// Rewrite the file so `lump` holds `payload`, keeping every other lump.
pub fn replace_lump(path: impl AsRef<Path>, lump: LumpId, payload: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let image = open(path)?.with_replaced_lump(lump, payload)?;
    let permissions = std::fs::metadata(path)?.permissions();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(&image)?;
    temp.as_file().sync_all()?;
    temp.as_file().set_permissions(permissions)?;
    temp.persist(path).map_err(|err| err.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::test_utils::{static_props, BspFixture};
    use tempfile::tempdir;

    fn write_sample(dir: &Path) -> std::path::PathBuf {
        let data = BspFixture::new()
            .push(LumpId::ENTITIES, b"{ }\0")
            .push(LumpId::PAKFILE, b"PK old archive")
            .push_game_lump(b"props")
            .build();
        let path = dir.join("preview.bsp");
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_read_lump_from_file() {
        let dir = tempdir().unwrap();
        let path = write_sample(dir.path());

        assert_eq!(read_lump(&path, LumpId::PAKFILE).unwrap(), b"PK old archive");
        assert!(read_lump(&path, LumpId::new(12).unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_replace_lump_rewrites_file() {
        let dir = tempdir().unwrap();
        let path = write_sample(dir.path());
        let new_pak = vec![0xAB; 4099];

        replace_lump(&path, LumpId::PAKFILE, &new_pak).unwrap();

        let bsp = open(&path).unwrap();
        assert_eq!(bsp.lump(LumpId::PAKFILE), new_pak.as_slice());
        assert_eq!(bsp.lump(LumpId::ENTITIES), b"{ }\0");
        assert_eq!(static_props(&bsp), b"props");
        // Only the map itself is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_replace_with_same_bytes_is_noop() {
        let dir = tempdir().unwrap();
        let path = write_sample(dir.path());
        let before = std::fs::read(&path).unwrap();

        let pak = read_lump(&path, LumpId::PAKFILE).unwrap();
        replace_lump(&path, LumpId::PAKFILE, &pak).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = write_sample(dir.path());
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        replace_lump(&path, LumpId::PAKFILE, b"PK new archive").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_failed_rewrite_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.bsp");
        std::fs::write(&path, b"not a map at all").unwrap();

        let result = replace_lump(&path, LumpId::PAKFILE, b"data");

        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"not a map at all");
    }
}
