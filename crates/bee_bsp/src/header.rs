use std::fmt::Display;

use binrw::binrw;

use crate::error::{BspError, Result};

/// Number of entries in the lump directory.
pub const HEADER_LUMPS: usize = 64;

/// Size of the on-disk header: signature, version, lump directory, map revision.
pub const HEADER_SIZE: usize = 4 + 4 + HEADER_LUMPS * LumpEntry::SIZE + 4;

/// BSP versions written by Source engine branches we can safely rewrite.
pub const SUPPORTED_VERSIONS: std::ops::RangeInclusive<i32> = 17..=29;

/// Index into the lump directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LumpId(u8);

impl LumpId {
    pub const ENTITIES: LumpId = LumpId(0);
    pub const GAME_LUMP: LumpId = LumpId(35);
    /// Embedded zip archive with custom content.
    pub const PAKFILE: LumpId = LumpId(40);

    pub fn new(id: u32) -> Result<Self> {
        match u8::try_from(id) {
            Ok(id) if (id as usize) < HEADER_LUMPS => Ok(Self(id)),
            _ => Err(BspError::InvalidLumpId(id)),
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for LumpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One lump directory entry (`lump_t`).
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LumpEntry {
    pub offset: i32,
    pub length: i32,
    pub version: i32,
    pub four_cc: [u8; 4],
}

impl LumpEntry {
    pub const SIZE: usize = 16;

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Offset one past the end of the payload.
    pub fn end(&self) -> i64 {
        self.offset as i64 + self.length as i64
    }
}

#[binrw]
#[brw(little, magic = b"VBSP")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BspHeader {
    pub version: i32,
    pub lumps: [LumpEntry; HEADER_LUMPS],
    pub map_revision: i32,
}

impl BspHeader {
    pub fn entry(&self, lump: LumpId) -> &LumpEntry {
        &self.lumps[lump.index()]
    }

    pub fn entry_mut(&mut self, lump: LumpId) -> &mut LumpEntry {
        &mut self.lumps[lump.index()]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::{BinRead, BinWrite};

    use super::*;

    #[test]
    fn test_header_size() {
        let header = BspHeader {
            version: 21,
            lumps: [LumpEntry::default(); HEADER_LUMPS],
            map_revision: 3,
        };

        let mut writer = Cursor::new(Vec::new());
        header.write(&mut writer).unwrap();

        assert_eq!(writer.position() as usize, HEADER_SIZE);
        assert_eq!(&writer.get_ref()[..4], b"VBSP");
    }

    #[test]
    fn test_header_reads_back() {
        let mut lumps = [LumpEntry::default(); HEADER_LUMPS];
        lumps[LumpId::PAKFILE.index()] = LumpEntry {
            offset: 1036,
            length: 12,
            version: 0,
            four_cc: *b"\0\0\0\0",
        };
        let header = BspHeader {
            version: 21,
            lumps,
            map_revision: 9,
        };

        let mut writer = Cursor::new(Vec::new());
        header.write(&mut writer).unwrap();
        writer.set_position(0);

        assert_eq!(BspHeader::read(&mut writer).unwrap(), header);
    }

    #[test]
    fn test_lump_id_range() {
        assert_eq!(LumpId::new(40).unwrap(), LumpId::PAKFILE);
        assert!(matches!(LumpId::new(64), Err(BspError::InvalidLumpId(64))));
        assert!(matches!(LumpId::new(300), Err(BspError::InvalidLumpId(300))));
    }
}
