use std::io::Cursor;

use binrw::{binrw, BinRead, BinWrite};

/// Directory entry of a game lump sub-lump (`dgamelump_t`).
///
/// `offset` is absolute within the BSP file, not relative to the game lump.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameLumpEntry {
    pub id: [u8; 4],
    pub flags: u16,
    pub version: u16,
    pub offset: i32,
    pub length: i32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameLumpDirectory {
    #[br(temp, assert(count >= 0, "negative game lump count {}", count))]
    #[bw(try_calc(i32::try_from(entries.len())))]
    count: i32,

    #[br(count = count as usize)]
    pub entries: Vec<GameLumpEntry>,
}

impl GameLumpDirectory {
    pub fn new(entries: Vec<GameLumpEntry>) -> Self {
        Self { entries }
    }

    pub fn parse(payload: &[u8]) -> binrw::BinResult<Self> {
        Self::read(&mut Cursor::new(payload))
    }

    /// Serialise over the start of `payload`. The directory occupies the
    /// same number of bytes it was read from, so the rest is untouched.
    pub fn write_into(&self, payload: &mut [u8]) -> binrw::BinResult<()> {
        self.write(&mut Cursor::new(payload))
    }

    /// Move every sub-lump stored at or after `from` by `delta` bytes.
    /// Returns whether any offset changed.
    pub fn shift_offsets(&mut self, from: i64, delta: i64) -> Result<bool, std::num::TryFromIntError> {
        let mut changed = false;
        for entry in &mut self.entries {
            if entry.length > 0 && entry.offset as i64 >= from {
                entry.offset = i32::try_from(entry.offset as i64 + delta)?;
                changed = true;
            }
        }
        Ok(changed)
    }
}
