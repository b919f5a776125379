use std::io::Cursor;

use binrw::{BinRead, BinWrite};

use crate::error::{BspError, Result};
use crate::game_lump::GameLumpDirectory;
use crate::header::{BspHeader, LumpId, HEADER_LUMPS, HEADER_SIZE, SUPPORTED_VERSIONS};

/// A BSP file loaded into memory.
///
/// Construction validates the header and that every lump lies inside the
/// data, so lump accessors never fail afterwards.
#[derive(Debug, Clone)]
pub struct Bsp {
    header: BspHeader,
    data: Vec<u8>,
}

impl Bsp {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let header = BspHeader::read(&mut Cursor::new(&data))?;

        if !SUPPORTED_VERSIONS.contains(&header.version) {
            return Err(BspError::UnsupportedVersion(header.version));
        }

        for index in 0..HEADER_LUMPS {
            let lump = LumpId::new(index as u32)?;
            let entry = header.entry(lump);
            if entry.is_empty() {
                continue;
            }
            if entry.offset < 0 || entry.length < 0 || entry.end() > data.len() as i64 {
                return Err(BspError::LumpOutOfBounds {
                    lump,
                    offset: entry.offset,
                    length: entry.length,
                    file_size: data.len(),
                });
            }
        }

        Ok(Self { header, data })
    }

    pub fn header(&self) -> &BspHeader {
        &self.header
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Payload of a lump. Absent lumps are empty.
    pub fn lump(&self, lump: LumpId) -> &[u8] {
        let entry = self.header.entry(lump);
        if entry.is_empty() {
            return &[];
        }
        let start = entry.offset as usize;
        &self.data[start..start + entry.length as usize]
    }

    /// Build the file image with `lump` holding `payload`.
    ///
    /// Payloads stored after the old lump are shifted by a multiple of four
    /// so their alignment is kept, and every directory offset pointing at
    /// them (including the game lump's absolute sub-lump offsets) follows.
    pub fn with_replaced_lump(&self, lump: LumpId, payload: &[u8]) -> Result<Vec<u8>> {
        let entry = *self.header.entry(lump);
        let mut header = self.header.clone();

        if entry.length as usize == payload.len() {
            if payload.is_empty() {
                return Ok(self.data.clone());
            }
            let mut image = self.data.clone();
            let start = entry.offset as usize;
            image[start..start + payload.len()].copy_from_slice(payload);
            return Ok(image);
        }

        if entry.is_empty() {
            // Nothing to move: the new payload goes at the aligned end of file.
            let mut image = self.data.clone();
            image.resize(align4(image.len()), 0);
            let target = header.entry_mut(lump);
            target.offset = to_offset(image.len() as i64)?;
            target.length = to_offset(payload.len() as i64)?;
            image.extend_from_slice(payload);
            write_header(&header, &mut image)?;
            return Ok(image);
        }

        let start = entry.offset as usize;
        let old_end = entry.end();

        // Everything from the first payload at or after the old lump's end
        // moves as one block.
        let tail_start = self
            .header
            .lumps
            .iter()
            .enumerate()
            .filter(|(index, other)| *index != lump.index() && !other.is_empty())
            .map(|(_, other)| other.offset as i64)
            .filter(|&offset| offset >= old_end)
            .min()
            .unwrap_or(self.data.len() as i64);
        let tail = &self.data[tail_start as usize..];

        let new_end = (start + payload.len()) as i64;
        let new_tail_start = if tail.is_empty() {
            new_end
        } else {
            new_end + (tail_start - new_end).rem_euclid(4)
        };
        let delta = new_tail_start - tail_start;

        let mut image = Vec::with_capacity(new_tail_start as usize + tail.len());
        image.extend_from_slice(&self.data[..start]);
        image.extend_from_slice(payload);
        image.resize(new_tail_start as usize, 0);
        image.extend_from_slice(tail);

        for (index, other) in header.lumps.iter_mut().enumerate() {
            if index != lump.index() && !other.is_empty() && other.offset as i64 >= tail_start {
                other.offset = to_offset(other.offset as i64 + delta)?;
            }
        }
        header.entry_mut(lump).length = to_offset(payload.len() as i64)?;

        if lump != LumpId::GAME_LUMP {
            shift_game_lump(&header, &mut image, tail_start, delta)?;
        }

        write_header(&header, &mut image)?;
        Ok(image)
    }
}

/// Fix the game lump's absolute sub-lump offsets after a move.
///
/// A game lump whose directory cannot be parsed is left as it is; the engine
/// ignores sub-lumps it does not understand and the bytes still move intact.
fn shift_game_lump(header: &BspHeader, image: &mut [u8], from: i64, delta: i64) -> Result<()> {
    let entry = header.entry(LumpId::GAME_LUMP);
    if entry.is_empty() || delta == 0 {
        return Ok(());
    }

    let start = entry.offset as usize;
    let payload = &mut image[start..start + entry.length as usize];
    let Ok(mut directory) = GameLumpDirectory::parse(payload) else {
        return Ok(());
    };

    if directory
        .shift_offsets(from, delta)
        .map_err(|_| BspError::TooLarge)?
    {
        directory.write_into(payload)?;
    }
    Ok(())
}

fn write_header(header: &BspHeader, image: &mut [u8]) -> Result<()> {
    header.write(&mut Cursor::new(&mut image[..HEADER_SIZE]))?;
    Ok(())
}

fn to_offset(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| BspError::TooLarge)
}

fn align4(value: usize) -> usize {
    (value + 3) & !3
}
