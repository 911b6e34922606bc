//! Base types for structure of SARC file.

use std::{fmt, io::Read};

use binrw::BinRead;
use byteorder::{ByteOrder, ReadBytesExt};

use crate::error::{Error, Result};

/// Big endian magic at the start of every SARC archive ("SARC")
pub const SARC_MAGIC: u32 = 0x5341_5243;

/// Big endian magic of the file allocation table ("SFAT")
pub const SFAT_MAGIC: u32 = 0x5346_4154;

/// Big endian magic of the file name table ("SFNT")
pub const SFNT_MAGIC: u32 = 0x5346_4E54;

/// The only archive version this library understands
pub const SUPPORTED_VERSION: u16 = 0x0100;

/// Byte order of the integers in an archive, given by its byte order mark
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endianness {
    /// Mark `FE FF`
    Big,
    /// Mark `FF FE`
    Little,
}

impl Endianness {
    /// Interpret a byte order mark read as a big endian integer
    pub fn from_bom(bom: u16) -> Option<Endianness> {
        match bom {
            0xFEFF => Some(Endianness::Big),
            0xFFFE => Some(Endianness::Little),
            _ => None,
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Big => f.write_str("big endian"),
            Endianness::Little => f.write_str("little endian"),
        }
    }
}

/// The part of the header that comes before the byte order is known
#[derive(BinRead, Debug, Copy, Clone, Default, PartialEq)]
#[br(magic = b"SARC", big)]
pub struct SarcPrefix {
    /// Size of the header, always 20 in practice
    #[allow(dead_code)]
    pub header_len: u16,

    /// Byte order mark
    pub bom: u16,
}

/// SARC file header
///
/// Defines the header of the SARC file which always starts with "SARC", the header is 20 bytes
/// long. Everything after the byte order mark is stored in the archive's byte order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SarcHeader {
    /// Byte order of the archive
    pub endianness: Endianness,

    /// Size of the whole archive
    pub file_size: u32,

    /// The offset from the start of the archive to the file data
    pub data_start: u32,

    /// Format version, `0x0100`
    pub version: u16,
}

impl SarcHeader {
    /// Size of the header in the archive, magic included
    pub const SIZE: u32 = 20;

    /// Read everything that follows the [`SarcPrefix`]
    pub(crate) fn read_rest<B: ByteOrder>(
        reader: &mut impl Read,
        endianness: Endianness,
    ) -> Result<SarcHeader> {
        let truncated = Error::truncated("header");
        let file_size = reader.read_u32::<B>().map_err(&truncated)?;
        let data_start = reader.read_u32::<B>().map_err(&truncated)?;
        let version = reader.read_u16::<B>().map_err(&truncated)?;
        reader.read_u16::<B>().map_err(&truncated)?;

        Ok(SarcHeader {
            endianness,
            file_size,
            data_start,
            version,
        })
    }
}

/// SFAT section header
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SfatHeader {
    /// Number of entries in the table
    pub node_count: u16,

    /// Multiplier of the name hash
    pub hash_key: u32,
}

impl SfatHeader {
    /// Size of the section header, magic included
    pub const SIZE: u32 = 12;

    pub(crate) fn read<B: ByteOrder>(reader: &mut impl Read) -> Result<SfatHeader> {
        let truncated = Error::truncated("SFAT section");
        let magic = reader.read_u32::<byteorder::BigEndian>().map_err(&truncated)?;
        if magic != SFAT_MAGIC {
            return Err(Error::CorruptArchive(format!(
                "expected the SFAT section, found magic {magic:#010x}"
            )));
        }
        reader.read_u16::<B>().map_err(&truncated)?;
        let node_count = reader.read_u16::<B>().map_err(&truncated)?;
        let hash_key = reader.read_u32::<B>().map_err(&truncated)?;

        Ok(SfatHeader {
            node_count,
            hash_key,
        })
    }
}

/// One entry of the file allocation table
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SfatEntry {
    /// Hash of the entry's name
    pub hash: u32,

    /// Flags and the name offset divided by four
    pub attrs: u32,

    /// Start of the data, relative to the data region
    pub begin: u32,

    /// End of the data, relative to the data region
    pub end: u32,
}

impl SfatEntry {
    /// Size of an entry in the table
    pub const SIZE: u32 = 16;

    /// Set in `attrs` when the entry has a name in the SFNT section
    pub const HAS_NAME: u32 = 0x0100_0000;

    pub(crate) fn read<B: ByteOrder>(reader: &mut impl Read) -> Result<SfatEntry> {
        let truncated = Error::truncated("SFAT section");
        Ok(SfatEntry {
            hash: reader.read_u32::<B>().map_err(&truncated)?,
            attrs: reader.read_u32::<B>().map_err(&truncated)?,
            begin: reader.read_u32::<B>().map_err(&truncated)?,
            end: reader.read_u32::<B>().map_err(&truncated)?,
        })
    }

    /// Whether the entry has a name in the SFNT section
    pub fn has_name(&self) -> bool {
        self.attrs & Self::HAS_NAME != 0
    }

    /// Offset of the name from the start of the name pool
    pub fn name_offset(&self) -> usize {
        (self.attrs & 0xFFFF) as usize * 4
    }
}

/// SFNT section header, followed by the name pool
pub struct SfntHeader;

impl SfntHeader {
    /// Size of the section header, magic included
    pub const SIZE: u32 = 8;

    pub(crate) fn read(reader: &mut impl Read) -> Result<()> {
        let truncated = Error::truncated("SFNT section");
        let magic = reader.read_u32::<byteorder::BigEndian>().map_err(&truncated)?;
        if magic != SFNT_MAGIC {
            return Err(Error::CorruptArchive(format!(
                "expected the SFNT section, found magic {magic:#010x}"
            )));
        }
        reader.read_u32::<byteorder::BigEndian>().map_err(&truncated)?;
        Ok(())
    }
}

/// Hash a name the way the SFAT table does, `key` comes from the [`SfatHeader`]
pub fn hash_name(name: &[u8], key: u32) -> u32 {
    name.iter()
        .fold(0u32, |hash, &b| hash.wrapping_mul(key).wrapping_add(b as u32))
}
