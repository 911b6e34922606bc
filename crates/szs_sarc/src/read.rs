//! Types for reading SARC archives
//!

use std::{
    io::{self, Read},
    ops::Range,
};

use binrw::{io::NoSeek, BinRead};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, Result},
    types::{
        hash_name, Endianness, SarcHeader, SarcPrefix, SfatEntry, SfatHeader, SfntHeader,
        SUPPORTED_VERSION,
    },
};

/// A named entry of a [`SarcArchive`]
#[derive(Debug, Clone, PartialEq)]
pub struct SarcEntry {
    /// Hash of the name as stored in the table
    pub hash: u32,

    /// Position of the entry's data in [`SarcArchive::data`]
    pub range: Range<usize>,
}

impl SarcEntry {
    /// Size of the entry's data
    pub fn size(&self) -> usize {
        self.range.len()
    }
}

/// SARC archive reader
///
/// The archive is read completely when it is opened, entries are slices of one owned buffer.
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_sarc_contents(reader: impl Read) -> szs_sarc::error::Result<()> {
///     let sarc = szs_sarc::SarcArchive::new(reader)?;
///
///     for (name, data) in sarc.entries() {
///         println!("{name}: {} bytes", data.len());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SarcArchive {
    header: SarcHeader,
    hash_key: u32,
    entries: IndexMap<Box<str>, SarcEntry>,
    data: Vec<u8>,
}

impl SarcArchive {
    /// Read a SARC archive from the current position of `reader`.
    ///
    /// Bytes up to the archive's declared size are consumed, the reader is left just past the
    /// archive.
    #[instrument(skip(reader), err)]
    pub fn new<R: Read>(mut reader: R) -> Result<SarcArchive> {
        let prefix = SarcPrefix::read(&mut NoSeek::new(&mut reader))?;
        let endianness = Endianness::from_bom(prefix.bom).ok_or(Error::InvalidFormat)?;
        debug!(%endianness, "reading sarc archive");

        match endianness {
            Endianness::Big => Self::read_body::<BigEndian, _>(&mut reader, endianness),
            Endianness::Little => Self::read_body::<LittleEndian, _>(&mut reader, endianness),
        }
    }

    fn read_body<B: ByteOrder, R: Read>(
        reader: &mut R,
        endianness: Endianness,
    ) -> Result<SarcArchive> {
        let header = SarcHeader::read_rest::<B>(reader, endianness)?;
        if header.version != SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }

        let sfat = SfatHeader::read::<B>(reader)?;
        let table = (0..sfat.node_count)
            .map(|_| SfatEntry::read::<B>(reader))
            .collect::<Result<Vec<_>>>()?;
        SfntHeader::read(reader)?;

        let table_end = SarcHeader::SIZE
            + SfatHeader::SIZE
            + SfatEntry::SIZE * sfat.node_count as u32
            + SfntHeader::SIZE;
        let pool_len = header.data_start.checked_sub(table_end).ok_or_else(|| {
            Error::CorruptArchive(format!(
                "data starts at {} inside the tables ending at {table_end}",
                header.data_start
            ))
        })?;
        let pool = read_exactly(reader, pool_len as u64, "name table")?;

        let mut entries = IndexMap::with_capacity(table.len());
        let mut data_len = 0usize;
        for (index, entry) in table.iter().enumerate() {
            if !entry.has_name() {
                warn!(index, "skipping sarc entry without a name");
                continue;
            }
            if entry.begin > entry.end {
                return Err(Error::CorruptArchive(format!(
                    "entry {index} begins at {} after its end {}",
                    entry.begin, entry.end
                )));
            }

            let name = read_name(&pool, entry.name_offset())?;
            let hash = hash_name(name, sfat.hash_key);
            let name = latin1(name);
            if hash != entry.hash {
                return Err(Error::CorruptArchive(format!(
                    "name {name:?} hashes to {hash:#010x} but the table says {:#010x}",
                    entry.hash
                )));
            }

            let range = entry.begin as usize..entry.end as usize;
            data_len = data_len.max(range.end);
            let entry = SarcEntry { hash, range };
            if let Some(previous) = entries.insert(name, entry) {
                warn!(hash = previous.hash, "duplicate sarc name, keeping the later entry");
            }
        }

        let data = read_exactly(reader, data_len as u64, "file data")?;

        // The archive may be padded past the last entry
        let trailing = (header.file_size as u64)
            .saturating_sub(header.data_start as u64 + data_len as u64);
        let skipped = io::copy(&mut reader.by_ref().take(trailing), &mut io::sink())?;
        if skipped < trailing {
            debug!(skipped, trailing, "archive ended inside its trailing padding");
        }

        debug!(
            entries = entries.len(),
            data = data.len(),
            "parsed sarc archive"
        );

        Ok(SarcArchive {
            header,
            hash_key: sfat.hash_key,
            entries,
            data,
        })
    }

    /// Get the parsed archive header
    pub fn header(&self) -> &SarcHeader {
        &self.header
    }

    /// Byte order the archive was stored in
    pub fn endianness(&self) -> Endianness {
        self.header.endianness
    }

    /// Multiplier used to hash the names in this archive
    pub fn hash_key(&self) -> u32 {
        self.hash_key
    }

    /// Number of named entries contained in this SARC.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this SARC archive contains no named entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The data of an entry, `None` if no entry has this name
    pub fn by_name(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|entry| &self.data[entry.range.clone()])
    }

    /// The table entry for a name
    pub fn entry(&self, name: &str) -> Option<&SarcEntry> {
        self.entries.get(name)
    }

    /// Get the index of an entry by name, if it's present.
    #[inline(always)]
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    /// The name and data of the entry at `index`, in table order
    pub fn by_index(&self, index: usize) -> Option<(&str, &[u8])> {
        self.entries
            .get_index(index)
            .map(|(name, entry)| (name.as_ref(), &self.data[entry.range.clone()]))
    }

    /// Returns an iterator over all the entry names, in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_ref())
    }

    /// Returns an iterator over every entry's name and data, in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_ref(), &self.data[entry.range.clone()]))
    }

    /// The data region shared by all entries
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn read_exactly(reader: &mut impl Read, len: u64, section: &'static str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buffer)?;
    if (buffer.len() as u64) < len {
        return Err(Error::TruncatedStream(section));
    }
    Ok(buffer)
}

/// The name at `offset`, up to a NUL or the end of the pool
fn read_name(pool: &[u8], offset: usize) -> Result<&[u8]> {
    let tail = pool.get(offset..).ok_or_else(|| {
        Error::CorruptArchive(format!(
            "name offset {offset} is outside the {} byte name table",
            pool.len()
        ))
    })?;
    let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(&tail[..len])
}

/// Names are stored as ISO-8859-1
fn latin1(bytes: &[u8]) -> Box<str> {
    bytes.iter().map(|&b| b as char).collect::<String>().into()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::read::{latin1, read_name};

    #[test]
    fn name_until_nul_or_end() {
        let pool = b"abc\0\0\0\0\0tail";
        assert_eq!(read_name(pool, 0).ok(), Some(&b"abc"[..]));
        assert_eq!(read_name(pool, 8).ok(), Some(&b"tail"[..]));
        assert_eq!(read_name(pool, 12).ok(), Some(&b""[..]));
        assert!(read_name(pool, 13).is_err());
    }

    #[test]
    fn latin1_names() {
        assert_eq!(&*latin1(b"caf\xE9.bin"), "café.bin");
    }
}
