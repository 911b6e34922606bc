//! Recognizing archive formats by their leading magic number

use std::io::{self, Chain, Cursor, Read, Seek, SeekFrom};

use derive_more::Display;

/// The formats an archive, or a layer of one, can be stored in
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Format {
    /// Yaz0 compression wrapped around another format
    #[display("Yaz0")]
    Yaz0,

    /// U8 directory tree archive
    #[display("U8")]
    U8,

    /// SARC flat archive
    #[display("SARC")]
    Sarc,
}

impl Format {
    /// The big endian magic number that starts this format
    pub fn magic(self) -> u32 {
        match self {
            Format::Yaz0 => szs_yaz0::YAZ0_MAGIC,
            Format::U8 => szs_u8::U8_MAGIC,
            Format::Sarc => szs_sarc::SARC_MAGIC,
        }
    }

    /// The format starting with `magic`, if any
    pub fn from_magic(magic: u32) -> Option<Format> {
        [Format::Yaz0, Format::U8, Format::Sarc]
            .into_iter()
            .find(|format| format.magic() == magic)
    }
}

/// Classify a buffer by its first four bytes. Buffers shorter than that have no format.
pub fn detect(data: &[u8]) -> Option<Format> {
    let magic = data.get(..4)?.try_into().ok()?;
    Format::from_magic(u32::from_be_bytes(magic))
}

/// Read up to four bytes, fewer only when the input ends first
fn read_magic(reader: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut magic = Vec::with_capacity(4);
    reader.take(4).read_to_end(&mut magic)?;
    Ok(magic)
}

/// The first bytes of a seekable input, the position of `reader` is left unchanged
pub fn peek_magic<R: Read + Seek>(reader: &mut R) -> io::Result<Vec<u8>> {
    let start = reader.stream_position()?;
    let magic = read_magic(reader)?;
    reader.seek(SeekFrom::Start(start))?;
    Ok(magic)
}

/// Classify a seekable input without moving it
pub fn detect_seekable<R: Read + Seek>(reader: &mut R) -> io::Result<Option<Format>> {
    Ok(detect(&peek_magic(reader)?))
}

/// Classify a stream that can't seek.
///
/// The returned reader yields the bytes that were inspected followed by the rest of `reader`, as
/// if nothing had been read.
pub fn detect_stream<R: Read>(
    mut reader: R,
) -> io::Result<(Option<Format>, Chain<Cursor<Vec<u8>>, R>)> {
    let magic = read_magic(&mut reader)?;
    let format = detect(&magic);
    Ok((format, Cursor::new(magic).chain(reader)))
}
