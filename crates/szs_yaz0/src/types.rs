//! Base types for structure of a Yaz0 stream.

use binrw::BinRead;

/// Big endian magic at the start of every Yaz0 stream ("Yaz0")
pub const YAZ0_MAGIC: u32 = 0x5961_7A30;

/// Yaz0 stream header
///
/// Always starts with "Yaz0", followed by the size of the decompressed data and eight bytes that
/// are reserved (alignment hints on newer consoles, unused by the decoder).
/// All data is stored in big endian format
#[derive(BinRead, Debug, Copy, Clone, Default, PartialEq)]
#[br(magic = b"Yaz0", big)]
pub struct Yaz0Header {
    /// The number of bytes the stream decompresses to
    pub uncompressed_size: u32,

    /// Reserved bytes
    #[allow(dead_code)]
    pub reserved: [u8; 8],
}

impl Yaz0Header {
    /// Size of the header in the stream, magic included
    pub const SIZE: usize = 16;
}
