//! Base types for structure of U8 file.

use binrw::BinRead;

/// Big endian magic at the start of every U8 archive
pub const U8_MAGIC: u32 = 0x55AA_382D;

/// U8 file header
///
/// Defines the header of the U8 file which always starts with the bytes `55 AA 38 2D`.
/// All data is stored in big endian format
#[derive(BinRead, Debug, Copy, Clone, Default, PartialEq)]
#[br(magic = b"\x55\xAA\x38\x2D", big)]
pub struct U8Header {
    /// The offset from the start of the archive to the first node record
    pub first_node_offset: u32,

    /// The size of the node table and the string pool that follows it
    pub tree_len: u32,

    /// The offset from the start of the archive to the file data
    pub data_offset: u32,
}

/// U8 node record
///
/// Every node in the archive, file or directory, is stored as one of these. The meaning of the
/// last two fields depends on the type of the node.
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(big)]
pub struct U8NodeRecord {
    /// `0` for files, anything else for directories
    pub kind: u8,

    /// The offset from the start of the string pool for this node's name
    #[br(parse_with = binrw::helpers::read_u24)]
    pub name_offset: u32,

    /// Directories: index of the parent node. Files: offset of the data from the archive start
    pub field1: u32,

    /// Directories: index one past the last node of the subtree. Files: size of the data
    pub field2: u32,
}

impl U8NodeRecord {
    /// Size of a record in the node table
    pub const SIZE: usize = 12;

    /// Whether this record describes a directory
    pub fn is_directory(&self) -> bool {
        self.kind != 0
    }
}
