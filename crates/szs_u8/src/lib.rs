//! This library reads **U8** archives, the directory tree format found inside many `.szs` files.
//!
//! # U8 Archive Format Documentation
//!
//! A U8 archive stores a tree of named files and directories. All nodes live in one flat table,
//! a directory owns the contiguous run of nodes that follows it.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x55AA382D                                        |
//! | 0x0004         | Node Table Offset      | 4 bytes: Offset to the first node record                   |
//! | 0x0008         | Tree Size              | 4 bytes: Size of the node table and string pool            |
//! | 0x000C         | Data Offset            | 4 bytes: Offset to the file data region                    |
//!
//! Offsets are counted from the first byte of the archive.
//!
//! ### Node Records
//!
//! Each record is 12 bytes. The first record is the root directory, its end index is the total
//! number of nodes in the table.
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Type                   | 1 byte: `0` for a file, anything else for a directory   |
//! | 0x0001         | Name Offset            | 3 bytes: Offset of the name in the string pool          |
//! | 0x0004         | Data Offset / Parent   | 4 bytes: File data offset, or index of the parent       |
//! | 0x0008         | Size / End             | 4 bytes: File size, or one past the subtree's last node |
//!
//! ### String Pool
//!
//! Names are NUL terminated byte strings stored right after the last node record.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.arc`, `.u8`, or inside `.szs`
//! - **Endianness**: Big-endian for all multi-byte integers
//! - Many archives keep their content below a directory named `.`, see
//!   [`U8Archive::content_root`]
//!

pub mod error;
pub mod file;
pub mod node;
pub mod read;
pub mod types;
pub mod walk;

pub use file::{HandleId, U8File};
pub use node::{Node, NodeId, NodeKind};
pub use read::U8Archive;
pub use types::U8_MAGIC;
pub use walk::{Walk, WalkEvent};
