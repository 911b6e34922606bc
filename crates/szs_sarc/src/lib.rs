//! This library reads **SARC** archives, the flat archive format found inside newer `.szs` files.
//!
//! # SARC Archive Format Documentation
//!
//! A SARC archive is a flat list of named files. Files are looked up by name through a table sorted
//! by the hash of each name, there are no directories beyond `/` characters inside the names.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x53415243 ("SARC")                               |
//! | 0x0004         | Header Size            | 2 bytes: Always 20                                         |
//! | 0x0006         | Byte Order Mark        | 2 bytes: `FE FF` big endian, `FF FE` little endian         |
//! | 0x0008         | File Size              | 4 bytes: Size of the whole archive                         |
//! | 0x000C         | Data Offset            | 4 bytes: Offset to the file data region                    |
//! | 0x0010         | Version                | 2 bytes: Fixed value 0x0100                                |
//! | 0x0012         | Reserved               | 2 bytes                                                    |
//!
//! ### SFAT Section
//!
//! Follows the header. Starts with the magic "SFAT", a 2 byte header size, the number of entries
//! and the 4 byte hash key, then one 16 byte entry per file:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Name Hash              | 4 bytes: Hash of the file name                          |
//! | 0x0004         | Attributes             | 4 bytes: Bit 24 set when named, low 16 bits name offset |
//! | 0x0008         | Data Begin             | 4 bytes: Start of the data, from the data region        |
//! | 0x000C         | Data End               | 4 bytes: End of the data, from the data region          |
//!
//! The name hash starts at zero and, for every byte of the name, becomes `hash * key + byte`,
//! wrapping at 32 bits.
//!
//! ### SFNT Section
//!
//! The magic "SFNT" and 4 reserved bytes, followed by the NUL terminated ISO-8859-1 names. The name
//! of an entry starts at four times the offset stored in its attributes.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.sarc`, or inside `.szs`
//! - **Endianness**: Given by the byte order mark, magics are always read as big endian
//!

pub mod error;
pub mod read;
pub mod types;

pub use read::{SarcArchive, SarcEntry};
pub use types::{Endianness, SARC_MAGIC};
