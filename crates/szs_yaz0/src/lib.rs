//! This library decodes **Yaz0** compressed data, the wrapper used around most `.szs` game assets.
//!
//! # Yaz0 Format Documentation
//!
//! Yaz0 is a byte oriented LZ77 variant. A stream is a small header followed by groups of
//! operations, each operation either copying one literal byte or repeating a run of bytes that
//! were already produced.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x59617A30 ("Yaz0")                               |
//! | 0x0004         | Uncompressed Size      | 4 bytes: Size of the data once decompressed                |
//! | 0x0008         | Reserved               | 8 bytes: Unused by the decoder                             |
//! | 0x0010         | Data                   | Groups of operations until the output is complete          |
//!
//! ### Groups
//!
//! Each group starts with one control byte. Its bits, from the most significant down, describe
//! up to eight operations that follow:
//!
//! - **1**: copy the next input byte to the output.
//! - **0**: a back-reference. Two bytes `b1 b2` follow. The distance back from the current output
//!   position is `((b1 & 0x0F) << 8 | b2) + 1`. When the high nibble of `b1` is zero a third byte
//!   `b3` follows and the run length is `b3 + 0x12`, otherwise it is `(b1 >> 4) + 2`.
//!
//! Runs are copied one byte at a time, so a distance shorter than the length repeats a pattern.
//! Decoding stops as soon as the declared size has been produced, the rest of the final group is
//! ignored.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.szs` (usually wrapping a U8 or SARC archive)
//! - **Endianness**: Big-endian
//!

pub mod error;
pub mod read;
pub mod types;

pub use read::{decompress, Yaz0Reader};
pub use types::YAZ0_MAGIC;
