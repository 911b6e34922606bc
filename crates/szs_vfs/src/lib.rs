//! Browse the archives inside `.szs` files as a read only file tree.
//!
//! Game assets are usually shipped as a **U8** or **SARC** archive, often compressed with
//! **Yaz0**. [`Archive`] detects the format of its input, removes the compression and presents
//! either archive as a tree of [`NodeRef`]s addressed by [`VirtualPath`]s. Files are read through
//! [`FileHandle`]s, any number of which may read the same archive at once, from any thread.
//!
//! | Format | Magic        | Crate      | Shape                                  |
//! |--------|--------------|------------|----------------------------------------|
//! | Yaz0   | `Yaz0`       | `szs_yaz0` | Compression around one of the others   |
//! | U8     | `0x55AA382D` | `szs_u8`   | Directory tree                         |
//! | SARC   | `SARC`       | `szs_sarc` | Flat list of named files, shown as `/` |
//!
//! ```no_run
//! use szs_vfs::{Archive, VirtualPath};
//!
//! fn list(path: &str) -> szs_vfs::error::Result<()> {
//!     let archive = Archive::open_path(path)?;
//!     for node in archive.lookup(&VirtualPath::root())?.children()? {
//!         println!("{} {}", node.path()?, node.size()?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod detect;
pub mod error;
pub mod options;
pub mod path;
pub mod registry;

pub use archive::{Archive, ByteSource, FileHandle, NodeRef};
pub use detect::{detect, detect_seekable, detect_stream, Format};
pub use error::{Error, ErrorKind};
pub use options::OpenOptions;
pub use path::VirtualPath;
pub use registry::ArchiveRegistry;
