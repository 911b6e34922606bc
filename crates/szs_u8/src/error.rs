//! Error types that can be emitted from this library

use std::io;

use miette::Diagnostic;
use thiserror::Error;

use crate::node::NodeId;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(binrw::Error),

    /// data does not start with the U8 magic
    #[error("file is not a U8 archive")]
    InvalidFormat,

    /// the archive ended before its header or node table was complete
    #[error("archive ended before its {0} was complete")]
    TruncatedStream(&'static str),

    /// the node table is inconsistent
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// the archive, or the file handle, has been closed
    #[error("the archive or file handle has been closed")]
    HandleClosed,

    /// a file operation was attempted on a directory
    #[error("node {0} is a directory, not a file")]
    NotAFile(NodeId),

    /// a directory operation was attempted on a file
    #[error("node {0} is a file, not a directory")]
    NotADirectory(NodeId),

    /// the node id does not belong to this archive
    #[error("node {0} does not exist in this archive")]
    InvalidNode(NodeId),
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        if matches!(value.root_cause(), binrw::Error::BadMagic { .. }) {
            return Error::InvalidFormat;
        }
        if value.is_eof() {
            return Error::TruncatedStream("header");
        }
        match value {
            binrw::Error::Io(e) => Error::IOError(e),
            other => Error::BinRWError(other),
        }
    }
}

/// Recovers an archive error that travelled through [`std::io::Read`] or [`std::io::Seek`].
impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        if !value.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::IOError(value);
        }

        let kind = value.kind();
        match value.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(other)) => Error::IOError(io::Error::new(kind, other)),
            None => Error::IOError(kind.into()),
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::IOError(e) => e,
            e @ Error::TruncatedStream(_) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            e @ (Error::NotAFile(_) | Error::NotADirectory(_) | Error::InvalidNode(_)) => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            e @ Error::HandleClosed => io::Error::new(io::ErrorKind::Other, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
