//! Error types that can be emitted from this library

use std::io;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(binrw::Error),

    /// stream does not start with the Yaz0 magic
    #[error("stream is not Yaz0 compressed")]
    InvalidFormat,

    /// input ended inside the 16 byte header
    #[error("compressed stream ended inside its header")]
    TruncatedHeader,

    /// input ended before the declared output size was produced
    #[error("compressed stream ended after {produced} of {expected} bytes")]
    TruncatedStream {
        /// Bytes produced before the input ran out
        produced: u64,
        /// Declared decompressed size
        expected: u64,
    },

    /// an operation in the stream cannot be applied to the output
    #[error("corrupt compressed stream at output offset {offset}: {reason}")]
    CorruptStream {
        /// Output position at which the bad operation was decoded
        offset: u64,
        /// What was wrong with the operation
        reason: String,
    },
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        if matches!(value.root_cause(), binrw::Error::BadMagic { .. }) {
            return Error::InvalidFormat;
        }
        if value.is_eof() {
            return Error::TruncatedHeader;
        }
        match value {
            binrw::Error::Io(e) => Error::IOError(e),
            other => Error::BinRWError(other),
        }
    }
}

/// Recovers a codec error that travelled through [`std::io::Read`].
///
/// The decoder reports its own failures as [`io::Error`]s carrying an [`Error`]; any other I/O
/// error is kept as [`Error::IOError`].
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
            e @ (Error::TruncatedStream { .. } | Error::TruncatedHeader) => {
                io::Error::new(io::ErrorKind::UnexpectedEof, e)
            }
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
