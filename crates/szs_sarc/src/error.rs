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

    /// data does not start with the SARC magic or has an unknown byte order mark
    #[error("file is not a SARC archive")]
    InvalidFormat,

    /// the archive declares a version other than `0x0100`
    #[error("unsupported SARC version {0:#06x}")]
    UnsupportedVersion(u16),

    /// the tables of the archive are inconsistent
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// the archive ended before the named section was complete
    #[error("archive ended before its {0} was complete")]
    TruncatedStream(&'static str),
}

impl Error {
    /// Adapter for `map_err` turning an early end of input into [`Error::TruncatedStream`]
    pub(crate) fn truncated(section: &'static str) -> impl Fn(io::Error) -> Error {
        move |e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::TruncatedStream(section)
            } else {
                Error::from(e)
            }
        }
    }
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

/// Recovers an archive error that travelled through [`std::io::Read`].
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
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
