//! Error types that can be emitted from this library

use std::{io, path::PathBuf};

use derive_more::Display;
use miette::Diagnostic;
use thiserror::Error;

use crate::path::VirtualPath;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(io::Error),

    /// Errors from decompressing a Yaz0 layer
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaz0(#[from] szs_yaz0::error::Error),

    /// Errors from a U8 archive
    #[error(transparent)]
    #[diagnostic(transparent)]
    U8(#[from] szs_u8::error::Error),

    /// Errors from a SARC archive
    #[error(transparent)]
    #[diagnostic(transparent)]
    Sarc(#[from] szs_sarc::error::Error),

    /// the input does not start with the magic of any known format
    #[error("unknown archive format, the input starts with {0:02X?}")]
    #[diagnostic(help("supported formats are Yaz0, U8 and SARC"))]
    UnknownFormat(Vec<u8>),

    /// no node exists at the path
    #[error("{0} does not exist in the archive")]
    NotFound(VirtualPath),

    /// the path names a directory where a file was expected
    #[error("{0} is a directory, not a file")]
    NotAFile(VirtualPath),

    /// the path goes through a file where a directory was expected
    #[error("{0} is a file, not a directory")]
    NotADirectory(VirtualPath),

    /// the archive or file handle has been closed
    #[error("the archive or file handle has been closed")]
    HandleClosed,

    /// the registry already holds an archive for this file
    #[error("{} is already open", .0.display())]
    AlreadyOpen(PathBuf),

    /// the registry holds no archive for this file
    #[error("{} is not open", .0.display())]
    NotOpen(PathBuf),

    /// more Yaz0 layers than allowed are wrapped around each other
    #[error("more than {0} nested compression layers")]
    #[diagnostic(help("raise the maximum wrapper depth if the file is genuine"))]
    NestingTooDeep(usize),

    /// a Yaz0 layer declares more output than allowed
    #[error("compressed layer declares {declared} bytes, more than the limit of {limit}")]
    TooLarge {
        /// Size declared in the Yaz0 header
        declared: u64,
        /// Configured maximum
        limit: u64,
    },
}

/// Broad classes of [`Error`], independent of the format that produced them
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown or mismatched magic
    InvalidFormat,
    /// A format version this library does not read
    UnsupportedVersion,
    /// Inconsistent archive tables
    CorruptArchive,
    /// Input ended too early
    TruncatedStream,
    /// Undecodable compressed data
    CorruptStream,
    /// Use after close
    HandleClosed,
    /// Directory used as a file
    NotAFile,
    /// File used as a directory
    NotADirectory,
    /// Missing node
    NotFound,
    /// Failure of the underlying reader
    Io,
    /// Misuse of an [`crate::ArchiveRegistry`]
    Registry,
    /// A configured limit was exceeded
    Limit,
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        use szs_sarc::error::Error as Sarc;
        use szs_u8::error::Error as U8;
        use szs_yaz0::error::Error as Yaz0;

        match self {
            Error::IOError(_) => ErrorKind::Io,
            Error::Yaz0(e) => match e {
                Yaz0::IOError(_) | Yaz0::BinRWError(_) => ErrorKind::Io,
                Yaz0::InvalidFormat => ErrorKind::InvalidFormat,
                Yaz0::TruncatedHeader | Yaz0::TruncatedStream { .. } => ErrorKind::TruncatedStream,
                Yaz0::CorruptStream { .. } => ErrorKind::CorruptStream,
            },
            Error::U8(e) => match e {
                U8::IOError(_) | U8::BinRWError(_) => ErrorKind::Io,
                U8::InvalidFormat => ErrorKind::InvalidFormat,
                U8::TruncatedStream(_) => ErrorKind::TruncatedStream,
                U8::CorruptArchive(_) => ErrorKind::CorruptArchive,
                U8::HandleClosed => ErrorKind::HandleClosed,
                U8::NotAFile(_) => ErrorKind::NotAFile,
                U8::NotADirectory(_) => ErrorKind::NotADirectory,
                U8::InvalidNode(_) => ErrorKind::NotFound,
            },
            Error::Sarc(e) => match e {
                Sarc::IOError(_) | Sarc::BinRWError(_) => ErrorKind::Io,
                Sarc::InvalidFormat => ErrorKind::InvalidFormat,
                Sarc::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
                Sarc::CorruptArchive(_) => ErrorKind::CorruptArchive,
                Sarc::TruncatedStream(_) => ErrorKind::TruncatedStream,
            },
            Error::UnknownFormat(_) => ErrorKind::InvalidFormat,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::NotAFile(_) => ErrorKind::NotAFile,
            Error::NotADirectory(_) => ErrorKind::NotADirectory,
            Error::HandleClosed => ErrorKind::HandleClosed,
            Error::AlreadyOpen(_) | Error::NotOpen(_) => ErrorKind::Registry,
            Error::NestingTooDeep(_) | Error::TooLarge { .. } => ErrorKind::Limit,
        }
    }
}

/// Recovers a library error that travelled through [`std::io::Read`] or [`std::io::Seek`].
impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        let Some(inner) = value.get_ref() else {
            return Error::IOError(value);
        };
        if !(inner.is::<Error>()
            || inner.is::<szs_u8::error::Error>()
            || inner.is::<szs_yaz0::error::Error>())
        {
            return Error::IOError(value);
        }

        let kind = value.kind();
        let Some(inner) = value.into_inner() else {
            return Error::IOError(kind.into());
        };
        let inner = match inner.downcast::<Error>() {
            Ok(e) => return *e,
            Err(other) => other,
        };
        let inner = match inner.downcast::<szs_u8::error::Error>() {
            Ok(e) => return Error::U8(*e),
            Err(other) => other,
        };
        match inner.downcast::<szs_yaz0::error::Error>() {
            Ok(e) => Error::Yaz0(*e),
            Err(other) => Error::IOError(io::Error::new(kind, other)),
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        let kind = match value.kind() {
            ErrorKind::Io => match value {
                Error::IOError(e) => return e,
                _ => io::ErrorKind::Other,
            },
            ErrorKind::TruncatedStream => io::ErrorKind::UnexpectedEof,
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::NotAFile | ErrorKind::NotADirectory | ErrorKind::Registry => {
                io::ErrorKind::InvalidInput
            }
            ErrorKind::HandleClosed => io::ErrorKind::Other,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, value)
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
