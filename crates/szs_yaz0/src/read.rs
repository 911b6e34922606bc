//! Types for decoding Yaz0 streams
//!

use std::{
    fmt::{self, Debug},
    io::{self, Read},
};

use binrw::{io::NoSeek, BinRead};
use byteorder::ReadBytesExt;
use tracing::{debug, instrument};

use crate::{
    error::{Error, Result},
    types::Yaz0Header,
};

/// Back-references with a length nibble of zero store `length - 0x12` in a third byte
const LONG_COPY_BIAS: usize = 0x12;

/// The first error a decoder ran into, reported again on every later call
#[derive(Debug, Clone)]
enum Failure {
    Truncated { produced: u64, expected: u64 },
    Corrupt { offset: u64, reason: String },
    Io(io::ErrorKind),
}

impl Failure {
    fn from_error(error: &Error) -> Failure {
        match error {
            Error::TruncatedStream { produced, expected } => Failure::Truncated {
                produced: *produced,
                expected: *expected,
            },
            Error::CorruptStream { offset, reason } => Failure::Corrupt {
                offset: *offset,
                reason: reason.clone(),
            },
            Error::IOError(e) => Failure::Io(e.kind()),
            _ => Failure::Io(io::ErrorKind::Other),
        }
    }

    fn to_error(&self) -> Error {
        match self {
            Failure::Truncated { produced, expected } => Error::TruncatedStream {
                produced: *produced,
                expected: *expected,
            },
            Failure::Corrupt { offset, reason } => Error::CorruptStream {
                offset: *offset,
                reason: reason.clone(),
            },
            Failure::Io(kind) => Error::IOError((*kind).into()),
        }
    }
}

/// Streaming Yaz0 decoder
///
/// Operations are decoded on demand as the caller reads, so a corrupt or truncated stream is only
/// reported once the bad part of the stream is reached. After an error the decoder produces
/// nothing more, every later read returns the same error.
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn print_size(reader: impl Read) -> szs_yaz0::error::Result<()> {
///     let mut yaz0 = szs_yaz0::Yaz0Reader::new(reader)?;
///     let mut output = Vec::new();
///     yaz0.read_to_end(&mut output)?;
///     println!("{} bytes", output.len());
///     Ok(())
/// }
/// ```
pub struct Yaz0Reader<R> {
    inner: R,
    header: Yaz0Header,
    /// Every byte produced so far, back-references index into it
    window: Vec<u8>,
    /// Bytes of `window` already handed to the caller
    consumed: usize,
    control: u8,
    pending_ops: u8,
    failure: Option<Failure>,
}

impl<R> Debug for Yaz0Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Yaz0Reader({}/{} bytes)",
            self.window.len(),
            self.uncompressed_size()
        )
    }
}

impl<R> Yaz0Reader<R> {
    /// Size of the data once fully decompressed
    pub fn uncompressed_size(&self) -> usize {
        self.header.uncompressed_size as usize
    }

    /// Number of bytes decoded so far
    pub fn produced(&self) -> usize {
        self.window.len()
    }

    /// Whether every byte of output has been produced
    pub fn is_finished(&self) -> bool {
        self.window.len() == self.uncompressed_size()
    }

    /// Get the parsed stream header
    pub fn header(&self) -> &Yaz0Header {
        &self.header
    }

    /// Unwrap and return the inner reader object
    ///
    /// Once [`Yaz0Reader::is_finished`] returns true the reader sits right after the last
    /// operation that was needed, which is not necessarily the end of the compressed data.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Yaz0Reader<R> {
    /// Read the stream header and prepare to decode
    #[instrument(skip(inner), err)]
    pub fn new(mut inner: R) -> Result<Self> {
        let header = Yaz0Header::read(&mut NoSeek::new(&mut inner))?;
        debug!(size = header.uncompressed_size, "opened yaz0 stream");

        let capacity = (header.uncompressed_size as usize).min(1 << 20);
        Ok(Yaz0Reader {
            inner,
            header,
            window: Vec::with_capacity(capacity),
            consumed: 0,
            control: 0,
            pending_ops: 0,
            failure: None,
        })
    }

    /// Decode the rest of the stream and return the full output
    #[instrument(skip(self), err)]
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.check_failure()?;
        while !self.is_finished() {
            self.step()?;
        }
        Ok(self.window)
    }

    fn next_byte(&mut self) -> Result<u8> {
        match self.inner.read_u8() {
            Ok(byte) => Ok(byte),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::TruncatedStream {
                produced: self.window.len() as u64,
                expected: self.uncompressed_size() as u64,
            }),
            Err(e) => Err(Error::IOError(e)),
        }
    }

    fn corrupt(&self, reason: String) -> Error {
        Error::CorruptStream {
            offset: self.window.len() as u64,
            reason,
        }
    }

    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    /// Decode a single operation. The first error is kept, the stream position is lost with it.
    fn step(&mut self) -> Result<()> {
        self.check_failure()?;
        let result = self.decode_operation();
        if let Err(e) = &result {
            self.failure = Some(Failure::from_error(e));
        }
        result
    }

    /// Decode a single operation, reading a new control byte when the group is used up
    fn decode_operation(&mut self) -> Result<()> {
        if self.pending_ops == 0 {
            self.control = self.next_byte()?;
            self.pending_ops = 8;
        }
        self.pending_ops -= 1;

        let literal = self.control & 0x80 != 0;
        self.control <<= 1;

        if literal {
            let byte = self.next_byte()?;
            self.window.push(byte);
            return Ok(());
        }

        let b1 = self.next_byte()?;
        let b2 = self.next_byte()?;
        let distance = ((((b1 & 0x0F) as usize) << 8) | b2 as usize) + 1;
        if distance > self.window.len() {
            return Err(self.corrupt(format!(
                "back-reference distance {distance} reaches before the start of output"
            )));
        }

        let length = match b1 >> 4 {
            0 => self.next_byte()? as usize + LONG_COPY_BIAS,
            nibble => nibble as usize + 2,
        };
        if length < 3 {
            return Err(self.corrupt(format!("back-reference length {length} is below 3")));
        }
        if self.window.len() + length > self.uncompressed_size() {
            return Err(self.corrupt(format!(
                "back-reference of {length} bytes overflows the declared size {}",
                self.uncompressed_size()
            )));
        }

        // The source may overlap the bytes being written, copy one at a time
        let start = self.window.len() - distance;
        for i in 0..length {
            let byte = self.window[start + i];
            self.window.push(byte);
        }

        Ok(())
    }
}

impl<R: Read> Read for Yaz0Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_failure()?;
        let wanted = buf.len().min(self.uncompressed_size() - self.consumed);
        while self.window.len() - self.consumed < wanted {
            self.step()?;
        }

        buf[..wanted].copy_from_slice(&self.window[self.consumed..self.consumed + wanted]);
        self.consumed += wanted;
        Ok(wanted)
    }
}

/// Decompress a whole Yaz0 stream into memory
#[instrument(skip(reader), err)]
pub fn decompress<R: Read>(reader: R) -> Result<Vec<u8>> {
    Yaz0Reader::new(reader)?.finish()
}
