//! Reading file data out of an archive.
//!
//! Every [`U8File`] shares the archive's single reader. The reader remembers which handle moved it
//! last, a handle only seeks before reading when another one has used the reader since.

use std::io::{self, Read, Seek, SeekFrom};

use derive_more::{Display, From, Into};
use tracing::trace;

use crate::{
    error::{Error, Result},
    node::NodeId,
    read::U8Archive,
};

/// Identifies an open [`U8File`] within its archive
#[derive(Debug, Display, From, Into, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

/// The archive's reader and the handle that last positioned it
pub(crate) struct SharedSource<R> {
    pub(crate) source: Option<R>,
    pub(crate) owner: Option<HandleId>,
}

impl<R> SharedSource<R> {
    pub(crate) fn new(source: R) -> Self {
        SharedSource {
            source: Some(source),
            owner: None,
        }
    }
}

/// A file opened from a [`U8Archive`]
///
/// Reads are limited to the file's data, seeking past the end is allowed and reads there return
/// nothing. Dropping the handle closes it.
pub struct U8File<'a, R> {
    archive: &'a U8Archive<R>,
    handle: HandleId,
    id: NodeId,
    /// Absolute position of the data in the reader
    start: u64,
    size: u64,
    position: u64,
    open: bool,
}

impl<R> std::fmt::Debug for U8File<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("U8File")
            .field("handle", &self.handle)
            .field("node", &self.id)
            .field("size", &self.size)
            .field("position", &self.position)
            .field("open", &self.open)
            .finish()
    }
}

impl<'a, R> U8File<'a, R> {
    pub(crate) fn new(
        archive: &'a U8Archive<R>,
        handle: HandleId,
        id: NodeId,
        data_offset: u32,
        size: u32,
    ) -> Self {
        U8File {
            archive,
            handle,
            id,
            start: archive.base() + data_offset as u64,
            size: size as u64,
            position: 0,
            open: true,
        }
    }

    /// Size of the file data
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current read position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The node this file was opened from
    pub fn node(&self) -> NodeId {
        self.id
    }

    /// Identifier of this handle
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    /// Whether neither this handle nor its archive has been closed
    pub fn is_open(&self) -> bool {
        self.open && self.archive.is_open()
    }

    /// Close the handle. Further reads and seeks fail with [`Error::HandleClosed`].
    pub fn close(&mut self) {
        if self.open {
            self.release();
            self.open = false;
            trace!(handle = %self.handle, "closed u8 file");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::HandleClosed)
        }
    }

    /// Give up the reader's position so the next read seeks again
    fn release(&self) {
        let mut shared = self.archive.lock();
        if shared.owner == Some(self.handle) {
            shared.owner = None;
        }
    }
}

impl<R: Read + Seek> U8File<'_, R> {
    fn read_shared(&self, shared: &mut SharedSource<R>, buf: &mut [u8]) -> io::Result<usize> {
        let owner = shared.owner;
        let source = shared.source.as_mut().ok_or(Error::HandleClosed)?;
        if owner != Some(self.handle) {
            source.seek(SeekFrom::Start(self.start + self.position))?;
            shared.owner = Some(self.handle);
        }

        let read = source.read(buf)?;
        if read == 0 {
            return Err(Error::TruncatedStream("file data").into());
        }
        Ok(read)
    }
}

impl<R: Read + Seek> Read for U8File<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;

        let remaining = self.size.saturating_sub(self.position);
        let wanted = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        if wanted == 0 {
            return Ok(0);
        }

        let mut shared = self.archive.lock();
        match self.read_shared(&mut shared, &mut buf[..wanted]) {
            Ok(read) => {
                self.position += read as u64;
                Ok(read)
            }
            Err(e) => {
                // The reader's position is unknown after a failure
                shared.owner = None;
                Err(e)
            }
        }
    }
}

impl<R: Read + Seek> Seek for U8File<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.ensure_open()?;

        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.size.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        if target != self.position {
            self.release();
            self.position = target;
        }
        Ok(target)
    }
}

impl<R> Drop for U8File<'_, R> {
    fn drop(&mut self) {
        self.close();
    }
}
