//! Types for reading U8 archives
//!

use binrw::BinRead;
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Seek, SeekFrom},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, Result},
    file::{HandleId, SharedSource, U8File},
    node::{Node, NodeId, NodeKind},
    types::{U8Header, U8NodeRecord},
    walk::Walk,
};

/// U8 archive reader
///
/// The whole node table is parsed when the archive is opened, file contents are only read when a
/// [`U8File`] asks for them. Any number of file handles can be open at once, they share the
/// archive's reader.
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn dump_u8_contents(reader: impl Read + Seek) -> szs_u8::error::Result<()> {
///     let u8 = szs_u8::U8Archive::new(reader)?;
///
///     for event in u8.walk(u8.root())? {
///         if let szs_u8::WalkEvent::File(id) = event {
///             println!("{}", u8.node(id)?.name);
///             std::io::copy(&mut u8.open_file(id)?, &mut std::io::stdout())?;
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub struct U8Archive<R> {
    header: U8Header,
    /// Position of the archive in the reader it was opened from
    base: u64,
    nodes: Vec<Node>,
    content_root: NodeId,
    shared: Mutex<SharedSource<R>>,
    next_handle: AtomicU64,
    closed: AtomicBool,
}

impl<R> Debug for U8Archive<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("U8Archive")
            .field("header", &self.header)
            .field("nodes", &self.nodes.len())
            .field("open", &self.is_open())
            .finish()
    }
}

impl<R> U8Archive<R> {
    /// Get the parsed archive header
    pub fn header(&self) -> &U8Header {
        &self.header
    }

    /// Number of nodes, files and directories, in this archive
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`, every archive has at least its root directory
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first node of the table
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// The directory holding the archive's content.
    ///
    /// Archives commonly nest everything below a directory named `.`; this follows that chain from
    /// the root and returns the innermost one, or the root when there is none.
    pub fn content_root(&self) -> NodeId {
        self.content_root
    }

    /// Whether [`U8Archive::close`] has not been called yet
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::HandleClosed)
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.ensure_open()?;
        self.nodes.get(id.index()).ok_or(Error::InvalidNode(id))
    }

    /// The ordered children of a directory
    pub fn children(&self, id: NodeId) -> Result<&IndexMap<Box<str>, NodeId>> {
        self.node(id)?.children().ok_or(Error::NotADirectory(id))
    }

    /// Find a direct child of a directory by name
    pub fn child(&self, id: NodeId, name: &str) -> Result<Option<NodeId>> {
        Ok(self.children(id)?.get(name).copied())
    }

    /// The directory containing a node. The root is its own parent.
    pub fn parent(&self, id: NodeId) -> Result<NodeId> {
        Ok(self.node(id)?.parent)
    }

    /// Every directory above a node, outermost first. Empty for the root.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == current {
                break;
            }
            result.push(parent);
            current = parent;
        }
        result.reverse();
        Ok(result)
    }

    /// Follow names down from a directory.
    ///
    /// Names are matched literally, `.` only matches a child called `.`. Returns `None` when a name
    /// does not exist and [`Error::NotADirectory`] when a name other than the last one is a file.
    pub fn resolve<'s>(
        &self,
        from: NodeId,
        names: impl IntoIterator<Item = &'s str>,
    ) -> Result<Option<NodeId>> {
        let mut current = from;
        for name in names {
            match self.child(current, name)? {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Iterate over a node and everything below it, depth first in declaration order
    pub fn walk(&self, from: NodeId) -> Result<Walk<'_, R>> {
        self.node(from)?;
        Ok(Walk::new(self, from))
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn base(&self) -> u64 {
        self.base
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SharedSource<R>> {
        self.shared.lock().unwrap_or_else(|poisoned| {
            // A reader panicked mid-read, the physical position can't be trusted
            let mut guard = poisoned.into_inner();
            guard.owner = None;
            guard
        })
    }

    /// Close the archive.
    ///
    /// The reader is dropped, every node accessor and every open [`U8File`] fails with
    /// [`Error::HandleClosed`] from now on. Closing twice is a no-op.
    #[instrument(skip(self))]
    pub fn close(&self) {
        let mut shared = self.lock();
        shared.source = None;
        shared.owner = None;
        self.closed.store(true, Ordering::Release);
        debug!("closed u8 archive");
    }

    /// Unwrap and return the inner reader object, `None` if the archive was closed
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> Option<R> {
        self.shared
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .source
    }
}

impl<R: Read + Seek> U8Archive<R> {
    /// Read a U8 archive starting at the current position of `reader`.
    ///
    /// Offsets in the archive are relative to that position. The node table is validated
    /// completely, a corrupt archive is never partially returned.
    #[instrument(skip(reader), err)]
    pub fn new(mut reader: R) -> Result<U8Archive<R>> {
        let base = reader.stream_position()?;
        let header = U8Header::read(&mut reader)?;
        let tree = Self::get_tree(&mut reader, base, &header)?;
        let nodes = build_tree(&tree)?;
        let content_root = find_content_root(&nodes);

        debug!(
            nodes = nodes.len(),
            content_root = %content_root,
            "parsed u8 node table"
        );

        Ok(U8Archive {
            header,
            base,
            nodes,
            content_root,
            shared: Mutex::new(SharedSource::new(reader)),
            next_handle: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Open a file for reading
    pub fn open_file(&self, id: NodeId) -> Result<U8File<'_, R>> {
        let node = self.node(id)?;
        let NodeKind::File { data_offset, size } = node.kind else {
            return Err(Error::NotAFile(id));
        };

        let handle = HandleId::from(self.next_handle.fetch_add(1, Ordering::Relaxed));
        Ok(U8File::new(self, handle, id, data_offset, size))
    }

    fn get_tree(reader: &mut R, base: u64, header: &U8Header) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(base + header.first_node_offset as u64))?;

        let mut tree = Vec::new();
        reader
            .by_ref()
            .take(header.tree_len as u64)
            .read_to_end(&mut tree)?;
        if tree.len() < header.tree_len as usize {
            return Err(Error::TruncatedStream("node table"));
        }
        Ok(tree)
    }
}

fn corrupt(message: impl Into<String>) -> Error {
    Error::CorruptArchive(message.into())
}

fn read_name(pool: &[u8], offset: u32) -> Result<Box<str>> {
    let start = offset as usize;
    let tail = pool
        .get(start..)
        .ok_or_else(|| corrupt(format!("name offset {offset} is outside the string pool")))?;
    let len = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| corrupt(format!("name at offset {offset} is not terminated")))?;
    Ok(String::from_utf8_lossy(&tail[..len]).into())
}

/// Build the node arena from the raw node table and string pool
fn build_tree(tree: &[u8]) -> Result<Vec<Node>> {
    let mut cursor = Cursor::new(tree);
    let root = U8NodeRecord::read(&mut cursor).map_err(|e| match Error::from(e) {
        Error::TruncatedStream(_) => corrupt("node table is empty"),
        other => other,
    })?;
    if !root.is_directory() {
        return Err(corrupt("root node is not a directory"));
    }
    if root.field1 != 0 {
        return Err(corrupt(format!(
            "root node names {} as its parent instead of itself",
            root.field1
        )));
    }

    let count = root.field2;
    if count == 0 || count as u64 * U8NodeRecord::SIZE as u64 > tree.len() as u64 {
        return Err(corrupt(format!(
            "node table of {count} nodes does not fit in {} bytes",
            tree.len()
        )));
    }

    cursor.set_position(0);
    let records = (0..count)
        .map(|_| U8NodeRecord::read(&mut cursor).map_err(Error::from))
        .collect::<Result<Vec<_>>>()?;
    let pool = &tree[count as usize * U8NodeRecord::SIZE..];

    let mut nodes = Vec::with_capacity(count as usize);
    nodes.push(Node {
        name: read_name(pool, root.name_offset)?,
        parent: NodeId::ROOT,
        kind: NodeKind::Directory {
            children: IndexMap::new(),
            end: count,
        },
    });

    // Directories whose subtree is still being scanned, with the end of that subtree
    let mut open_dirs = vec![(0u32, count)];
    let mut index = 1u32;
    while let Some(&(dir, end)) = open_dirs.last() {
        if index >= end {
            open_dirs.pop();
            continue;
        }

        let record = &records[index as usize];
        let name = read_name(pool, record.name_offset)?;
        let kind = if record.is_directory() {
            let parent = record.field1;
            if parent >= count {
                return Err(corrupt(format!(
                    "directory {index} has parent index {parent} outside the table"
                )));
            }
            if !records[parent as usize].is_directory() {
                return Err(corrupt(format!(
                    "directory {index} has parent {parent} which is not a directory"
                )));
            }
            if parent != dir {
                return Err(corrupt(format!(
                    "directory {index} names {parent} as its parent but is inside {dir}"
                )));
            }
            if record.field2 <= index || record.field2 > end {
                return Err(corrupt(format!(
                    "directory {index} ends at {} outside of ({index}, {end}]",
                    record.field2
                )));
            }

            open_dirs.push((index, record.field2));
            NodeKind::Directory {
                children: IndexMap::new(),
                end: record.field2,
            }
        } else {
            NodeKind::File {
                data_offset: record.field1,
                size: record.field2,
            }
        };

        let id = NodeId::from(index);
        if let NodeKind::Directory { children, .. } = &mut nodes[dir as usize].kind {
            if children.insert(name.clone(), id).is_some() {
                warn!(%name, directory = dir, "duplicate name, keeping the later node");
            }
        }
        nodes.push(Node {
            name,
            parent: NodeId::from(dir),
            kind,
        });
        index += 1;
    }

    Ok(nodes)
}

fn find_content_root(nodes: &[Node]) -> NodeId {
    let mut current = NodeId::ROOT;
    while let Some(&next) = nodes[current.index()]
        .children()
        .and_then(|children| children.get("."))
    {
        if !nodes[next.index()].is_dir() {
            break;
        }
        current = next;
    }
    current
}
