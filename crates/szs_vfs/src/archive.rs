//! One read only file tree over any supported archive format

use std::{
    fmt::{self, Debug},
    fs::File,
    io::{self, BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use szs_sarc::SarcArchive;
use szs_u8::{NodeId, U8Archive, U8File};
use szs_yaz0::Yaz0Reader;
use tracing::{debug, instrument};

use crate::{
    detect::{detect, peek_magic, Format},
    error::{Error, Result},
    options::OpenOptions,
    path::VirtualPath,
};

/// Anything an archive can be read from
pub trait ByteSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> ByteSource for T {}

type Source = Box<dyn ByteSource>;

enum Contents {
    /// A U8 tree, file data stays in the source until read
    Tree(U8Archive<Source>),
    /// A SARC archive, loaded completely
    Flat(SarcArchive),
}

/// An opened archive
///
/// Yaz0 layers are decompressed while opening, the archive inside is exposed as a tree of
/// [`NodeRef`]s rooted at `/`. U8 archives keep their directories, with paths starting at their
/// content root. SARC archives appear as a single directory holding every entry in table order.
///
/// ```no_run
/// use std::io::Read;
/// use szs_vfs::{Archive, VirtualPath};
///
/// fn print_kmp(path: &str) -> szs_vfs::error::Result<()> {
///     let archive = Archive::open_path(path)?;
///     let node = archive.lookup(&VirtualPath::parse("/course.kmp"))?;
///
///     let mut data = Vec::new();
///     node.open_file()?.read_to_end(&mut data)?;
///     println!("{} is {} bytes", node.path()?, data.len());
///     Ok(())
/// }
/// ```
pub struct Archive {
    contents: Contents,
    wrappers: usize,
    closed: AtomicBool,
}

impl Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Archive")
            .field("format", &self.format())
            .field("wrappers", &self.wrappers)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Archive {
    /// Open an archive with the default [`OpenOptions`]
    pub fn open<R: Read + Seek + Send + 'static>(reader: R) -> Result<Archive> {
        Self::open_with(reader, &OpenOptions::default())
    }

    /// Open the archive stored in a file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Archive> {
        Self::open_path_with(path, &OpenOptions::default())
    }

    /// Open the archive stored in a file, with options
    pub fn open_path_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Archive> {
        let file = File::open(path.as_ref())?;
        Self::open_with(BufReader::new(file), options)
    }

    /// Open an archive starting at the current position of `reader`.
    ///
    /// Every Yaz0 layer is decompressed into memory and the result classified again, until a U8
    /// or SARC archive is found. Opening either fully succeeds or returns an error.
    #[instrument(skip(reader), err)]
    pub fn open_with<R: Read + Seek + Send + 'static>(
        reader: R,
        options: &OpenOptions,
    ) -> Result<Archive> {
        let mut source: Source = Box::new(reader);
        let mut wrappers = 0;

        loop {
            let magic = peek_magic(&mut source)?;
            let Some(format) = detect(&magic) else {
                return Err(Error::UnknownFormat(magic));
            };
            debug!(%format, layer = wrappers, "detected archive layer");

            let contents = match format {
                Format::Yaz0 => {
                    if wrappers >= options.max_wrapper_depth {
                        return Err(Error::NestingTooDeep(options.max_wrapper_depth));
                    }
                    source = Box::new(Cursor::new(decompress_layer(source, options)?));
                    wrappers += 1;
                    continue;
                }
                Format::U8 => Contents::Tree(U8Archive::new(source)?),
                Format::Sarc => Contents::Flat(SarcArchive::new(source)?),
            };

            return Ok(Archive {
                contents,
                wrappers,
                closed: AtomicBool::new(false),
            });
        }
    }

    /// The format of the archive inside any compression layers
    pub fn format(&self) -> Format {
        match self.contents {
            Contents::Tree(_) => Format::U8,
            Contents::Flat(_) => Format::Sarc,
        }
    }

    /// Number of Yaz0 layers that were removed while opening
    pub fn compression_layers(&self) -> usize {
        self.wrappers
    }

    /// Whether [`Archive::close`] has not been called yet
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Close the archive.
    ///
    /// Every node and file handle drawn from it fails with [`Error::HandleClosed`] afterwards.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Contents::Tree(u8) = &self.contents {
            u8.close();
        }
        debug!("closed archive");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::HandleClosed)
        }
    }

    /// The root directory `/`
    pub fn root(&self) -> Result<NodeRef<'_>> {
        self.ensure_open()?;
        let key = match &self.contents {
            Contents::Tree(u8) => NodeKey::Tree(u8.content_root()),
            Contents::Flat(_) => NodeKey::FlatRoot,
        };
        Ok(NodeRef { archive: self, key })
    }

    /// Find the node at `path`, `None` when nothing is there.
    ///
    /// The path is normalized and read from the root whether or not it is absolute. Climbing
    /// above the root with `..` stays at the root.
    #[instrument(skip(self, path), fields(path = %path), err)]
    pub fn resolve(&self, path: &VirtualPath) -> Result<Option<NodeRef<'_>>> {
        self.ensure_open()?;
        let normalized = path.normalize();
        let names = normalized
            .segments()
            .iter()
            .filter(|name| !name.is_empty() && name.as_str() != "..")
            .map(|name| name.as_str())
            .collect::<Vec<_>>();

        let key = match &self.contents {
            Contents::Tree(u8) => {
                let mut current = u8.content_root();
                for (depth, name) in names.iter().enumerate() {
                    let Some(children) = u8.node(current)?.children() else {
                        return Err(Error::NotADirectory(absolute(&names[..depth])));
                    };
                    match children.get(*name) {
                        Some(&child) => current = child,
                        None => return Ok(None),
                    }
                }
                NodeKey::Tree(current)
            }
            Contents::Flat(_) if names.is_empty() => NodeKey::FlatRoot,
            Contents::Flat(sarc) => match sarc.index_for_name(&names.join("/")) {
                Some(index) => NodeKey::FlatEntry(index),
                None => return Ok(None),
            },
        };
        Ok(Some(NodeRef { archive: self, key }))
    }

    /// Like [`Archive::resolve`], failing with [`Error::NotFound`] when nothing is there
    pub fn lookup(&self, path: &VirtualPath) -> Result<NodeRef<'_>> {
        self.resolve(path)?
            .ok_or_else(|| Error::NotFound(path.normalize().to_absolute()))
    }

    fn tree(&self) -> Option<&U8Archive<Source>> {
        match &self.contents {
            Contents::Tree(u8) => Some(u8),
            Contents::Flat(_) => None,
        }
    }

    fn flat(&self) -> Option<&SarcArchive> {
        match &self.contents {
            Contents::Flat(sarc) => Some(sarc),
            Contents::Tree(_) => None,
        }
    }
}

fn decompress_layer(source: Source, options: &OpenOptions) -> Result<Vec<u8>> {
    let reader = Yaz0Reader::new(source)?;
    let declared = reader.uncompressed_size() as u64;
    if declared > options.max_decompressed_len {
        return Err(Error::TooLarge {
            declared,
            limit: options.max_decompressed_len,
        });
    }
    Ok(reader.finish()?)
}

fn absolute(names: &[&str]) -> VirtualPath {
    VirtualPath::from_parts("/", names.iter().copied())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum NodeKey {
    Tree(NodeId),
    FlatRoot,
    FlatEntry(usize),
}

/// A file or directory of an [`Archive`]
///
/// Every accessor fails with [`Error::HandleClosed`] once the archive is closed.
#[derive(Copy, Clone)]
pub struct NodeRef<'a> {
    archive: &'a Archive,
    key: NodeKey,
}

impl Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.path() {
            Ok(path) => write!(f, "NodeRef({path})"),
            Err(_) => write!(f, "NodeRef({:?}, closed)", self.key),
        }
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.archive, other.archive) && self.key == other.key
    }
}

impl Eq for NodeRef<'_> {}

impl<'a> NodeRef<'a> {
    fn sibling(&self, key: NodeKey) -> NodeRef<'a> {
        NodeRef {
            archive: self.archive,
            key,
        }
    }

    /// The node's own name, empty for the root
    pub fn name(&self) -> Result<&'a str> {
        self.archive.ensure_open()?;
        match self.key {
            NodeKey::Tree(id) => {
                let Some(u8) = self.archive.tree() else {
                    return Err(Error::HandleClosed);
                };
                if id == u8.content_root() {
                    return Ok("");
                }
                Ok(&*u8.node(id)?.name)
            }
            NodeKey::FlatRoot => Ok(""),
            NodeKey::FlatEntry(index) => self
                .archive
                .flat()
                .and_then(|sarc| sarc.by_index(index))
                .map(|(name, _)| name)
                .ok_or(Error::HandleClosed),
        }
    }

    /// The absolute path leading to this node
    pub fn path(&self) -> Result<VirtualPath> {
        self.archive.ensure_open()?;
        match self.key {
            NodeKey::Tree(id) => {
                let Some(u8) = self.archive.tree() else {
                    return Err(Error::HandleClosed);
                };
                let content_root = u8.content_root();
                if id == content_root {
                    return Ok(VirtualPath::root());
                }

                let ancestors = u8.ancestors(id)?;
                let below_root = ancestors
                    .iter()
                    .position(|&a| a == content_root)
                    .map_or(&ancestors[..], |i| &ancestors[i + 1..]);

                let mut names = Vec::with_capacity(below_root.len() + 1);
                for &dir in below_root {
                    names.push(&*u8.node(dir)?.name);
                }
                names.push(&*u8.node(id)?.name);
                Ok(absolute(&names))
            }
            NodeKey::FlatRoot => Ok(VirtualPath::root()),
            NodeKey::FlatEntry(_) => Ok(VirtualPath::root().join(self.name()?)),
        }
    }

    /// The directory containing this node. The root is its own parent.
    pub fn parent(&self) -> Result<NodeRef<'a>> {
        self.archive.ensure_open()?;
        let key = match self.key {
            NodeKey::Tree(id) => {
                let Some(u8) = self.archive.tree() else {
                    return Err(Error::HandleClosed);
                };
                if id == u8.content_root() {
                    NodeKey::Tree(id)
                } else {
                    NodeKey::Tree(u8.parent(id)?)
                }
            }
            NodeKey::FlatRoot | NodeKey::FlatEntry(_) => NodeKey::FlatRoot,
        };
        Ok(self.sibling(key))
    }

    /// Whether the node is a directory
    pub fn is_dir(&self) -> Result<bool> {
        self.archive.ensure_open()?;
        Ok(match self.key {
            NodeKey::Tree(id) => self.tree_node_is_dir(id)?,
            NodeKey::FlatRoot => true,
            NodeKey::FlatEntry(_) => false,
        })
    }

    /// Whether the node is a file
    pub fn is_file(&self) -> Result<bool> {
        Ok(!self.is_dir()?)
    }

    fn tree_node_is_dir(&self, id: NodeId) -> Result<bool> {
        match self.archive.tree() {
            Some(u8) => Ok(u8.node(id)?.is_dir()),
            None => Err(Error::HandleClosed),
        }
    }

    /// Size of a file's data, `0` for directories
    pub fn size(&self) -> Result<u64> {
        self.archive.ensure_open()?;
        match self.key {
            NodeKey::Tree(id) => match self.archive.tree() {
                Some(u8) => Ok(u8.node(id)?.size() as u64),
                None => Err(Error::HandleClosed),
            },
            NodeKey::FlatRoot => Ok(0),
            NodeKey::FlatEntry(index) => self
                .archive
                .flat()
                .and_then(|sarc| sarc.by_index(index))
                .map(|(_, data)| data.len() as u64)
                .ok_or(Error::HandleClosed),
        }
    }

    /// The nodes inside a directory, in the order the archive declares them
    pub fn children(&self) -> Result<Vec<NodeRef<'a>>> {
        self.archive.ensure_open()?;
        match self.key {
            NodeKey::Tree(id) => {
                let Some(u8) = self.archive.tree() else {
                    return Err(Error::HandleClosed);
                };
                let Some(children) = u8.node(id)?.children() else {
                    return Err(Error::NotADirectory(self.path()?));
                };
                Ok(children
                    .values()
                    .map(|&child| self.sibling(NodeKey::Tree(child)))
                    .collect())
            }
            NodeKey::FlatRoot => {
                let count = self.archive.flat().map_or(0, SarcArchive::len);
                Ok((0..count)
                    .map(|index| self.sibling(NodeKey::FlatEntry(index)))
                    .collect())
            }
            NodeKey::FlatEntry(_) => Err(Error::NotADirectory(self.path()?)),
        }
    }

    /// Open a file for reading
    pub fn open_file(&self) -> Result<FileHandle<'a>> {
        self.archive.ensure_open()?;
        let inner = match self.key {
            NodeKey::Tree(id) => {
                let Some(u8) = self.archive.tree() else {
                    return Err(Error::HandleClosed);
                };
                match u8.open_file(id) {
                    Ok(file) => HandleInner::Tree(file),
                    Err(szs_u8::error::Error::NotAFile(_)) => {
                        return Err(Error::NotAFile(self.path()?))
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            NodeKey::FlatRoot => return Err(Error::NotAFile(VirtualPath::root())),
            NodeKey::FlatEntry(index) => {
                let (_, data) = self
                    .archive
                    .flat()
                    .and_then(|sarc| sarc.by_index(index))
                    .ok_or(Error::HandleClosed)?;
                HandleInner::Flat {
                    archive: self.archive,
                    data: Cursor::new(data),
                    open: true,
                }
            }
        };
        Ok(FileHandle { inner })
    }
}

enum HandleInner<'a> {
    Tree(U8File<'a, Source>),
    Flat {
        archive: &'a Archive,
        data: Cursor<&'a [u8]>,
        open: bool,
    },
}

/// A file opened from an [`Archive`], readable and seekable
///
/// Handles are independent of each other, each keeps its own position. Reads past the end of
/// the file return nothing.
pub struct FileHandle<'a> {
    inner: HandleInner<'a>,
}

impl Debug for FileHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("size", &self.size())
            .field("position", &self.position())
            .field("open", &self.is_open())
            .finish()
    }
}

impl FileHandle<'_> {
    /// Size of the file data
    pub fn size(&self) -> u64 {
        match &self.inner {
            HandleInner::Tree(file) => file.size(),
            HandleInner::Flat { data, .. } => data.get_ref().len() as u64,
        }
    }

    /// Current read position
    pub fn position(&self) -> u64 {
        match &self.inner {
            HandleInner::Tree(file) => file.position(),
            HandleInner::Flat { data, .. } => data.position(),
        }
    }

    /// Whether neither this handle nor its archive has been closed
    pub fn is_open(&self) -> bool {
        match &self.inner {
            HandleInner::Tree(file) => file.is_open(),
            HandleInner::Flat { archive, open, .. } => *open && archive.is_open(),
        }
    }

    /// Close the handle. Later reads and seeks fail with [`Error::HandleClosed`].
    pub fn close(&mut self) {
        match &mut self.inner {
            HandleInner::Tree(file) => file.close(),
            HandleInner::Flat { open, .. } => *open = false,
        }
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::HandleClosed.into())
        }
    }
}

impl Read for FileHandle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        match &mut self.inner {
            HandleInner::Tree(file) => file.read(buf),
            HandleInner::Flat { data, .. } => data.read(buf),
        }
    }
}

impl Seek for FileHandle<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.ensure_open()?;
        match &mut self.inner {
            HandleInner::Tree(file) => file.seek(pos),
            HandleInner::Flat { data, .. } => data.seek(pos),
        }
    }
}
