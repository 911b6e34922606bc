//! The in-memory node graph of a U8 archive.
//!
//! Nodes are stored in an arena indexed by their position in the archive's node table, parent and
//! child links are plain [`NodeId`]s into that arena.

use derive_more::{Display, From, Into};
use indexmap::IndexMap;

/// Index of a node in the archive's node table
#[derive(Debug, Display, From, Into, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The root directory, always the first node of the table
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A file or directory in the archive
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Name of the node, without any parent directories
    pub name: Box<str>,

    /// The directory containing this node. The root is its own parent.
    pub parent: NodeId,

    /// What kind of node this is
    pub kind: NodeKind,
}

/// Data specific to files or directories
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A directory and its direct children, in the order they are declared
    Directory {
        /// Children by name
        children: IndexMap<Box<str>, NodeId>,
        /// Index one past the last node in this directory's subtree
        end: u32,
    },

    /// A file stored in the archive's data region
    File {
        /// Offset of the file data from the start of the archive
        data_offset: u32,
        /// Size of the file data
        size: u32,
    },
}

impl Node {
    /// Whether this node is a directory
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Whether this node is a file
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Size of the file data, `0` for directories
    pub fn size(&self) -> u32 {
        match self.kind {
            NodeKind::File { size, .. } => size,
            NodeKind::Directory { .. } => 0,
        }
    }

    /// The children of a directory, `None` for files
    pub fn children(&self) -> Option<&IndexMap<Box<str>, NodeId>> {
        match &self.kind {
            NodeKind::Directory { children, .. } => Some(children),
            NodeKind::File { .. } => None,
        }
    }
}
