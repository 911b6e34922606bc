//! Depth first traversal of the node graph

use crate::{node::NodeId, read::U8Archive};

/// A step of a [`Walk`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A directory is entered, its children follow
    Enter(NodeId),

    /// A file is visited
    File(NodeId),

    /// All children of a directory have been visited
    Leave(NodeId),
}

/// Iterator over a subtree of a [`U8Archive`], created by [`U8Archive::walk`]
///
/// Children are visited in the order they are declared in the archive. The walk ends early when
/// the archive is closed.
pub struct Walk<'a, R> {
    archive: &'a U8Archive<R>,
    start: Option<NodeId>,
    /// Directories being visited and the position of the next child to visit
    stack: Vec<(NodeId, usize)>,
}

impl<'a, R> Walk<'a, R> {
    pub(crate) fn new(archive: &'a U8Archive<R>, start: NodeId) -> Self {
        Walk {
            archive,
            start: Some(start),
            stack: Vec::new(),
        }
    }

    /// Current depth below the starting node
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Don't descend into the directory that was just entered
    pub fn skip_subtree(&mut self) {
        if let Some((dir, _)) = self.stack.pop() {
            // Leave is still reported, jump straight to it
            self.stack.push((dir, usize::MAX));
        }
    }

    fn visit(&mut self, id: NodeId) -> WalkEvent {
        if self.archive.nodes()[id.index()].is_dir() {
            self.stack.push((id, 0));
            WalkEvent::Enter(id)
        } else {
            WalkEvent::File(id)
        }
    }
}

impl<R> Iterator for Walk<'_, R> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.archive.is_open() {
            self.start = None;
            self.stack.clear();
            return None;
        }

        if let Some(start) = self.start.take() {
            return Some(self.visit(start));
        }

        let nodes = self.archive.nodes();
        let (dir, position) = self.stack.last_mut()?;
        let dir = *dir;
        let next = nodes[dir.index()]
            .children()
            .and_then(|children| children.get_index(*position))
            .map(|(_, &child)| child);

        match next {
            Some(child) => {
                *position += 1;
                Some(self.visit(child))
            }
            None => {
                self.stack.pop();
                Some(WalkEvent::Leave(dir))
            }
        }
    }
}
