//! Lazy depth-first traversal.
//!
//! The walk keeps its own stack on the heap, so depth is bounded by memory
//! rather than by the call stack. Nothing happens between pulls: each call
//! to `next` expands exactly one node (the one returned by the previous
//! call, or the seed on the first call), pushes what the expansion yields,
//! then pops. Dropping the iterator early leaves no work behind.
//!
//! The seed itself is never yielded. Siblings come out in reverse of the
//! order the expansion function emits them, since the last pushed is the
//! first popped.
//!
//! The tree must be acyclic; the walk ends only when every branch expands
//! to nothing.

use std::fmt;

use crate::{Error, Node, Transport};

/// Pull-driven walk over nodes produced by an expansion function.
pub struct NodeIter<'a, T, F>
where
    T: Transport + ?Sized,
{
    stack: Vec<Node<'a, T>>,
    pending: Option<Node<'a, T>>,
    expand: F,
}

impl<'a, T, F> NodeIter<'a, T, F>
where
    T: Transport + ?Sized,
    F: FnMut(&Node<'a, T>) -> Result<Vec<Node<'a, T>>, Error>,
{
    /// Start a walk below `seed`. Performs no I/O.
    pub fn new(seed: Node<'a, T>, expand: F) -> Self {
        Self {
            stack: Vec::new(),
            pending: Some(seed),
            expand,
        }
    }

    /// Nodes discovered but not yet yielded.
    pub fn queued(&self) -> usize {
        self.stack.len()
    }
}

impl<'a, T, F> Iterator for NodeIter<'a, T, F>
where
    T: Transport + ?Sized,
    F: FnMut(&Node<'a, T>) -> Result<Vec<Node<'a, T>>, Error>,
{
    type Item = Result<Node<'a, T>, Error>;

    /// A failed expansion is yielded once; that subtree is skipped and the
    /// walk goes on with what is already on the stack.
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(node) = self.pending.take() {
            match (self.expand)(&node) {
                Ok(children) => self.stack.extend(children),
                Err(e) => return Some(Err(e)),
            }
        }
        let node = self.stack.pop()?;
        self.pending = Some(node.clone());
        Some(Ok(node))
    }
}

impl<T, F> fmt::Debug for NodeIter<'_, T, F>
where
    T: Transport + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIter")
            .field("stack", &self.stack)
            .field("pending", &self.pending)
            .finish()
    }
}
