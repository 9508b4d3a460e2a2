//! Node descriptors and the idempotent write protocol.

use std::fmt;

use tracing::{debug, info};

use crate::iter::NodeIter;
use crate::{Error, NodePath, NodeState, Properties, Transport, Value};

/// A path bound to a transport.
///
/// Holds no data: every method asks the transport again. Building one is
/// free, so create them per operation and drop them afterwards.
///
/// # Example
///
/// ```rust,ignore
/// let node = Node::new(&transport, node_path!("/content/site"));
/// let changed = node.save_with_changed(&desired)?;
/// ```
pub struct Node<'a, T: Transport + ?Sized> {
    transport: &'a T,
    path: NodePath,
}

impl<'a, T: Transport + ?Sized> Node<'a, T> {
    pub fn new(transport: &'a T, path: NodePath) -> Self {
        Self { transport, path }
    }

    /// Parse `path` and bind it to `transport`.
    pub fn parse(transport: &'a T, path: &str) -> Result<Self, Error> {
        Ok(Self::new(transport, NodePath::parse(path)?))
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn transport(&self) -> &'a T {
        self.transport
    }

    fn at(&self, path: NodePath) -> Self {
        Self::new(self.transport, path)
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension()
    }

    /// The parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.path.parent().map(|p| self.at(p))
    }

    pub fn child(&self, name: &str) -> Result<Self, Error> {
        Ok(self.at(self.path.child(name)?))
    }

    /// The `jcr:content` child holding this node's primary properties.
    pub fn content(&self) -> Self {
        self.at(self.path.content())
    }

    pub fn sibling(&self, name: &str) -> Result<Option<Self>, Error> {
        Ok(self.path.sibling(name)?.map(|p| self.at(p)))
    }

    /// Parents up to and including the root. No I/O.
    pub fn parents(&self) -> impl Iterator<Item = Node<'a, T>> + '_ {
        self.path.ancestors().map(move |p| self.at(p))
    }

    /// Observe the node.
    ///
    /// An absent node is a normal result, not an error.
    pub fn state(&self) -> Result<NodeState, Error> {
        if !self.read_exists()? {
            return Ok(NodeState::absent(self.path.clone()));
        }
        let props = self.read_props()?;
        Ok(NodeState::present(self.path.clone(), props))
    }

    pub fn read_exists(&self) -> Result<bool, Error> {
        self.transport.exists(&self.path)
    }

    pub fn read_props(&self) -> Result<Properties, Error> {
        self.transport.read(&self.path)
    }

    /// Upsert properties unconditionally.
    pub fn save(&self, props: &Properties) -> Result<(), Error> {
        self.transport.save(&self.path, props)
    }

    /// Make the node carry `props`, writing only when needed.
    ///
    /// Returns whether the observable state changed. An absent node is
    /// created and always reported as changed. For a present node the write
    /// is skipped when the node already carries every desired entry, extra
    /// properties included; otherwise the node is written and read back,
    /// because the backend may coerce or drop what it was given.
    pub fn save_with_changed(&self, props: &Properties) -> Result<bool, Error> {
        let state = self.state()?;
        if !state.exists {
            self.save(props)?;
            info!(path = %self.path, "created node");
            return Ok(true);
        }

        let before = state.properties.unwrap_or_default();
        if self.transport.props_equal(&before, props) {
            debug!(path = %self.path, "node properties already up-to-date");
            return Ok(false);
        }

        self.save(props)?;
        let after = self.state()?;
        let changed = !self.same_props(&before, after.props());
        if changed {
            info!(path = %self.path, "updated node");
        } else {
            debug!(path = %self.path, "node saved but backend state unchanged");
        }
        Ok(changed)
    }

    /// Both sides carry each other under the backend's comparison.
    fn same_props(&self, a: &Properties, b: &Properties) -> bool {
        self.transport.props_equal(a, b) && self.transport.props_equal(b, a)
    }

    /// Delete the node if present.
    ///
    /// Absence counts as already deleted and reports `false`.
    pub fn delete_with_changed(&self) -> Result<bool, Error> {
        let state = self.state()?;
        if !state.exists {
            debug!(path = %self.path, "node already absent");
            return Ok(false);
        }
        self.transport.delete(&self.path)?;
        info!(path = %self.path, "deleted node");
        Ok(true)
    }

    /// Delete the node, failing with [`Error::NotFound`] when absent.
    pub fn delete(&self) -> Result<(), Error> {
        let state = self.state()?;
        if !state.exists {
            return Err(Error::not_found(&self.path));
        }
        self.transport.delete(&self.path)
    }

    pub fn save_prop(&self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let mut props = Properties::new();
        props.insert(name.to_string(), value.into());
        self.save(&props)
    }

    /// Remove one property by saving the [`Value::Null`] sentinel.
    pub fn delete_prop(&self, name: &str) -> Result<(), Error> {
        self.save_prop(name, Value::Null)
    }

    /// Depth-first walk driven by `expand`. The start node is not yielded.
    pub fn traverse<F>(&self, expand: F) -> NodeIter<'a, T, F>
    where
        F: FnMut(&Node<'a, T>) -> Result<Vec<Node<'a, T>>, Error>,
    {
        NodeIter::new(self.clone(), expand)
    }

    /// Every node below this one, listed through the transport.
    pub fn descendants(
        &self,
    ) -> NodeIter<'a, T, impl FnMut(&Node<'a, T>) -> Result<Vec<Node<'a, T>>, Error>> {
        self.traverse(|node: &Node<'a, T>| node.list_children())
    }

    /// Other children of this node's parent. Empty for the root.
    pub fn siblings(
        &self,
    ) -> NodeIter<'a, T, impl FnMut(&Node<'a, T>) -> Result<Vec<Node<'a, T>>, Error>> {
        let seed = self.path.clone();
        self.traverse(move |node: &Node<'a, T>| {
            if node.path != seed {
                return Ok(Vec::new());
            }
            match node.parent() {
                Some(parent) => Ok(parent
                    .list_children()?
                    .into_iter()
                    .filter(|n| n.path != seed)
                    .collect()),
                None => Ok(Vec::new()),
            }
        })
    }

    /// Direct children, in backend order. One transport call.
    pub fn list_children(&self) -> Result<Vec<Node<'a, T>>, Error> {
        self.transport
            .child_names(&self.path)?
            .iter()
            .map(|name| self.child(name))
            .collect()
    }
}

impl<T: Transport + ?Sized> Clone for Node<'_, T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport,
            path: self.path.clone(),
        }
    }
}

impl<T: Transport + ?Sized> fmt::Debug for Node<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("path", &self.path).finish()
    }
}

impl<T: Transport + ?Sized> fmt::Display for Node<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node '{}'", self.path)
    }
}

impl<T: Transport + ?Sized> PartialEq for Node<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}
