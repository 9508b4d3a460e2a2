//! The transport boundary: what the core needs from a backend.

use std::sync::Arc;

use crate::{Error, NodePath, Properties, PropsPolicy};

/// Access to a remote content tree.
///
/// Every call goes to the backend; implementations must not cache. Absence
/// is reported through `exists`, never as an error from `read`.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Check whether a node is present.
    fn exists(&self, path: &NodePath) -> Result<bool, Error>;

    /// Read the properties of a present node.
    fn read(&self, path: &NodePath) -> Result<Properties, Error>;

    /// Create the node if absent, otherwise merge the given properties into it.
    ///
    /// A `Value::Null` entry removes that property.
    fn save(&self, path: &NodePath, props: &Properties) -> Result<(), Error>;

    /// Delete a node and its subtree.
    ///
    /// # Returns
    ///
    /// * `Err(Error::NotFound)` - The node is absent.
    fn delete(&self, path: &NodePath) -> Result<(), Error>;

    /// Whether `current` already carries `desired`, the way the backend sees it.
    ///
    /// Only the names in `desired` are compared, since `save` merges. Backend
    /// injected metadata must not count as a difference. The default uses
    /// [`PropsPolicy::default`].
    fn props_equal(&self, current: &Properties, desired: &Properties) -> bool {
        PropsPolicy::default().satisfies(current, desired)
    }

    /// Names of the direct children of a node, in backend order.
    fn child_names(&self, path: &NodePath) -> Result<Vec<String>, Error> {
        let _ = path;
        Err(Error::Unsupported {
            operation: "child_names",
        })
    }
}

// Blanket implementations for references and smart pointers

impl<T: Transport + ?Sized> Transport for &T {
    fn exists(&self, path: &NodePath) -> Result<bool, Error> {
        (**self).exists(path)
    }

    fn read(&self, path: &NodePath) -> Result<Properties, Error> {
        (**self).read(path)
    }

    fn save(&self, path: &NodePath, props: &Properties) -> Result<(), Error> {
        (**self).save(path, props)
    }

    fn delete(&self, path: &NodePath) -> Result<(), Error> {
        (**self).delete(path)
    }

    fn props_equal(&self, current: &Properties, desired: &Properties) -> bool {
        (**self).props_equal(current, desired)
    }

    fn child_names(&self, path: &NodePath) -> Result<Vec<String>, Error> {
        (**self).child_names(path)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exists(&self, path: &NodePath) -> Result<bool, Error> {
        self.as_ref().exists(path)
    }

    fn read(&self, path: &NodePath) -> Result<Properties, Error> {
        self.as_ref().read(path)
    }

    fn save(&self, path: &NodePath, props: &Properties) -> Result<(), Error> {
        self.as_ref().save(path, props)
    }

    fn delete(&self, path: &NodePath) -> Result<(), Error> {
        self.as_ref().delete(path)
    }

    fn props_equal(&self, current: &Properties, desired: &Properties) -> bool {
        self.as_ref().props_equal(current, desired)
    }

    fn child_names(&self, path: &NodePath) -> Result<Vec<String>, Error> {
        self.as_ref().child_names(path)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn exists(&self, path: &NodePath) -> Result<bool, Error> {
        self.as_ref().exists(path)
    }

    fn read(&self, path: &NodePath) -> Result<Properties, Error> {
        self.as_ref().read(path)
    }

    fn save(&self, path: &NodePath, props: &Properties) -> Result<(), Error> {
        self.as_ref().save(path, props)
    }

    fn delete(&self, path: &NodePath) -> Result<(), Error> {
        self.as_ref().delete(path)
    }

    fn props_equal(&self, current: &Properties, desired: &Properties) -> bool {
        self.as_ref().props_equal(current, desired)
    }

    fn child_names(&self, path: &NodePath) -> Result<Vec<String>, Error> {
        self.as_ref().child_names(path)
    }
}
