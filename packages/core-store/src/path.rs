//! Slash-delimited node paths.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of the conventional child node holding a node's primary properties.
pub const CONTENT_NODE: &str = "jcr:content";

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A child name is not a single path segment.
    InvalidName { name: String, message: String },
    /// The path string is invalid.
    InvalidPath { path: String, message: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidName { name, message } => {
                write!(f, "invalid node name '{}': {}", name, message)
            }
            PathError::InvalidPath { path, message } => {
                write!(f, "invalid path '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// An absolute path identifying a node in the content tree.
///
/// `/` is the root. Every other path has exactly one parent, derived by
/// dropping the last segment. Paths are pure values: nothing here touches
/// the backend.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodePath(String);

impl NodePath {
    /// The root path.
    pub fn root() -> Self {
        NodePath("/".to_string())
    }

    /// Parse a path string.
    ///
    /// # Path Syntax
    ///
    /// - Must be absolute (start with `/`)
    /// - Segments are separated by `/` and must not be empty
    /// - A single trailing slash is dropped
    ///
    /// # Examples
    ///
    /// ```rust
    /// use repotree_core::NodePath;
    ///
    /// let path = NodePath::parse("/content/site/").unwrap();
    /// assert_eq!(path.as_str(), "/content/site");
    /// assert!(NodePath::parse("content").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::InvalidPath {
                path: s.to_string(),
                message: "path is empty".to_string(),
            });
        }
        if !s.starts_with('/') {
            return Err(PathError::InvalidPath {
                path: s.to_string(),
                message: "path must start with '/'".to_string(),
            });
        }
        if s == "/" {
            return Ok(Self::root());
        }

        let trimmed = s.strip_suffix('/').unwrap_or(s);
        if trimmed[1..].split('/').any(str::is_empty) {
            return Err(PathError::InvalidPath {
                path: s.to_string(),
                message: "empty path segment".to_string(),
            });
        }

        Ok(NodePath(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last segment of the path. Empty for the root.
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(i) => &self.0[i + 1..],
            None => &self.0,
        }
    }

    /// Part of the name after its last `.`, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        name.rfind('.').map(|i| &name[i + 1..])
    }

    /// The path with its last segment removed, or `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(i) => Some(NodePath(self.0[..i].to_string())),
            None => None,
        }
    }

    /// Append a single segment.
    pub fn child(&self, name: &str) -> Result<NodePath, PathError> {
        if name.is_empty() {
            return Err(PathError::InvalidName {
                name: name.to_string(),
                message: "name is empty".to_string(),
            });
        }
        if name.contains('/') {
            return Err(PathError::InvalidName {
                name: name.to_string(),
                message: "name must not contain '/'".to_string(),
            });
        }
        if self.is_root() {
            Ok(NodePath(format!("/{}", name)))
        } else {
            Ok(NodePath(format!("{}/{}", self.0, name)))
        }
    }

    /// The `jcr:content` child.
    #[must_use]
    pub fn content(&self) -> NodePath {
        if self.is_root() {
            NodePath(format!("/{}", CONTENT_NODE))
        } else {
            NodePath(format!("{}/{}", self.0, CONTENT_NODE))
        }
    }

    /// A path sharing this path's parent. `None` for the root.
    pub fn sibling(&self, name: &str) -> Result<Option<NodePath>, PathError> {
        match self.parent() {
            Some(parent) => parent.child(name).map(Some),
            None => Ok(None),
        }
    }

    /// Walk towards the root, one parent per step, ending with `/`.
    ///
    /// The path itself is not included.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> {
        std::iter::successors(self.parent(), NodePath::parent)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s)
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NodePath::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro for creating paths from literals.
///
/// # Example
///
/// ```rust
/// use repotree_core::node_path;
///
/// let p = node_path!("/content/site");
/// assert_eq!(p.name(), "site");
/// ```
#[macro_export]
macro_rules! node_path {
    ($s:expr) => {
        $crate::NodePath::parse($s).expect("invalid path literal")
    };
}
