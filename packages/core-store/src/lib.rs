//! Repotree core: reconciling a remote content tree
//!
//! This layer keeps a hierarchical content repository in a desired state
//! without knowing how the repository is reached:
//! - `NodePath`: Slash-delimited path algebra (name, parent, child, sibling)
//! - `Transport`: The backend capabilities the core consumes
//! - `Node`: A path bound to a transport, with idempotent writes
//! - `NodeIter`: Lazy depth-first traversal on an explicit stack
//! - `format`: Text and JSON presentation of node state
//! - `PrepareLock`: Fingerprint guard for one-time local preparation
//!
//! Nothing is cached: every operation asks the transport again.
//!
//! # Example
//!
//! ```rust,ignore
//! use repotree_core::{Node, Properties, Transport, Value, node_path};
//!
//! fn ensure_title(repo: &dyn Transport) -> Result<bool, repotree_core::Error> {
//!     let mut props = Properties::new();
//!     props.insert("jcr:title".to_string(), Value::from("Home"));
//!     Node::new(repo, node_path!("/content/site")).content().save_with_changed(&props)
//! }
//! ```

mod error;
pub mod format;
mod iter;
mod node;
mod path;
mod policy;
mod prepare;
mod state;
mod transport;
mod value;

pub use error::Error;
pub use format::OutputFormat;
pub use iter::NodeIter;
pub use node::Node;
pub use path::{NodePath, PathError, CONTENT_NODE};
pub use policy::{PropsPolicy, JCR_PROTECTED_PROPS};
pub use prepare::{LockState, PrepareLock};
pub use state::NodeState;
pub use transport::Transport;
pub use value::{Properties, Value};
