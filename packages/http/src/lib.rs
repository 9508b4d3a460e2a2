//! # repotree-http
//!
//! Blocking HTTP transport for Sling-style content servers.
//!
//! ## Protocol
//!
//! - `exists(path)` / `read(path)` → `GET {path}.json`, 404 means absent
//! - `child_names(path)` → `GET {path}.1.json`, child nodes are the object-valued entries
//! - `save(path, props)` → `POST {path}` as a form, `name@TypeHint` for non-string kinds,
//!   `name@Delete` for removals
//! - `delete(path)` → `POST {path}` with `:operation=delete`
//!
//! ## Example
//!
//! ```ignore
//! use repotree_http::{SlingConfig, SlingTransport};
//! use repotree_core::{Node, node_path};
//!
//! let repo = SlingTransport::new(&SlingConfig::default())?;
//! let node = Node::new(&repo, node_path!("/content/site"));
//! println!("{}", repotree_core::format::to_text(&node));
//! ```

pub mod error;
mod sling;

pub use error::Error;
pub use sling::{SlingConfig, SlingTransport};
