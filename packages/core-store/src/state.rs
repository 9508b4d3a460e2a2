//! Point-in-time node snapshots.

use serde::{Deserialize, Serialize};

use crate::{NodePath, Properties};

/// What a node looked like when it was last observed.
///
/// Captured with two transport calls (existence, then read), so a change
/// made by someone else between them can slip through. Treat it as a
/// snapshot, never as live state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub path: NodePath,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl NodeState {
    pub fn absent(path: NodePath) -> Self {
        Self {
            path,
            exists: false,
            properties: None,
        }
    }

    pub fn present(path: NodePath, properties: Properties) -> Self {
        Self {
            path,
            exists: true,
            properties: Some(properties),
        }
    }

    /// Properties of a present node. Empty for an absent one.
    pub fn props(&self) -> &Properties {
        static EMPTY: Properties = Properties::new();
        self.properties.as_ref().unwrap_or(&EMPTY)
    }
}
