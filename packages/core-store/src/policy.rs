//! Property comparison policy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Properties, Value};

/// Properties maintained by a JCR backend itself.
///
/// These are created or refreshed on every write, or fixed by node type, so
/// they never take part in a comparison with a caller's desired state.
pub const JCR_PROTECTED_PROPS: &[&str] = &[
    "jcr:primaryType",
    "jcr:mixinTypes",
    "jcr:created",
    "jcr:createdBy",
    "jcr:lastModified",
    "jcr:lastModifiedBy",
    "jcr:uuid",
    "jcr:baseVersion",
    "jcr:predecessors",
    "jcr:versionHistory",
    "jcr:isCheckedOut",
];

/// Decides when observed properties already carry a desired state.
///
/// Excluded names never take part. A `Null` entry stands for an absent
/// property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropsPolicy {
    excluded: BTreeSet<String>,
}

impl PropsPolicy {
    /// A policy that excludes nothing.
    pub fn strict() -> Self {
        Self {
            excluded: BTreeSet::new(),
        }
    }

    /// A policy excluding the given property names.
    pub fn excluding<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Add more excluded names.
    #[must_use]
    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }

    /// Whether `current` already carries every entry of `desired`.
    ///
    /// Properties present only in `current` do not matter, since a save
    /// merges into the node and leaves them alone. A `Null` entry matches
    /// only when the property is absent from `current`.
    pub fn satisfies(&self, current: &Properties, desired: &Properties) -> bool {
        desired
            .iter()
            .filter(|(name, _)| !self.is_excluded(name))
            .all(|(name, value)| {
                let observed = current.get(name.as_str()).filter(|v| !v.is_null());
                if value.is_null() {
                    observed.is_none()
                } else {
                    observed == Some(value)
                }
            })
    }

    /// Full equality of two property sets, ignoring excluded names and `Null`
    /// entries.
    pub fn equal(&self, a: &Properties, b: &Properties) -> bool {
        self.satisfies(a, b) && self.satisfies(b, a)
    }
}

impl Default for PropsPolicy {
    /// Excludes [`JCR_PROTECTED_PROPS`].
    fn default() -> Self {
        Self::excluding(JCR_PROTECTED_PROPS.iter().copied())
    }
}
