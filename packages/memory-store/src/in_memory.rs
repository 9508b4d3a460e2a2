//! In-memory transport.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use repotree_core::{Error, NodePath, Properties, PropsPolicy, Transport, Value};

/// Metadata the store writes itself; callers cannot set these.
const STAMPED_PROPS: &[&str] = &[
    "jcr:created",
    "jcr:createdBy",
    "jcr:lastModified",
    "jcr:lastModifiedBy",
];

/// Number of transport calls served, by operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub exists: usize,
    pub reads: usize,
    pub saves: usize,
    pub deletes: usize,
    pub lists: usize,
}

#[derive(Default)]
struct Counters {
    exists: AtomicUsize,
    reads: AtomicUsize,
    saves: AtomicUsize,
    deletes: AtomicUsize,
    lists: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// A content tree held in a map from path to properties.
///
/// The root always exists. Like a real repository, it stamps
/// `jcr:created`/`jcr:createdBy` on new nodes and
/// `jcr:lastModified`/`jcr:lastModifiedBy` on every save, so callers see
/// backend-injected properties that their desired state never contains.
///
/// # Example
///
/// ```rust
/// use repotree_memory_store::InMemoryTransport;
/// use repotree_core::{Node, Properties, Value, node_path};
///
/// let repo = InMemoryTransport::new();
/// let node = Node::new(&repo, node_path!("/content/a"));
///
/// let mut props = Properties::new();
/// props.insert("title".to_string(), Value::from("Hello"));
///
/// assert!(node.save_with_changed(&props).unwrap());
/// assert!(!node.save_with_changed(&props).unwrap());
/// assert_eq!(repo.calls().saves, 1);
/// ```
pub struct InMemoryTransport {
    nodes: Mutex<BTreeMap<NodePath, Properties>>,
    policy: PropsPolicy,
    user: String,
    revision: AtomicU64,
    counters: Counters,
}

impl InMemoryTransport {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodePath::root(), Properties::new());
        Self {
            nodes: Mutex::new(nodes),
            policy: PropsPolicy::default(),
            user: "admin".to_string(),
            revision: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    /// Compare properties with the given policy instead of the default.
    #[must_use]
    pub fn with_policy(mut self, policy: PropsPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// User recorded in `jcr:createdBy`/`jcr:lastModifiedBy`.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Put a node in place without stamping metadata or counting a call.
    pub fn insert(&self, path: NodePath, props: Properties) {
        let mut nodes = self.lock();
        for ancestor in path.ancestors() {
            nodes.entry(ancestor).or_default();
        }
        nodes.insert(path, props);
    }

    /// Calls served so far.
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            exists: self.counters.exists.load(Ordering::SeqCst),
            reads: self.counters.reads.load(Ordering::SeqCst),
            saves: self.counters.saves.load(Ordering::SeqCst),
            deletes: self.counters.deletes.load(Ordering::SeqCst),
            lists: self.counters.lists.load(Ordering::SeqCst),
        }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<NodePath, Properties>> {
        self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stamp_created(&self, props: &mut Properties) {
        let revision = self.revision.load(Ordering::SeqCst);
        props.insert("jcr:created".to_string(), Value::Integer(revision as i64));
        props.insert("jcr:createdBy".to_string(), Value::from(self.user.as_str()));
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for InMemoryTransport {
    fn exists(&self, path: &NodePath) -> Result<bool, Error> {
        bump(&self.counters.exists);
        Ok(self.lock().contains_key(path))
    }

    fn read(&self, path: &NodePath) -> Result<Properties, Error> {
        bump(&self.counters.reads);
        Ok(self.lock().get(path).cloned().unwrap_or_default())
    }

    fn save(&self, path: &NodePath, props: &Properties) -> Result<(), Error> {
        bump(&self.counters.saves);
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let mut nodes = self.lock();

        for ancestor in path.ancestors() {
            if !nodes.contains_key(&ancestor) {
                let mut created = Properties::new();
                self.stamp_created(&mut created);
                tracing::debug!(path = %ancestor, "creating intermediate node");
                nodes.insert(ancestor, created);
            }
        }

        let node = nodes.entry(path.clone()).or_insert_with(|| {
            let mut created = Properties::new();
            self.stamp_created(&mut created);
            created
        });
        for (name, value) in props {
            if STAMPED_PROPS.contains(&name.as_str()) {
                continue;
            }
            if value.is_null() {
                node.remove(name);
            } else {
                node.insert(name.clone(), value.clone());
            }
        }
        node.insert("jcr:lastModified".to_string(), Value::Integer(revision as i64));
        node.insert(
            "jcr:lastModifiedBy".to_string(),
            Value::from(self.user.as_str()),
        );
        Ok(())
    }

    fn delete(&self, path: &NodePath) -> Result<(), Error> {
        bump(&self.counters.deletes);
        if path.is_root() {
            return Err(Error::transport("the root node cannot be deleted"));
        }
        let mut nodes = self.lock();
        if nodes.remove(path).is_none() {
            return Err(Error::not_found(path));
        }
        let prefix = format!("{}/", path);
        nodes.retain(|p, _| !p.as_str().starts_with(&prefix));
        Ok(())
    }

    fn props_equal(&self, current: &Properties, desired: &Properties) -> bool {
        self.policy.satisfies(current, desired)
    }

    fn child_names(&self, path: &NodePath) -> Result<Vec<String>, Error> {
        bump(&self.counters.lists);
        let nodes = self.lock();
        if !nodes.contains_key(path) {
            return Err(Error::not_found(path));
        }
        Ok(nodes
            .keys()
            .filter(|p| p.parent().as_ref() == Some(path))
            .map(|p| p.name().to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use repotree_core::{format, node_path, Node};

    fn title(value: &str) -> Properties {
        btree! { "title".into() => Value::from(value) }
    }

    #[test]
    fn save_then_read_back() {
        let repo = InMemoryTransport::new();
        let path = node_path!("/content/a");
        repo.save(&path, &title("Hello")).unwrap();

        assert!(repo.exists(&path).unwrap());
        let props = repo.read(&path).unwrap();
        assert_eq!(props.get("title"), Some(&Value::from("Hello")));
        assert_eq!(props.get("jcr:createdBy"), Some(&Value::from("admin")));
        assert!(props.contains_key("jcr:lastModified"));
    }

    #[test]
    fn save_creates_missing_ancestors() {
        let repo = InMemoryTransport::new();
        repo.save(&node_path!("/content/site/en"), &Properties::new())
            .unwrap();
        assert!(repo.exists(&node_path!("/content")).unwrap());
        assert!(repo.exists(&node_path!("/content/site")).unwrap());
        assert_eq!(repo.len(), 4);
    }

    #[test]
    fn save_merges_and_removes() {
        let repo = InMemoryTransport::new();
        let path = node_path!("/content/a");
        repo.save(&path, &title("Hello")).unwrap();
        repo.save(&path, &btree! { "hidden".into() => Value::Bool(true) })
            .unwrap();
        repo.save(&path, &btree! { "title".into() => Value::Null })
            .unwrap();

        let props = repo.read(&path).unwrap();
        assert!(!props.contains_key("title"));
        assert_eq!(props.get("hidden"), Some(&Value::Bool(true)));
    }

    #[test]
    fn protected_props_cannot_be_overwritten() {
        let repo = InMemoryTransport::new().with_user("editor");
        let path = node_path!("/content/a");
        repo.save(&path, &btree! { "jcr:createdBy".into() => Value::from("mallory") })
            .unwrap();
        assert_eq!(
            repo.read(&path).unwrap().get("jcr:createdBy"),
            Some(&Value::from("editor"))
        );
    }

    #[test]
    fn delete_takes_subtree() {
        let repo = InMemoryTransport::new();
        repo.insert(node_path!("/content/a/b/c"), Properties::new());
        repo.insert(node_path!("/content/ab"), Properties::new());

        repo.delete(&node_path!("/content/a")).unwrap();
        assert!(!repo.exists(&node_path!("/content/a/b")).unwrap());
        assert!(!repo.exists(&node_path!("/content/a/b/c")).unwrap());
        assert!(repo.exists(&node_path!("/content/ab")).unwrap());
    }

    #[test]
    fn delete_absent_is_not_found() {
        let repo = InMemoryTransport::new();
        let err = repo.delete(&node_path!("/nope")).unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.delete(&NodePath::root()).is_err());
    }

    #[test]
    fn child_names_are_direct_children() {
        let repo = InMemoryTransport::new();
        repo.insert(node_path!("/content/a/x"), Properties::new());
        repo.insert(node_path!("/content/b"), Properties::new());
        assert_eq!(
            repo.child_names(&node_path!("/content")).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(repo.child_names(&NodePath::root()).unwrap(), vec!["content"]);
        assert!(repo.child_names(&node_path!("/missing")).is_err());
    }

    #[test]
    fn save_with_changed_scenario() {
        let repo = InMemoryTransport::new();
        let node = Node::new(&repo, node_path!("/content/a"));

        assert!(node.save_with_changed(&title("Hello")).unwrap());
        assert_eq!(repo.calls().saves, 1);

        assert!(!node.save_with_changed(&title("Hello")).unwrap());
        assert_eq!(repo.calls().saves, 1);

        assert!(node.save_with_changed(&title("Bye")).unwrap());
        assert_eq!(repo.calls().saves, 2);
        assert_eq!(
            repo.read(&node_path!("/content/a")).unwrap().get("title"),
            Some(&Value::from("Bye"))
        );
    }

    #[test]
    fn save_with_changed_strict_policy_sees_metadata() {
        // Desired metadata never sticks, so without exclusions every call writes.
        let desired: Properties = btree! {
            "title".into() => Value::from("Hello"),
            "jcr:createdBy".into() => Value::from("mallory"),
        };

        let strict = InMemoryTransport::new().with_policy(PropsPolicy::strict());
        let node = Node::new(&strict, node_path!("/content/a"));
        node.save_with_changed(&desired).unwrap();
        node.save_with_changed(&desired).unwrap();
        assert_eq!(strict.calls().saves, 2);

        let repo = InMemoryTransport::new();
        let node = Node::new(&repo, node_path!("/content/a"));
        node.save_with_changed(&desired).unwrap();
        assert!(!node.save_with_changed(&desired).unwrap());
        assert_eq!(repo.calls().saves, 1);
    }

    #[test]
    fn save_with_changed_leaves_richer_node_alone() {
        let repo = InMemoryTransport::new();
        repo.insert(
            node_path!("/content/a"),
            btree! {
                "jcr:primaryType".into() => Value::from("nt:unstructured"),
                "title".into() => Value::from("Hello"),
                "tags".into() => Value::from(vec!["x"]),
            },
        );
        let node = Node::new(&repo, node_path!("/content/a"));

        assert!(!node.save_with_changed(&title("Hello")).unwrap());
        assert!(!node.save_with_changed(&title("Hello")).unwrap());
        assert_eq!(repo.calls().saves, 0);
    }

    #[test]
    fn save_with_changed_removes_with_null() {
        let repo = InMemoryTransport::new();
        repo.insert(
            node_path!("/content/a"),
            btree! {
                "jcr:primaryType".into() => Value::from("nt:unstructured"),
                "title".into() => Value::from("Hello"),
            },
        );
        let node = Node::new(&repo, node_path!("/content/a"));
        let remove: Properties = btree! { "title".into() => Value::Null };

        assert!(node.save_with_changed(&remove).unwrap());
        assert_eq!(repo.calls().saves, 1);
        let props = repo.read(&node_path!("/content/a")).unwrap();
        assert!(!props.contains_key("title"));
        assert_eq!(
            props.get("jcr:primaryType"),
            Some(&Value::from("nt:unstructured"))
        );

        assert!(!node.save_with_changed(&remove).unwrap());
        assert_eq!(repo.calls().saves, 1);
    }

    #[test]
    fn node_type_can_be_set_on_create() {
        let repo = InMemoryTransport::new();
        let node = Node::new(&repo, node_path!("/content/page"));
        let desired: Properties = btree! {
            "jcr:primaryType".into() => Value::from("cq:Page"),
        };
        assert!(node.save_with_changed(&desired).unwrap());
        assert_eq!(
            node.read_props().unwrap().get("jcr:primaryType"),
            Some(&Value::from("cq:Page"))
        );
    }

    #[test]
    fn delete_with_changed_scenario() {
        let repo = InMemoryTransport::new();
        let node = Node::new(&repo, node_path!("/content/a"));

        assert!(!node.delete_with_changed().unwrap());
        assert_eq!(repo.calls().deletes, 0);

        node.save(&title("Hello")).unwrap();
        assert!(node.delete_with_changed().unwrap());
        assert_eq!(repo.calls().deletes, 1);
        assert!(!node.read_exists().unwrap());
    }

    #[test]
    fn walk_reaches_every_node() {
        let repo = InMemoryTransport::new();
        for path in ["/content/a/1", "/content/a/2", "/content/b", "/apps/x"] {
            repo.insert(node_path!(path), Properties::new());
        }
        let root = Node::new(&repo, NodePath::root());
        let mut visited: Vec<String> = root
            .descendants()
            .map(|n| n.unwrap().path().to_string())
            .collect();
        visited.sort();
        assert_eq!(
            visited,
            vec![
                "/apps",
                "/apps/x",
                "/content",
                "/content/a",
                "/content/a/1",
                "/content/a/2",
                "/content/b"
            ]
        );
        // One listing per visited node plus the seed.
        assert_eq!(repo.calls().lists, 8);
    }

    #[test]
    fn early_stop_lists_only_what_was_visited() {
        let repo = InMemoryTransport::new();
        for i in 0..50 {
            repo.insert(node_path!(&format!("/content/n{}", i)), Properties::new());
        }
        let content = Node::new(&repo, node_path!("/content"));
        let first_two: Vec<_> = content.descendants().take(2).collect();
        assert_eq!(first_two.len(), 2);
        assert_eq!(repo.calls().lists, 2);
    }

    #[test]
    fn text_of_missing_node() {
        let repo = InMemoryTransport::new();
        let node = Node::new(&repo, node_path!("/content/missing"));
        assert_eq!(
            format::to_text(&node),
            "path '/content/missing' does not exist\n"
        );
    }
}
