//! Arena-backed configuration tree
//!
//! Provides [`ConfigTree`], an ordered tree of named nodes in which a parent
//! may hold several children with the same name (a group). Nodes are owned
//! by an arena and addressed through [`NodeId`] handles, so structural edits
//! never invalidate handles to nodes that are still alive.

use std::fmt::Display;
use std::str::FromStr;

use serde_json::{Map, Value as JsonValue};

use crate::error::TreeError;
use crate::fingerprint::Fingerprint;
use crate::path::ConfigPath;

/// Handle to a node inside a [`ConfigTree`]
///
/// Only meaningful for the tree that issued it. Handles of removed nodes
/// resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena slot index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single named node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            value: None,
            parent,
            children: Vec::new(),
        }
    }

    /// Node name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scalar value, if any
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Parent handle (`None` for the root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in document order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Neither a value nor children
    #[inline]
    #[must_use]
    pub fn is_hollow(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

/// Ordered configuration tree
///
/// # Invariants
/// - The root is always alive and never removed
/// - Sibling order is preserved by every mutation; new nodes append last
/// - Every live non-root node is listed exactly once in its parent's children
/// - Removed nodes leave a tombstone; their slots and ids are never reused,
///   so a stale [`NodeId`] can never alias a newer node
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl ConfigTree {
    /// Create a tree holding only a root element
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Some(Node::new(root_name.into(), None))],
            root: NodeId(0),
        }
    }

    /// Root element handle
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a live node
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    /// Whether `id` refers to a live node
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Node name
    #[inline]
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(Node::name)
    }

    /// Node value
    #[inline]
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::value)
    }

    /// Parent of a node
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Children of a node, empty for removed handles
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Number of live nodes, root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// True when the root has neither value nor children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node(self.root).map_or(true, Node::is_hollow)
    }

    /// First child of `parent` named `name`
    #[must_use]
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children_named(parent, name).next()
    }

    /// All children of `parent` named `name`, in document order
    pub fn children_named<'a>(
        &'a self,
        parent: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent)
            .iter()
            .copied()
            .filter(move |&c| self.name(c) == Some(name))
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    // ------------------------------------------------------------------
    // Path resolution
    // ------------------------------------------------------------------

    /// Resolve a path to every matching node, in document order
    ///
    /// Each segment expands every node of the current frontier into all of
    /// its children carrying that name, so groups at intermediate levels fan
    /// out. The empty path resolves to the root.
    #[must_use]
    pub fn resolve(&self, path: &ConfigPath) -> Vec<NodeId> {
        let mut frontier = vec![self.root];
        for segment in path.iter() {
            frontier = frontier
                .iter()
                .flat_map(|&id| self.children_named(id, segment))
                .collect();
            if frontier.is_empty() {
                break;
            }
        }
        frontier
    }

    /// First node matching a path
    #[must_use]
    pub fn resolve_first(&self, path: &ConfigPath) -> Option<NodeId> {
        self.resolve(path).into_iter().next()
    }

    /// Walk `path` from the root, creating missing nodes as empty containers
    ///
    /// Existing nodes are reused (first match per segment).
    pub fn ensure_path(&mut self, path: &ConfigPath) -> NodeId {
        let mut current = self.root;
        for segment in path.iter() {
            current = match self.child_named(current, segment) {
                Some(existing) => existing,
                None => self.push_child(current, segment.to_string()),
            };
        }
        current
    }

    // ------------------------------------------------------------------
    // Primitive mutation
    // ------------------------------------------------------------------

    fn push_child(&mut self, parent: NodeId, name: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(name, Some(parent))));
        if let Some(Some(p)) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Append a new empty child under `parent`
    ///
    /// # Errors
    /// Returns error if `parent` is not live or `name` is not a valid name
    pub fn append_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        if !ConfigPath::is_valid_name(name) {
            return Err(TreeError::InvalidName(name.to_string()));
        }
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        Ok(self.push_child(parent, name.to_string()))
    }

    /// Unlink a node from its parent, keeping it (and its subtree) alive
    ///
    /// Returns `false` if the node was not attached.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Ok(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Ok(n) = self.node_mut(id) {
            n.parent = None;
        }
        true
    }

    /// Move `id` to the end of `new_parent`'s children
    ///
    /// # Errors
    /// Returns error if either node is not live, `id` is the root, or
    /// `new_parent` lies inside `id`'s subtree
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootWrite);
        }
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        if !self.contains(new_parent) {
            return Err(TreeError::UnknownNode(new_parent));
        }
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(TreeError::Cycle {
                node: id,
                parent: new_parent,
            });
        }
        self.detach(id);
        self.node_mut(id)?.parent = Some(new_parent);
        self.node_mut(new_parent)?.children.push(id);
        Ok(())
    }

    /// Rename a node in place
    ///
    /// # Errors
    /// Returns error if the node is not live or `name` is invalid
    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<(), TreeError> {
        if !ConfigPath::is_valid_name(name) {
            return Err(TreeError::InvalidName(name.to_string()));
        }
        self.node_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Set a node's scalar value
    ///
    /// # Errors
    /// Returns error if the node is not live
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), TreeError> {
        self.node_mut(id)?.value = Some(value.into());
        Ok(())
    }

    /// Remove a node and its whole subtree
    ///
    /// # Errors
    /// Returns error if `id` is the root or not live
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootWrite);
        }
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Remove hollow containers, walking upward from each candidate
    ///
    /// Stops at the first ancestor that still has a value or children, and
    /// never removes the root.
    fn prune_hollow(&mut self, candidates: &[NodeId]) {
        for &start in candidates {
            let mut cursor = Some(start);
            while let Some(id) = cursor {
                if id == self.root {
                    break;
                }
                let parent = match self.node(id) {
                    Some(node) if node.is_hollow() => node.parent,
                    _ => break,
                };
                if self.remove(id).is_err() {
                    break;
                }
                cursor = parent;
            }
        }
    }

    // ------------------------------------------------------------------
    // Scalar access
    // ------------------------------------------------------------------

    /// Read the first match of `path` parsed as `T`
    ///
    /// The stored text is parsed as written first, then with surrounding
    /// whitespace stripped. Falls back to `default` when the path is
    /// unresolved, the node carries no value, or neither form parses.
    #[must_use]
    pub fn read_scalar<T: FromStr>(&self, path: &ConfigPath, default: T) -> T {
        self.resolve_first(path)
            .and_then(|id| self.value(id))
            .and_then(parse_scalar)
            .unwrap_or(default)
    }

    /// Write `value` to a single node addressed by `path`
    ///
    /// If the path already resolves, the first match is overwritten.
    /// Otherwise missing nodes along the path are created. Returns the
    /// written node.
    ///
    /// # Errors
    /// Returns [`TreeError::RootWrite`] for the empty path
    pub fn write_scalar<T: Display>(
        &mut self,
        path: &ConfigPath,
        value: T,
    ) -> Result<NodeId, TreeError> {
        if path.is_empty() {
            return Err(TreeError::RootWrite);
        }
        let target = match self.resolve_first(path) {
            Some(existing) => existing,
            None => self.ensure_path(path),
        };
        self.set_value(target, value.to_string())?;
        Ok(target)
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// Relocate every node matching `source` to `dest`
    ///
    /// Each match is detached, renamed to the final segment of `dest` and
    /// appended under the destination parent (created on demand), keeping
    /// its subtree and the relative order of all matches. Source containers
    /// left hollow are pruned. An unresolved source is a no-op that leaves
    /// the tree untouched. Returns the number of relocated nodes.
    pub fn move_subtree(&mut self, source: &ConfigPath, dest: &ConfigPath) -> usize {
        let Some((dest_parent_path, dest_name)) = dest.split_leaf() else {
            tracing::warn!(%source, "move target is the document root, skipping");
            return 0;
        };
        if source.is_empty() {
            tracing::warn!(%dest, "move source is the document root, skipping");
            return 0;
        }

        let matches = self.resolve(source);
        if matches.is_empty() {
            tracing::trace!(%source, %dest, "move source unresolved");
            return 0;
        }

        let parent_existed = self.resolve_first(&dest_parent_path).is_some();
        let dest_parent = self.ensure_path(&dest_parent_path);

        let mut former_parents = Vec::with_capacity(matches.len());
        let mut moved = 0;
        for id in matches {
            if self.is_ancestor_or_self(id, dest_parent) {
                tracing::warn!(%source, %dest, "cannot move a node below itself, skipping");
                continue;
            }
            if let Some(parent) = self.parent(id) {
                if !former_parents.contains(&parent) {
                    former_parents.push(parent);
                }
            }
            if self.reparent(id, dest_parent).is_ok() && self.rename(id, dest_name).is_ok() {
                moved += 1;
            }
        }

        if moved == 0 && !parent_existed {
            former_parents.push(dest_parent);
        }
        self.prune_hollow(&former_parents);
        moved
    }

    /// Remove every node matching `path`, pruning containers left hollow
    ///
    /// Returns the number of removed nodes. The root is never removed.
    pub fn remove_path(&mut self, path: &ConfigPath) -> usize {
        if path.is_empty() {
            return 0;
        }
        let matches = self.resolve(path);
        let mut former_parents = Vec::new();
        let mut removed = 0;
        for id in matches {
            let parent = self.parent(id);
            if self.remove(id).is_ok() {
                removed += 1;
                if let Some(parent) = parent {
                    if !former_parents.contains(&parent) {
                        former_parents.push(parent);
                    }
                }
            }
        }
        self.prune_hollow(&former_parents);
        removed
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Blake3 fingerprint of the canonical text rendering
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.to_text().as_bytes())
    }

    /// JSON view of the document
    ///
    /// Leaves become strings (`null` when valueless), containers become
    /// objects and groups become arrays. A container that also carries a
    /// value exposes it under `"$value"`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut top = Map::new();
        if let Some(root) = self.node(self.root) {
            top.insert(root.name.clone(), self.node_json(self.root));
        }
        JsonValue::Object(top)
    }

    fn node_json(&self, id: NodeId) -> JsonValue {
        let Some(node) = self.node(id) else {
            return JsonValue::Null;
        };
        if node.children.is_empty() {
            return node
                .value
                .as_ref()
                .map_or(JsonValue::Null, |v| JsonValue::String(v.clone()));
        }

        let mut object = Map::new();
        if let Some(value) = &node.value {
            object.insert("$value".to_string(), JsonValue::String(value.clone()));
        }
        for &child in &node.children {
            let Some(name) = self.name(child) else {
                continue;
            };
            let rendered = self.node_json(child);
            match object.get_mut(name) {
                Some(JsonValue::Array(items)) => items.push(rendered),
                Some(existing) => {
                    let first = existing.take();
                    *existing = JsonValue::Array(vec![first, rendered]);
                }
                None => {
                    object.insert(name.to_string(), rendered);
                }
            }
        }
        JsonValue::Object(object)
    }
}

impl PartialEq for ConfigTree {
    /// Structural equality: same rendering, regardless of arena layout
    fn eq(&self, other: &Self) -> bool {
        self.to_text() == other.to_text()
    }
}

impl Eq for ConfigTree {}

/// Parse a stored value as `T`
///
/// Tries the text exactly as stored, then with surrounding whitespace
/// stripped, so `" padded "` stays a string while `" 2 "` still reads as a
/// number.
#[must_use]
pub fn parse_scalar<T: FromStr>(text: &str) -> Option<T> {
    text.parse()
        .ok()
        .or_else(|| text.trim().parse().ok())
}
