//! DOM Tree implementation.

use crate::element::ElementData;
use crate::node::{Node, NodeId};
use common::Rect;
use slotmap::SlotMap;
use smallvec::SmallVec;

/// The DOM tree structure.
pub struct DomTree {
    /// All nodes in the tree, connected or not.
    nodes: SlotMap<NodeId, Node>,
    /// Root node (document).
    root: NodeId,
}

impl DomTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(Node::new_document);
        Self { nodes, root }
    }

    /// Get the root document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get element data for a node.
    pub fn get_element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(|n| n.as_element())
    }

    /// Get mutable element data for a node.
    pub fn get_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id).and_then(|n| n.as_element_mut())
    }

    /// Create an element node.
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.nodes.insert_with_key(|id| Node::new_element(id, data))
    }

    /// Append a child to a parent node.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert a child before a reference node (or at the end).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        // Inserting an ancestor into its own subtree would create a cycle
        if self.ancestors(parent).any(|a| a == child) {
            return;
        }

        self.remove_from_parent(child);

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            let pos = reference
                .and_then(|r| parent_node.children.iter().position(|&id| id == r))
                .unwrap_or(parent_node.children.len());
            parent_node.children.insert(pos, child);
        }

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    /// Remove a node from its parent.
    pub fn remove_from_parent(&mut self, node: NodeId) {
        let parent = match self.nodes.get(node) {
            Some(n) => n.parent,
            None => return,
        };

        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                parent_node.children.retain(|id| *id != node);
            }
        }

        if let Some(node_data) = self.nodes.get_mut(node) {
            node_data.parent = None;
        }
    }

    /// Remove a node and its subtree from the tree, freeing their slots.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.remove_from_parent(node);

        let mut to_remove = vec![node];
        let mut i = 0;
        while i < to_remove.len() {
            if let Some(n) = self.nodes.get(to_remove[i]) {
                to_remove.extend(n.children.iter().copied());
            }
            i += 1;
        }

        for id in to_remove {
            self.nodes.remove(id);
        }
    }

    /// Clone a node (optionally deep). The clone is detached.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Option<NodeId> {
        let node_data = self.nodes.get(node)?.clone();

        let new_id = self.nodes.insert_with_key(|id| {
            let mut new_node = node_data;
            new_node.id = id;
            new_node.parent = None;
            new_node.children = SmallVec::new();
            new_node
        });

        if deep {
            let children: SmallVec<[NodeId; 8]> = self
                .nodes
                .get(node)
                .map(|n| n.children.clone())
                .unwrap_or_default();

            for child in children {
                if let Some(cloned_child) = self.clone_node(child, true) {
                    self.append_child(new_id, cloned_child);
                }
            }
        }

        Some(new_id)
    }

    /// Get parent node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Get all children.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|n| n.children.iter().copied())
    }

    /// Get ancestors.
    pub fn ancestors(&self, node: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(node),
        }
    }

    /// Get descendants (pre-order).
    pub fn descendants(&self, node: NodeId) -> DescendantIterator<'_> {
        let mut stack = Vec::new();
        if let Some(n) = self.nodes.get(node) {
            for &child in n.children.iter().rev() {
                stack.push(child);
            }
        }
        DescendantIterator { tree: self, stack }
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        if node == self.root {
            return true;
        }
        self.nodes.contains_key(node) && self.ancestors(node).any(|a| a == self.root)
    }

    /// Query selector over the whole document.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_in(self.root, selector)
    }

    /// First descendant of `scope` matching a compound selector.
    pub fn query_selector_in(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        let selector = SimpleSelector::parse(selector)?;
        self.descendants(scope)
            .find(|&id| self.get_element(id).is_some_and(|e| selector.matches(e)))
    }

    /// Connected elements carrying `name="value"`, in tree order.
    pub fn find_elements_by_attribute(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&id| {
                self.get_element(id)
                    .is_some_and(|e| e.get_attribute(name) == Some(value))
            })
            .collect()
    }

    /// Assign the layout box the host computed for a node.
    pub fn set_layout_box(&mut self, node: NodeId, rect: Option<Rect>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.layout_box = rect;
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Comparison used by an attribute selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Contains,
    Word,
}

/// A compound selector such as `div.card[data-hero-id="a"]#main`.
#[derive(Clone, Debug, Default)]
pub struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp, String)>,
}

impl SimpleSelector {
    /// Parse a compound selector; combinators and pseudo-classes are rejected.
    pub fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() || has_combinator(selector) {
            return None;
        }

        let mut result = SimpleSelector::default();
        let mut rest = selector;

        let tag_end = rest.find(['#', '.', '[']).unwrap_or(rest.len());
        if tag_end > 0 {
            let tag = &rest[..tag_end];
            if tag != "*" {
                result.tag = Some(tag.to_ascii_lowercase());
            }
        }
        rest = &rest[tag_end..];

        while let Some(first) = rest.chars().next() {
            match first {
                '#' | '.' => {
                    let body = &rest[1..];
                    let end = body.find(['#', '.', '[']).unwrap_or(body.len());
                    let name = &body[..end];
                    if name.is_empty() {
                        return None;
                    }
                    if first == '#' {
                        result.id = Some(name.to_string());
                    } else {
                        result.classes.push(name.to_string());
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let close = rest.find(']')?;
                    result.attrs.push(Self::parse_attr(&rest[1..close])?);
                    rest = &rest[close + 1..];
                }
                _ => return None,
            }
        }

        Some(result)
    }

    fn parse_attr(inner: &str) -> Option<(String, AttrOp, String)> {
        let Some(eq_pos) = inner.find('=') else {
            let name = inner.trim();
            return (!name.is_empty()).then(|| (name.to_ascii_lowercase(), AttrOp::Exists, String::new()));
        };

        let (name_part, value_part) = inner.split_at(eq_pos);
        let value = value_part[1..]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string();
        let name_part = name_part.trim();

        let (name, op) = match name_part.chars().last()? {
            '^' => (&name_part[..name_part.len() - 1], AttrOp::Prefix),
            '$' => (&name_part[..name_part.len() - 1], AttrOp::Suffix),
            '*' => (&name_part[..name_part.len() - 1], AttrOp::Contains),
            '~' => (&name_part[..name_part.len() - 1], AttrOp::Word),
            _ => (name_part, AttrOp::Equals),
        };
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_ascii_lowercase(), op, value))
    }

    /// Check an element against every part of the selector.
    pub fn matches(&self, elem: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if elem.tag_name.as_str() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| elem.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, op, value)| {
            let Some(actual) = elem.get_attribute(name) else {
                return false;
            };
            match op {
                AttrOp::Exists => true,
                AttrOp::Equals => actual == value,
                AttrOp::Prefix => actual.starts_with(value.as_str()),
                AttrOp::Suffix => actual.ends_with(value.as_str()),
                AttrOp::Contains => actual.contains(value.as_str()),
                AttrOp::Word => actual.split_whitespace().any(|w| w == value),
            }
        })
    }
}

/// Whitespace, `>`, `+`, `~` or `:` outside of attribute brackets.
fn has_combinator(selector: &str) -> bool {
    let mut in_brackets = false;
    for c in selector.chars() {
        match c {
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            c if !in_brackets && (c.is_whitespace() || matches!(c, '>' | '+' | '~' | ':' | ',')) => {
                return true
            }
            _ => {}
        }
    }
    false
}

/// Iterator over ancestor nodes.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for AncestorIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator over descendant nodes (pre-order traversal).
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Add children in reverse order so first child is processed first
        if let Some(node) = self.tree.nodes.get(current) {
            for &child in node.children.iter().rev() {
                self.stack.push(child);
            }
        }

        Some(current)
    }
}
