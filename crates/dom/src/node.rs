//! Tree nodes.

use crate::element::ElementData;
use common::Rect;
use slotmap::new_key_type;
use smallvec::SmallVec;

new_key_type! {
    /// Unique identifier for a DOM node.
    pub struct NodeId;
}

/// What a node holds. The document node is the tree root; everything else
/// is an element.
#[derive(Clone, Debug)]
pub enum NodeData {
    Document,
    Element(ElementData),
}

/// A DOM node.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 8]>,
    /// Box assigned by the host's layout pass, in viewport coordinates.
    pub layout_box: Option<Rect>,
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            data: self.data.clone(),
            parent: self.parent,
            children: self.children.clone(),
            // Clones are not laid out until the host assigns a box
            layout_box: None,
        }
    }
}

impl Node {
    fn new(id: NodeId, data: NodeData) -> Self {
        Self {
            id,
            data,
            parent: None,
            children: SmallVec::new(),
            layout_box: None,
        }
    }

    pub fn new_document(id: NodeId) -> Self {
        Self::new(id, NodeData::Document)
    }

    pub fn new_element(id: NodeId, data: ElementData) -> Self {
        Self::new(id, NodeData::Element(data))
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(data) => Some(data),
            NodeData::Document => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(data) => Some(data),
            NodeData::Document => None,
        }
    }
}
