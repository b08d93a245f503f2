//! One depth level of the navigation octree

use rkyv::{Archive, Deserialize, Serialize};

use super::node::{NodeState, OctreeNode};

/// Nodes of a single depth, sorted by Morton code.
///
/// Children are appended in blocks of eight in parent order, so a sorted
/// layer falls out of breadth-first construction without an explicit sort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Archive, Deserialize, Serialize)]
pub struct OctreeLayer {
    nodes: Vec<OctreeNode>,
}

impl OctreeLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { nodes: Vec::with_capacity(capacity) }
    }

    pub fn from_nodes(nodes: Vec<OctreeNode>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&OctreeNode> {
        self.nodes.get(index)
    }

    pub fn push(&mut self, node: OctreeNode) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        index
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> Option<&mut OctreeNode> {
        self.nodes.get_mut(index)
    }

    /// Binary search by Morton code
    pub fn find(&self, morton: u64) -> Option<usize> {
        self.nodes.binary_search_by_key(&morton, |n| n.morton).ok()
    }

    /// True if Morton codes are strictly increasing
    pub fn is_sorted(&self) -> bool {
        self.nodes.windows(2).all(|w| w[0].morton < w[1].morton)
    }

    pub fn count(&self, state: NodeState) -> usize {
        self.nodes.iter().filter(|n| n.state() == state).count()
    }
}
