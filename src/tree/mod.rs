use phylotree::tree::{Node as PhyloNode, Tree as PhyloTree};

use crate::error::{Error, Result};

pub mod coords;
pub mod layout;

pub type NodeId = phylotree::tree::NodeId;

/// Representation of a phylogenetic tree with an explicit node list.
///
/// Nodes live in an arena indexed by [`NodeId`]; everything derived from the
/// tree (coordinates, shapes, markers) is keyed by that index.
#[derive(Debug, Clone)]
pub struct Tree {
    pub id: usize,
    pub label: Option<String>,
    pub newick: String,
    pub root: Option<NodeId>,
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn new(id: usize, label: Option<String>, newick: String, phylo: &PhyloTree) -> Self {
        let root = phylo.get_root().ok();
        let nodes = Self::build_nodes_from_phylo(phylo);
        Self {
            id,
            label,
            newick,
            root,
            nodes,
        }
    }

    /// Build a tree directly from an arena whose parent/child links are
    /// already consistent. The root is the first node without a parent.
    pub fn from_nodes(id: usize, label: Option<String>, nodes: Vec<TreeNode>) -> Self {
        let root = nodes.iter().find(|node| node.is_root()).map(|node| node.id);
        Self {
            id,
            label,
            newick: String::new(),
            root,
            nodes,
        }
    }

    /// Root id, or [`Error::EmptyTree`] when the arena is empty.
    pub fn root_id(&self) -> Result<NodeId> {
        self.root.ok_or(Error::EmptyTree)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn internal_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_leaf()).count()
    }

    /// All nodes reachable from the root, parents before children, siblings
    /// in their stored order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root_id) = self.root else {
            return order;
        };

        let mut stack = vec![root_id];
        while let Some(node_id) = stack.pop() {
            order.push(node_id);
            // Reverse so the first child is visited first.
            for &child_id in self.nodes[node_id].children.iter().rev() {
                stack.push(child_id);
            }
        }
        order
    }

    /// Terminal nodes in traversal order (top of the Newick string first).
    pub fn terminals(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.nodes[id].is_leaf())
            .collect()
    }

    fn build_nodes_from_phylo(phylo: &PhyloTree) -> Vec<TreeNode> {
        let mut nodes = Vec::with_capacity(phylo.size());
        for idx in 0..phylo.size() {
            match phylo.get(&idx) {
                Ok(node) => nodes.push(TreeNode::from_phylo(node)),
                Err(_) => nodes.push(TreeNode::new(idx, None, None)),
            }
        }
        nodes
    }
}

/// Node within a phylogenetic tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: Option<String>,
    pub length: Option<f64>,
    /// Bootstrap / posterior support, read from numeric internal labels.
    pub confidence: Option<f64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn new(id: NodeId, name: Option<String>, length: Option<f64>) -> Self {
        Self {
            id,
            name,
            length,
            confidence: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn from_phylo(node: &PhyloNode) -> Self {
        let mut tree_node = TreeNode::new(node.id, node.name.clone(), node.parent_edge);
        tree_node.parent = node.parent;
        tree_node.children = node.children.clone();

        // Internal labels such as "95" or "0.87" carry support values.
        if !tree_node.children.is_empty() {
            if let Some(value) = tree_node
                .name
                .as_deref()
                .and_then(|label| label.trim().parse::<f64>().ok())
            {
                tree_node.confidence = Some(value);
                tree_node.name = None;
            }
        }
        tree_node
    }
}

/// Container for the full contents of an imported file.
#[derive(Debug, Clone)]
pub struct TreeBundle {
    pub format: TreeFileFormat,
    pub trees: Vec<Tree>,
}

impl TreeBundle {
    pub fn new(format: TreeFileFormat, trees: Vec<Tree>) -> Self {
        Self { format, trees }
    }

    /// Select one tree by zero-based position in the file.
    pub fn tree(&self, index: usize) -> Result<&Tree> {
        self.trees.get(index).ok_or_else(|| {
            Error::lookup(format!(
                "tree index {index} out of range ({} tree(s) loaded)",
                self.trees.len()
            ))
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TreeFileFormat {
    Newick,
    Nexus,
}
