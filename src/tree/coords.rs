//! Plotting coordinates for every node of a rooted tree.
//!
//! x is the depth of a node (cumulative branch length from the root) and y
//! is its vertical slot. Leaves are stacked at a fixed spacing and every
//! internal node sits halfway between its first and last child, which gives
//! the familiar ladder-shaped rectangular phylogram.

use log::debug;

use super::{NodeId, Tree};
use crate::error::{Error, Result};

pub const DEFAULT_LEAF_SPACING: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateOptions {
    /// Vertical distance between consecutive leaves.
    pub spacing: f64,
}

impl Default for CoordinateOptions {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_LEAF_SPACING,
        }
    }
}

/// Per-node coordinates stored in parallel arrays indexed by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Coordinates {
    pub fn compute(tree: &Tree, options: &CoordinateOptions) -> Result<Self> {
        let coords = Self {
            x: x_coordinates(tree)?,
            y: y_coordinates(tree, options.spacing)?,
        };
        debug!(
            "computed coordinates for {} node(s), max depth {:.4}",
            tree.nodes.len(),
            coords.max_x()
        );
        Ok(coords)
    }

    pub fn position(&self, node_id: NodeId) -> (f64, f64) {
        (self.x[node_id], self.y[node_id])
    }

    pub fn max_x(&self) -> f64 {
        self.x.iter().copied().fold(0.0f64, f64::max)
    }
}

/// Depth of every node. Falls back to unit branch lengths when all lengths
/// are absent or zero so the tree still spreads horizontally.
pub fn x_coordinates(tree: &Tree) -> Result<Vec<f64>> {
    let weighted = depths(tree, false)?;
    if weighted.iter().copied().fold(0.0f64, f64::max) > 0.0 {
        return Ok(weighted);
    }
    depths(tree, true)
}

/// Cumulative distance from the root. The root starts at its own branch
/// length (0 when absent); missing lengths below it count as 0, or as 1 with
/// `unit_branch_lengths`.
pub fn depths(tree: &Tree, unit_branch_lengths: bool) -> Result<Vec<f64>> {
    tree.root_id()?;
    let mut distances = vec![0.0; tree.nodes.len()];

    // Pre-order: a parent's distance is always known before its children.
    for node_id in tree.preorder() {
        let node = &tree.nodes[node_id];
        distances[node_id] = match node.parent {
            Some(parent_id) => {
                let branch_length = if unit_branch_lengths {
                    1.0
                } else {
                    node.length.unwrap_or(0.0)
                };
                distances[parent_id] + branch_length
            }
            None => node.length.unwrap_or(0.0),
        };
    }
    Ok(distances)
}

/// Vertical slot of every node.
///
/// Terminals are enumerated in reverse traversal order and the i-th one gets
/// `leaf_count - i * spacing`. Internal nodes take the midpoint of their
/// first and last child, filled bottom-up.
pub fn y_coordinates(tree: &Tree, spacing: f64) -> Result<Vec<f64>> {
    tree.root_id()?;
    let order = tree.preorder();
    let terminals: Vec<NodeId> = order
        .iter()
        .copied()
        .filter(|&id| tree.nodes[id].is_leaf())
        .collect();
    if terminals.is_empty() {
        return Err(Error::EmptyTree);
    }

    let max_height = terminals.len() as f64;
    let mut rows = vec![0.0; tree.nodes.len()];
    for (index, &leaf_id) in terminals.iter().rev().enumerate() {
        rows[leaf_id] = max_height - index as f64 * spacing;
    }

    // Reversed pre-order visits children before their parent.
    for &node_id in order.iter().rev() {
        let children = &tree.nodes[node_id].children;
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            rows[node_id] = (rows[first] + rows[last]) / 2.0;
        }
    }
    Ok(rows)
}
