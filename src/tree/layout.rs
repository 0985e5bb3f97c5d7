use std::fmt;
use std::str::FromStr;

use log::debug;

use super::coords::Coordinates;
use super::{NodeId, Tree};
use crate::error::{Error, Result};

pub const DEFAULT_LINE_COLOR: &str = "rgb(25,25,25)";
pub const DEFAULT_LINE_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            other => Err(Error::config(format!(
                "line type can be 'horizontal' or 'vertical', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_LINE_COLOR.to_string(),
            width: DEFAULT_LINE_WIDTH,
        }
    }
}

/// Axis-aligned branch segment, drawn beneath markers.
#[derive(Debug, Clone, PartialEq)]
pub struct LineShape {
    pub orientation: Orientation,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub style: LineStyle,
    /// The node this segment belongs to.
    pub node: NodeId,
}

/// Support value printed at the right end of a branch.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportLabel {
    pub position: (f64, f64),
    pub value: f64,
    pub node: NodeId,
}

impl SupportLabel {
    pub fn text(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// Everything the layout walk emits for one subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeSet {
    pub lines: Vec<LineShape>,
    pub labels: Vec<SupportLabel>,
}

impl ShapeSet {
    pub fn count(&self, orientation: Orientation) -> usize {
        self.lines
            .iter()
            .filter(|line| line.orientation == orientation)
            .count()
    }
}

/// Parameters of one branch segment. Horizontal segments use `y_curr`,
/// `x_start` and `x_curr`; vertical ones use `x_curr`, `y_bot` and `y_top`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentSpec {
    pub y_curr: f64,
    pub x_start: f64,
    pub x_curr: f64,
    pub y_bot: f64,
    pub y_top: f64,
}

pub fn clade_line(
    orientation: Orientation,
    spec: SegmentSpec,
    style: &LineStyle,
    node: NodeId,
) -> LineShape {
    let (start, end) = match orientation {
        Orientation::Horizontal => ((spec.x_start, spec.y_curr), (spec.x_curr, spec.y_curr)),
        Orientation::Vertical => ((spec.x_curr, spec.y_bot), (spec.x_curr, spec.y_top)),
    };
    LineShape {
        orientation,
        start,
        end,
        style: style.clone(),
        node,
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    pub style: LineStyle,
    /// Emit a label for every node that carries a support value.
    pub show_confidence: bool,
}

/// Lay out the whole tree starting at the root with `x_start = 0`.
///
/// Clades are visited in pre-order with an explicit stack, so deep or
/// ladder-shaped trees cost linear time and constant call depth.
pub fn layout_tree(tree: &Tree, coords: &Coordinates, options: &LayoutOptions) -> Result<ShapeSet> {
    let root_id = tree.root_id()?;
    let mut shapes = ShapeSet::default();

    let mut stack = vec![(root_id, 0.0)];
    while let Some((node_id, x_start)) = stack.pop() {
        draw_clade(tree, coords, node_id, x_start, options, &mut shapes);
        let x_curr = coords.x[node_id];
        for &child_id in tree.nodes[node_id].children.iter().rev() {
            stack.push((child_id, x_curr));
        }
    }

    debug!(
        "tree layout: {} horizontal, {} vertical segment(s), {} support label(s)",
        shapes.count(Orientation::Horizontal),
        shapes.count(Orientation::Vertical),
        shapes.labels.len()
    );
    Ok(shapes)
}

/// Emit the branch into `node_id`, its support label and the vertical
/// connector spanning its children.
pub fn draw_clade(
    tree: &Tree,
    coords: &Coordinates,
    node_id: NodeId,
    x_start: f64,
    options: &LayoutOptions,
    shapes: &mut ShapeSet,
) {
    let node = &tree.nodes[node_id];
    let (x_curr, y_curr) = coords.position(node_id);

    shapes.lines.push(clade_line(
        Orientation::Horizontal,
        SegmentSpec {
            y_curr,
            x_start,
            x_curr,
            ..SegmentSpec::default()
        },
        &options.style,
        node_id,
    ));

    if options.show_confidence {
        if let Some(value) = node.confidence {
            shapes.labels.push(SupportLabel {
                position: (x_curr, y_curr),
                value,
                node: node_id,
            });
        }
    }

    let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) else {
        return;
    };

    shapes.lines.push(clade_line(
        Orientation::Vertical,
        SegmentSpec {
            x_curr,
            y_bot: coords.y[last],
            y_top: coords.y[first],
            ..SegmentSpec::default()
        },
        &options.style,
        node_id,
    ));
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::tree::coords::CoordinateOptions;
    use crate::tree::fixtures::{attach, caterpillar, small_tree};
    use crate::tree::TreeNode;

    fn layout(tree: &Tree, show_confidence: bool) -> ShapeSet {
        let coords = Coordinates::compute(tree, &CoordinateOptions::default()).unwrap();
        let options = LayoutOptions {
            show_confidence,
            ..LayoutOptions::default()
        };
        layout_tree(tree, &coords, &options).unwrap()
    }

    #[test]
    fn parses_orientation_names() {
        assert_eq!("horizontal".parse::<Orientation>().unwrap(), Orientation::Horizontal);
        assert_eq!(" Vertical ".parse::<Orientation>().unwrap(), Orientation::Vertical);
        assert!(matches!(
            "diagonal".parse::<Orientation>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn childless_root_yields_single_horizontal_segment() {
        let tree = Tree::from_nodes(0, None, vec![TreeNode::new(0, Some("solo".into()), None)]);
        let shapes = layout(&tree, true);
        assert_eq!(shapes.count(Orientation::Horizontal), 1);
        assert_eq!(shapes.count(Orientation::Vertical), 0);
        assert!(shapes.labels.is_empty());
    }

    #[test]
    fn two_leaf_tree_produces_expected_segments() {
        let mut nodes = vec![
            TreeNode::new(0, None, None),
            TreeNode::new(1, Some("L1".into()), Some(1.0)),
            TreeNode::new(2, Some("L2".into()), Some(1.0)),
        ];
        attach(&mut nodes, 0, 1);
        attach(&mut nodes, 0, 2);
        let tree = Tree::from_nodes(0, None, nodes);
        let coords = Coordinates::compute(&tree, &CoordinateOptions::default()).unwrap();
        let shapes = layout_tree(&tree, &coords, &LayoutOptions::default()).unwrap();

        assert_eq!(shapes.count(Orientation::Horizontal), 3);
        assert_eq!(shapes.count(Orientation::Vertical), 1);

        // Root branch is degenerate at x = 0.
        assert_eq!(shapes.lines[0].start, (0.0, coords.y[0]));
        assert_eq!(shapes.lines[0].end, (0.0, coords.y[0]));

        let vertical = &shapes.lines[1];
        assert_eq!(vertical.orientation, Orientation::Vertical);
        assert_eq!(vertical.start, (0.0, coords.y[2]));
        assert_eq!(vertical.end, (0.0, coords.y[1]));

        for (line, leaf) in shapes.lines[2..].iter().zip([1, 2]) {
            assert_eq!(line.orientation, Orientation::Horizontal);
            assert_relative_eq!(line.start.0, 0.0);
            assert_relative_eq!(line.end.0, 1.0);
            assert_relative_eq!(line.start.1, coords.y[leaf]);
        }
    }

    #[test]
    fn segment_counts_track_node_counts() {
        let tree = small_tree();
        let shapes = layout(&tree, false);
        assert_eq!(shapes.count(Orientation::Horizontal), tree.nodes.len());
        assert_eq!(shapes.count(Orientation::Vertical), tree.internal_count());
    }

    #[test]
    fn emits_in_preorder() {
        let tree = small_tree();
        let shapes = layout(&tree, false);
        let owners: Vec<NodeId> = shapes.lines.iter().map(|line| line.node).collect();
        assert_eq!(owners, vec![0, 0, 1, 1, 2, 3, 4]);
    }

    #[test]
    fn child_branches_start_at_parent_depth() {
        let tree = small_tree();
        let coords = Coordinates::compute(&tree, &CoordinateOptions::default()).unwrap();
        let shapes = layout_tree(&tree, &coords, &LayoutOptions::default()).unwrap();
        for line in shapes
            .lines
            .iter()
            .filter(|line| line.orientation == Orientation::Horizontal)
        {
            let node = &tree.nodes[line.node];
            let expected_start = node.parent.map(|p| coords.x[p]).unwrap_or(0.0);
            assert_relative_eq!(line.start.0, expected_start);
            assert_relative_eq!(line.end.0, coords.x[line.node]);
        }
    }

    #[test]
    fn support_labels_only_when_enabled_and_present() {
        let tree = small_tree();
        assert!(layout(&tree, false).labels.is_empty());

        let labels = layout(&tree, true).labels;
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].node, 1);
        assert_eq!(labels[0].text(), "90.00");
    }

    #[test]
    fn segments_inherit_style() {
        let tree = small_tree();
        let coords = Coordinates::compute(&tree, &CoordinateOptions::default()).unwrap();
        let options = LayoutOptions {
            style: LineStyle {
                color: "rgb(15,15,15)".to_string(),
                width: 0.5,
            },
            show_confidence: false,
        };
        let shapes = layout_tree(&tree, &coords, &options).unwrap();
        assert!(shapes
            .lines
            .iter()
            .all(|line| line.style.color == "rgb(15,15,15)" && line.style.width == 0.5));
    }

    #[test]
    fn deep_ladder_trees_lay_out_without_recursion() {
        let tree = caterpillar(50_000);
        let shapes = layout(&tree, false);
        assert_eq!(shapes.count(Orientation::Horizontal), tree.nodes.len());
        assert_eq!(shapes.count(Orientation::Vertical), 49_999);
        // Pre-order: the root's branch and connector come first.
        assert_eq!(shapes.lines[0].node, 0);
        assert_eq!(shapes.lines[1].orientation, Orientation::Vertical);
    }

    #[test]
    fn draw_clade_emits_only_its_own_segments() {
        let tree = small_tree();
        let coords = Coordinates::compute(&tree, &CoordinateOptions::default()).unwrap();
        let mut shapes = ShapeSet::default();
        draw_clade(&tree, &coords, 1, 0.0, &LayoutOptions::default(), &mut shapes);
        assert_eq!(shapes.lines.len(), 2);
        assert!(shapes.lines.iter().all(|line| line.node == 1));
    }
}
