use log::warn;

use super::{Annotation, Axis, ColorSpec, Figure, Layout, Legend, Marker, Scatter, Shape, Title, Trace};
use crate::color::{ColorMap, FALLBACK_COLOR};
use crate::error::{Error, Result};
use crate::metadata::MetadataTable;
use crate::tree::coords::{CoordinateOptions, Coordinates};
use crate::tree::layout::{layout_tree, LayoutOptions};
use crate::tree::Tree;

pub const TREE_MARKER_SIZE: f64 = 5.0;

#[derive(Debug, Clone, Default)]
pub struct TreePlotOptions {
    pub title: String,
    pub coordinates: CoordinateOptions,
    pub layout: LayoutOptions,
}

/// Rectangular phylogram with one colored marker per leaf.
///
/// Every terminal must have a metadata row; unknown categories are drawn in
/// the fallback gray.
pub fn create_tree_plot(
    tree: &Tree,
    metadata: &MetadataTable,
    colors: &ColorMap,
    options: &TreePlotOptions,
) -> Result<Figure> {
    let coords = Coordinates::compute(tree, &options.coordinates)?;
    let shapes = layout_tree(tree, &coords, &options.layout)?;

    let terminals = tree.terminals();
    let mut x = Vec::with_capacity(terminals.len());
    let mut y = Vec::with_capacity(terminals.len());
    let mut text = Vec::with_capacity(terminals.len());
    let mut color = Vec::with_capacity(terminals.len());

    for node_id in terminals {
        let name = tree.nodes[node_id]
            .name
            .as_deref()
            .ok_or_else(|| Error::lookup(format!("terminal node {node_id} has no identifier")))?;
        let row = metadata.row(name)?;

        let marker_color = colors.color_or_fallback(&row.category);
        if marker_color == FALLBACK_COLOR {
            warn!(
                "no color assigned to '{}' (leaf {name}); using fallback",
                row.category
            );
        }

        let (node_x, node_y) = coords.position(node_id);
        x.push(node_x);
        y.push(node_y);
        text.push(format!(
            "{}: {}<br>ID: {}",
            metadata.category_label, row.category, name
        ));
        color.push(marker_color.to_string());
    }

    let trace = Trace::Scatter(Scatter {
        x,
        y,
        mode: "markers".to_string(),
        marker: Marker {
            color: ColorSpec::PerPoint(color),
            size: TREE_MARKER_SIZE,
            opacity: None,
        },
        text,
        hoverinfo: "text".to_string(),
        name: "Countries".to_string(),
        xaxis: None,
        yaxis: None,
    });

    let annotations: Vec<Annotation> = shapes.labels.iter().map(Annotation::from).collect();
    let layout = Layout {
        title: Some(Title::new(options.title.clone())),
        paper_bgcolor: Some("rgba(0,0,0,0)".to_string()),
        plot_bgcolor: Some("rgb(250,250,250)".to_string()),
        xaxis: Some(Axis {
            title: Some(Title::new("Branch Length")),
            ..Axis::default()
        }),
        yaxis: Some(Axis {
            title: Some(Title::new("")),
            showline: Some(false),
            zeroline: Some(false),
            showgrid: Some(false),
            showticklabels: Some(false),
            ..Axis::default()
        }),
        hovermode: Some("closest".to_string()),
        shapes: Some(shapes.lines.iter().map(Shape::from).collect()),
        annotations: (!annotations.is_empty()).then_some(annotations),
        legend: Some(Legend { x: 0.0, y: 1.0 }),
        ..Layout::default()
    };

    Ok(Figure::new(vec![trace], layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorSource;
    use crate::metadata::MetadataRow;
    use crate::tree::fixtures::small_tree;

    fn metadata() -> MetadataTable {
        MetadataTable::new(
            "Country",
            vec![
                MetadataRow::new("A", "Peru"),
                MetadataRow::new("B", "Chile"),
                MetadataRow::new("C", "Peru"),
            ],
        )
        .unwrap()
    }

    fn palette() -> ColorMap {
        ColorMap::assign(
            &["Peru", "Chile"],
            &ColorSource::Palette(vec!["red".to_string(), "blue".to_string()]),
        )
        .unwrap()
    }

    fn scatter(figure: &Figure) -> &Scatter {
        match &figure.data[0] {
            Trace::Scatter(scatter) => scatter,
            other => panic!("expected scatter trace, got {other:?}"),
        }
    }

    #[test]
    fn one_marker_per_leaf_with_category_colors() {
        let tree = small_tree();
        let figure = create_tree_plot(&tree, &metadata(), &palette(), &TreePlotOptions::default())
            .unwrap();

        let markers = scatter(&figure);
        assert_eq!(markers.x, vec![2.0, 2.0, 2.0]);
        assert_eq!(markers.text[1], "Country: Chile<br>ID: B");
        assert_eq!(
            markers.marker.color,
            ColorSpec::PerPoint(vec!["red".into(), "blue".into(), "red".into()])
        );
    }

    #[test]
    fn layout_carries_branch_shapes_and_title() {
        let tree = small_tree();
        let options = TreePlotOptions {
            title: "Sampled tree".to_string(),
            ..TreePlotOptions::default()
        };
        let figure = create_tree_plot(&tree, &metadata(), &palette(), &options).unwrap();

        assert_eq!(figure.title(), "Sampled tree");
        let shapes = figure.layout.shapes.as_ref().unwrap();
        assert_eq!(shapes.len(), tree.nodes.len() + tree.internal_count());
        assert!(shapes.iter().all(|shape| shape.layer == "below"));
        assert!(figure.layout.annotations.is_none());
    }

    #[test]
    fn support_values_become_annotations() {
        let tree = small_tree();
        let mut options = TreePlotOptions::default();
        options.layout.show_confidence = true;
        let figure = create_tree_plot(&tree, &metadata(), &palette(), &options).unwrap();

        let annotations = figure.layout.annotations.unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].text, "90.00");
        assert_eq!(annotations[0].xanchor.as_deref(), Some("right"));
        assert_eq!(annotations[0].yanchor.as_deref(), Some("bottom"));
    }

    #[test]
    fn unknown_category_is_drawn_gray() {
        let tree = small_tree();
        let colors = ColorMap::assign(
            &["Peru"],
            &ColorSource::Palette(vec!["red".to_string()]),
        )
        .unwrap();
        let figure =
            create_tree_plot(&tree, &metadata(), &colors, &TreePlotOptions::default()).unwrap();
        let ColorSpec::PerPoint(colors) = &scatter(&figure).marker.color else {
            panic!("expected per-point colors");
        };
        assert_eq!(colors[1], FALLBACK_COLOR);
    }

    #[test]
    fn mismatched_identifier_is_a_lookup_error() {
        let tree = small_tree();
        let metadata = MetadataTable::new(
            "Country",
            vec![
                MetadataRow::new("A", "Peru"),
                MetadataRow::new("B-renamed", "Chile"),
                MetadataRow::new("C", "Peru"),
            ],
        )
        .unwrap();
        let err = create_tree_plot(&tree, &metadata, &palette(), &TreePlotOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Lookup(_)));
    }
}
