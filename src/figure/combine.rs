use super::{Annotation, Axis, Domain, Figure, Font, Geo, Layout, Title, Trace};

/// Horizontal extent of the tree (left) and map (right) panels, in paper
/// coordinates.
pub const TREE_DOMAIN: [f64; 2] = [0.0, 0.45];
pub const MAP_DOMAIN: [f64; 2] = [0.55, 1.0];

/// Place the tree on the left and the map on the right of one figure.
///
/// Panel titles come from the sub-figures. The map layout is applied first
/// and the tree layout second; the overall title, hidden legend and white
/// paper are applied last and win over both.
pub fn combine_figures(tree: &Figure, world_map: &Figure, title: &str) -> Figure {
    let mut layout = Layout {
        xaxis: Some(Axis {
            domain: Some(TREE_DOMAIN),
            anchor: Some("y".to_string()),
            ..Axis::default()
        }),
        yaxis: Some(Axis {
            domain: Some([0.0, 1.0]),
            anchor: Some("x".to_string()),
            ..Axis::default()
        }),
        geo: Some(Geo {
            domain: Some(Domain {
                x: MAP_DOMAIN,
                y: [0.0, 1.0],
            }),
            ..Geo::default()
        }),
        ..Layout::default()
    };

    let mut data: Vec<Trace> = Vec::with_capacity(tree.data.len() + world_map.data.len());
    data.extend(world_map.data.iter().cloned().map(on_map_panel));
    data.extend(tree.data.iter().cloned().map(on_tree_panel));

    let mut map_layout = world_map.layout.clone();
    map_layout.title = None;
    map_layout.annotations = None;
    layout.update(map_layout);

    let mut tree_layout = tree.layout.clone();
    tree_layout.title = None;
    let tree_annotations = tree_layout.annotations.take().unwrap_or_default();
    layout.update(tree_layout);

    let mut annotations = vec![
        panel_title(tree.title(), TREE_DOMAIN),
        panel_title(world_map.title(), MAP_DOMAIN),
    ];
    annotations.extend(tree_annotations);
    layout.annotations = Some(annotations);

    layout.update(Layout {
        title: Some(Title::new(title)),
        showlegend: Some(false),
        paper_bgcolor: Some("white".to_string()),
        ..Layout::default()
    });

    Figure::new(data, layout)
}

fn on_map_panel(trace: Trace) -> Trace {
    match trace {
        Trace::Choropleth(mut choropleth) => {
            choropleth.geo = Some("geo".to_string());
            Trace::Choropleth(choropleth)
        }
        Trace::Scattergeo(mut scatter) => {
            scatter.geo = Some("geo".to_string());
            Trace::Scattergeo(scatter)
        }
        other => other,
    }
}

fn on_tree_panel(trace: Trace) -> Trace {
    match trace {
        Trace::Scatter(mut scatter) => {
            scatter.xaxis = Some("x".to_string());
            scatter.yaxis = Some("y".to_string());
            Trace::Scatter(scatter)
        }
        other => other,
    }
}

fn panel_title(text: &str, domain: [f64; 2]) -> Annotation {
    Annotation {
        x: (domain[0] + domain[1]) / 2.0,
        y: 1.0,
        text: text.to_string(),
        showarrow: false,
        xanchor: Some("center".to_string()),
        yanchor: Some("bottom".to_string()),
        bgcolor: None,
        xref: Some("paper".to_string()),
        yref: Some("paper".to_string()),
        font: Some(Font { size: 16.0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorMap, ColorSource};
    use crate::figure::{create_tree_plot, create_world_map, MapOptions, TreePlotOptions};
    use crate::metadata::{MetadataRow, MetadataTable};
    use crate::tree::fixtures::small_tree;

    fn figures(show_confidence: bool) -> (Figure, Figure) {
        let metadata = MetadataTable::new(
            "Country",
            vec![
                MetadataRow::new("A", "Peru"),
                MetadataRow::new("B", "Chile"),
                MetadataRow::new("C", "Kenya"),
            ],
        )
        .unwrap();
        let colors = ColorMap::from_metadata(&metadata, &ColorSource::default()).unwrap();

        let mut tree_options = TreePlotOptions {
            title: "Tree panel".to_string(),
            ..TreePlotOptions::default()
        };
        tree_options.layout.show_confidence = show_confidence;
        let tree = create_tree_plot(&small_tree(), &metadata, &colors, &tree_options).unwrap();

        let map_options = MapOptions {
            title: "Map panel".to_string(),
            ..MapOptions::default()
        };
        let world_map = create_world_map(&metadata, &colors, &map_options).unwrap();
        (tree, world_map)
    }

    #[test]
    fn panel_titles_come_from_sub_figures() {
        let (tree, world_map) = figures(false);
        let combined = combine_figures(&tree, &world_map, "Overall");

        let annotations = combined.layout.annotations.as_ref().unwrap();
        assert_eq!(annotations[0].text, "Tree panel");
        assert_eq!(annotations[1].text, "Map panel");
        assert_eq!(combined.title(), "Overall");
    }

    #[test]
    fn final_settings_override_sub_figures() {
        let (tree, world_map) = figures(false);
        let combined = combine_figures(&tree, &world_map, "");

        assert_eq!(combined.title(), "");
        assert_eq!(combined.layout.paper_bgcolor.as_deref(), Some("white"));
        assert_eq!(combined.layout.showlegend, Some(false));
        // Tree layout survives underneath.
        assert_eq!(combined.layout.plot_bgcolor.as_deref(), Some("rgb(250,250,250)"));
        assert!(combined.layout.shapes.is_some());
    }

    #[test]
    fn traces_are_routed_to_their_panels() {
        let (tree, world_map) = figures(false);
        let combined = combine_figures(&tree, &world_map, "Overall");

        assert_eq!(combined.data.len(), world_map.data.len() + tree.data.len());
        for trace in &combined.data {
            match trace {
                Trace::Scatter(scatter) => {
                    assert_eq!(scatter.xaxis.as_deref(), Some("x"));
                    assert_eq!(scatter.yaxis.as_deref(), Some("y"));
                }
                Trace::Choropleth(choropleth) => {
                    assert_eq!(choropleth.geo.as_deref(), Some("geo"))
                }
                Trace::Scattergeo(scatter) => assert_eq!(scatter.geo.as_deref(), Some("geo")),
            }
        }

        let geo = combined.layout.geo.as_ref().unwrap();
        assert_eq!(geo.domain.as_ref().unwrap().x, MAP_DOMAIN);
        assert_eq!(geo.resolution, Some(110));
        assert_eq!(
            combined.layout.xaxis.as_ref().unwrap().domain,
            Some(TREE_DOMAIN)
        );
    }

    #[test]
    fn support_annotations_follow_panel_titles() {
        let (tree, world_map) = figures(true);
        let combined = combine_figures(&tree, &world_map, "Overall");
        let annotations = combined.layout.annotations.unwrap();
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[2].text, "90.00");
    }
}
