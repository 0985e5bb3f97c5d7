//! Static SVG rendering of a [`Figure`].
//!
//! Cartesian content (branch shapes, leaf markers, support labels) is drawn
//! in the tree panel. Geographic traces are drawn in the map panel on an
//! equirectangular grid: scattergeo traces as points, choropleth traces as a
//! legend of category swatches since no country outlines are bundled.

use std::path::Path;

use svg::node::element::{Circle, Group, Line, Rectangle, Text};
use svg::Document;

use crate::error::{Error, Result};
use crate::figure::{Annotation, ColorSpec, Figure, Trace};

const DEFAULT_WIDTH: f64 = 1200.0;
const DEFAULT_HEIGHT: f64 = 600.0;
const TITLE_BAND: f64 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Panel {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Panel {
    fn inset(self, margin_x: f64, margin_y: f64) -> Self {
        Self {
            left: self.left + margin_x,
            top: self.top + margin_y,
            width: (self.width - 2.0 * margin_x).max(1.0),
            height: (self.height - 2.0 * margin_y).max(1.0),
        }
    }
}

/// Data-space bounds of everything drawn in the tree panel.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        if x.is_finite() {
            self.min_x = self.min_x.min(x);
            self.max_x = self.max_x.max(x);
        }
        if y.is_finite() {
            self.min_y = self.min_y.min(y);
            self.max_y = self.max_y.max(y);
        }
    }

    fn is_valid(&self) -> bool {
        self.min_x.is_finite() && self.max_y.is_finite()
    }

    fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Round `total` down to a 0.5/1/2 multiple of its decade for the scale bar.
fn nice_tick_span(total: f64) -> Option<f64> {
    if total <= f64::EPSILON {
        return None;
    }

    let magnitude = 10.0f64.powf(total.log10().floor());
    let normalized = total / magnitude;
    let nice = if normalized < 2.0 {
        0.5
    } else if normalized < 5.0 {
        1.0
    } else {
        2.0
    };
    Some(nice * magnitude)
}

fn text(content: impl Into<String>, x: f64, y: f64, size: f64) -> Text {
    Text::new("")
        .set("x", x)
        .set("y", y)
        .set("font-size", size)
        .set("font-family", "sans-serif")
        .add(svg::node::Text::new(content.into()))
}

pub fn render_svg(figure: &Figure) -> Document {
    let width = figure.layout.width.map(f64::from).unwrap_or(DEFAULT_WIDTH);
    let height = figure.layout.height.map(f64::from).unwrap_or(DEFAULT_HEIGHT);

    let has_cartesian = figure
        .data
        .iter()
        .any(|trace| matches!(trace, Trace::Scatter(_)))
        || figure.layout.shapes.as_ref().is_some_and(|s| !s.is_empty());
    let has_geo = figure
        .data
        .iter()
        .any(|trace| !matches!(trace, Trace::Scatter(_)));

    let body = Panel {
        left: 0.0,
        top: TITLE_BAND,
        width,
        height: height - TITLE_BAND,
    };
    let span = |domain: Option<[f64; 2]>, fallback: [f64; 2]| {
        let [start, end] = domain.unwrap_or(fallback);
        Panel {
            left: body.left + start * body.width,
            width: (end - start) * body.width,
            ..body
        }
    };
    let (tree_panel, map_panel) = match (has_cartesian, has_geo) {
        (true, true) => (
            span(
                figure.layout.xaxis.as_ref().and_then(|axis| axis.domain),
                [0.0, 0.45],
            ),
            span(
                figure
                    .layout
                    .geo
                    .as_ref()
                    .and_then(|geo| geo.domain.as_ref())
                    .map(|domain| domain.x),
                [0.55, 1.0],
            ),
        ),
        _ => (body, body),
    };

    let mut document = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0, 0, width as i32, height as i32));

    let background = figure
        .layout
        .paper_bgcolor
        .clone()
        .unwrap_or_else(|| "white".to_string());
    document = document.add(
        Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", background),
    );

    let title = figure.title();
    if !title.is_empty() {
        document = document.add(
            text(title, width * 0.5, TITLE_BAND * 0.6, 18.0).set("text-anchor", "middle"),
        );
    }

    if has_cartesian {
        document = document.add(render_tree_panel(figure, tree_panel));
    }
    if has_geo {
        document = document.add(render_map_panel(figure, map_panel));
    }

    for annotation in paper_annotations(figure) {
        let x = annotation.x * width;
        let y = TITLE_BAND + (1.0 - annotation.y) * (height - TITLE_BAND) - 4.0;
        let size = annotation.font.as_ref().map(|font| font.size).unwrap_or(12.0);
        document = document.add(text(&annotation.text, x, y, size).set("text-anchor", "middle"));
    }

    document
}

fn paper_annotations(figure: &Figure) -> impl Iterator<Item = &Annotation> {
    figure
        .layout
        .annotations
        .iter()
        .flatten()
        .filter(|annotation| annotation.xref.as_deref() == Some("paper"))
}

fn render_tree_panel(figure: &Figure, panel: Panel) -> Group {
    let mut group = Group::new().set("id", "tree");

    let plot_background = figure.layout.plot_bgcolor.clone();
    if let Some(fill) = plot_background {
        group = group.add(
            Rectangle::new()
                .set("x", panel.left)
                .set("y", panel.top)
                .set("width", panel.width)
                .set("height", panel.height)
                .set("fill", fill),
        );
    }

    let shapes = figure.layout.shapes.as_deref().unwrap_or(&[]);
    let mut bounds = Bounds::empty();
    for shape in shapes {
        bounds.include(shape.x0, shape.y0);
        bounds.include(shape.x1, shape.y1);
    }
    for trace in &figure.data {
        if let Trace::Scatter(scatter) = trace {
            for (&x, &y) in scatter.x.iter().zip(&scatter.y) {
                bounds.include(x, y);
            }
        }
    }
    if !bounds.is_valid() {
        return group;
    }

    let margin_x = (panel.width * 0.05).clamp(20.0, 60.0);
    let margin_y = (panel.height * 0.05).clamp(20.0, 40.0);
    let inner = panel.inset(margin_x, margin_y);

    let scale_x = if bounds.width() <= f64::EPSILON {
        inner.width
    } else {
        inner.width / bounds.width()
    };
    let scale_y = if bounds.height() <= f64::EPSILON {
        inner.height
    } else {
        inner.height / bounds.height()
    };
    // Data y grows upwards, SVG y downwards.
    let to_svg = |x: f64, y: f64| -> (f64, f64) {
        (
            inner.left + (x - bounds.min_x) * scale_x,
            inner.top + (bounds.max_y - y) * scale_y,
        )
    };

    for shape in shapes {
        let (x1, y1) = to_svg(shape.x0, shape.y0);
        let (x2, y2) = to_svg(shape.x1, shape.y1);
        group = group.add(
            Line::new()
                .set("x1", x1)
                .set("y1", y1)
                .set("x2", x2)
                .set("y2", y2)
                .set("stroke", shape.line.color.as_str())
                .set("stroke-width", shape.line.width),
        );
    }

    for trace in &figure.data {
        let Trace::Scatter(scatter) = trace else {
            continue;
        };
        for (index, (&x, &y)) in scatter.x.iter().zip(&scatter.y).enumerate() {
            let (cx, cy) = to_svg(x, y);
            let fill = match &scatter.marker.color {
                ColorSpec::Single(color) => color.as_str(),
                ColorSpec::PerPoint(colors) => colors.get(index).map_or("black", |c| c.as_str()),
            };
            let mut circle = Circle::new()
                .set("cx", cx)
                .set("cy", cy)
                .set("r", scatter.marker.size * 0.5)
                .set("fill", fill);
            if let Some(hover) = scatter.text.get(index) {
                circle = circle.set("data-label", hover.replace("<br>", "; "));
            }
            group = group.add(circle);
        }
    }

    for annotation in figure
        .layout
        .annotations
        .iter()
        .flatten()
        .filter(|annotation| annotation.xref.is_none())
    {
        let (x, y) = to_svg(annotation.x, annotation.y);
        let anchor = match annotation.xanchor.as_deref() {
            Some("right") => "end",
            Some("center") => "middle",
            _ => "start",
        };
        let mut label = text(&annotation.text, x - 2.0, y - 2.0, 10.0).set("text-anchor", anchor);
        if let Some(bg) = &annotation.bgcolor {
            // Plain SVG has no text background; a light halo keeps labels legible.
            label = label
                .set("stroke", bg.as_str())
                .set("stroke-width", 3.0)
                .set("paint-order", "stroke");
        }
        group = group.add(label);
    }

    if let Some(tick) = nice_tick_span(bounds.width()) {
        let baseline_y = panel.top + panel.height - margin_y * 0.3;
        let start_x = inner.left;
        let end_x = start_x + tick * scale_x;
        group = group
            .add(
                Line::new()
                    .set("x1", start_x)
                    .set("y1", baseline_y)
                    .set("x2", end_x)
                    .set("y2", baseline_y)
                    .set("stroke", "#505050")
                    .set("stroke-width", 1.5),
            )
            .add(
                text(format!("{tick}"), (start_x + end_x) * 0.5, baseline_y - 4.0, 10.0)
                    .set("text-anchor", "middle"),
            );
    }

    group
}

fn render_map_panel(figure: &Figure, panel: Panel) -> Group {
    let mut group = Group::new().set("id", "map");
    let geo = figure.layout.geo.clone().unwrap_or_default();

    // Keep a 2:1 equirectangular aspect inside the panel.
    let map_width = panel.width.min(panel.height * 2.0) * 0.95;
    let map_height = map_width / 2.0;
    let frame = Panel {
        left: panel.left + (panel.width - map_width) / 2.0,
        top: panel.top + (panel.height - map_height) / 2.0,
        width: map_width,
        height: map_height,
    };
    let project = |lat: f64, lon: f64| -> (f64, f64) {
        (
            frame.left + (lon + 180.0) / 360.0 * frame.width,
            frame.top + (90.0 - lat) / 180.0 * frame.height,
        )
    };

    group = group.add(
        Rectangle::new()
            .set("x", frame.left)
            .set("y", frame.top)
            .set("width", frame.width)
            .set("height", frame.height)
            .set("fill", geo.landcolor.as_deref().unwrap_or("rgb(217, 217, 217)"))
            .set("stroke", geo.countrycolor.as_deref().unwrap_or("black"))
            .set("stroke-width", geo.countrywidth.unwrap_or(0.5)),
    );

    for lon in (-150..=150).step_by(30) {
        let (x, top) = project(90.0, f64::from(lon));
        let (_, bottom) = project(-90.0, f64::from(lon));
        group = group.add(grid_line(x, top, x, bottom));
    }
    for lat in (-60..=60).step_by(30) {
        let (left, y) = project(f64::from(lat), -180.0);
        let (right, _) = project(f64::from(lat), 180.0);
        group = group.add(grid_line(left, y, right, y));
    }

    let mut legend_row = 0usize;
    for trace in &figure.data {
        match trace {
            Trace::Scattergeo(scatter) => {
                let ColorSpec::Single(color) = &scatter.marker.color else {
                    continue;
                };
                for (&lat, &lon) in scatter.lat.iter().zip(&scatter.lon) {
                    let (cx, cy) = project(lat, lon);
                    group = group.add(
                        Circle::new()
                            .set("cx", cx)
                            .set("cy", cy)
                            .set("r", scatter.marker.size * 0.5)
                            .set("fill", color.as_str())
                            .set("fill-opacity", scatter.marker.opacity.unwrap_or(1.0))
                            .set("data-label", scatter.text.replace("<br>", "; ")),
                    );
                }
            }
            Trace::Choropleth(choropleth) => {
                let color = choropleth
                    .colorscale
                    .first()
                    .map(|(_, color)| color.as_str())
                    .unwrap_or("gray");
                let y = frame.top + 8.0 + legend_row as f64 * 16.0;
                legend_row += 1;
                group = group
                    .add(
                        Rectangle::new()
                            .set("x", frame.left + 8.0)
                            .set("y", y)
                            .set("width", 12.0)
                            .set("height", 12.0)
                            .set("fill", color),
                    )
                    .add(text(
                        choropleth.locations.join(", "),
                        frame.left + 26.0,
                        y + 10.0,
                        11.0,
                    ));
            }
            Trace::Scatter(_) => {}
        }
    }

    group
}

fn grid_line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", "white")
        .set("stroke-width", 0.5)
}

pub fn export_svg(figure: &Figure, path: &Path) -> Result<()> {
    svg::save(path, &render_svg(figure)).map_err(|err| Error::io(path, err))
}
