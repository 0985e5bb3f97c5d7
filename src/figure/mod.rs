//! Figure descriptions in the plotly.js JSON schema.
//!
//! Only the attributes the tree and map figures use are modelled. `None`
//! fields are omitted from the JSON so plotly.js falls back to its defaults.

use serde::Serialize;

use crate::error::Result;
use crate::tree::layout::{LineShape, SupportLabel};

pub mod combine;
pub mod tree_plot;
pub mod world_map;

pub use combine::combine_figures;
pub use tree_plot::{create_tree_plot, TreePlotOptions};
pub use world_map::{create_world_map, MapOptions, MapType};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn new(data: Vec<Trace>, layout: Layout) -> Self {
        Self { data, layout }
    }

    /// Title text, empty when unset.
    pub fn title(&self) -> &str {
        self.layout
            .title
            .as_ref()
            .map(|title| title.text.as_str())
            .unwrap_or("")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(Scatter),
    Choropleth(Choropleth),
    Scattergeo(ScatterGeo),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Marker {
    pub color: ColorSpec,
    pub size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Scatter {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub mode: String,
    pub marker: Marker,
    pub text: Vec<String>,
    pub hoverinfo: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColorBar {
    pub title: String,
    pub tickvals: Vec<f64>,
    pub ticktext: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Choropleth {
    pub locations: Vec<String>,
    pub locationmode: String,
    pub z: Vec<f64>,
    /// `[[0, color], [1, color]]` paints the region in one flat color.
    pub colorscale: Vec<(f64, String)>,
    pub hoverinfo: String,
    pub text: String,
    pub colorbar: ColorBar,
    pub showscale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScatterGeo {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub mode: String,
    pub hoverinfo: String,
    pub text: String,
    pub showlegend: bool,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zeroline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showticklabels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AxisRange {
    pub range: [f64; 2],
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Domain {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Geo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showcoastlines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coastlinecolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showland: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showcountries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countrycolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countrywidth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lonaxis: Option<AxisRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lataxis: Option<AxisRange>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShapeLine {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: String,
    pub layer: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub line: ShapeLine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yref: Option<String>,
}

impl From<&LineShape> for Shape {
    fn from(line: &LineShape) -> Self {
        Self {
            kind: "line".to_string(),
            layer: "below".to_string(),
            x0: line.start.0,
            y0: line.start.1,
            x1: line.end.0,
            y1: line.end.1,
            line: ShapeLine {
                color: line.style.color.clone(),
                width: line.style.width,
            },
            xref: None,
            yref: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Font {
    pub size: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub showarrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

pub const SUPPORT_LABEL_BACKGROUND: &str = "rgba(255,255,255,0.6)";

impl From<&SupportLabel> for Annotation {
    fn from(label: &SupportLabel) -> Self {
        Self {
            x: label.position.0,
            y: label.position.1,
            text: label.text(),
            showarrow: false,
            xanchor: Some("right".to_string()),
            yanchor: Some("bottom".to_string()),
            bgcolor: Some(SUPPORT_LABEL_BACKGROUND.to_string()),
            xref: None,
            yref: None,
            font: Some(Font { size: 10.0 }),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Legend {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Vec<Shape>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

macro_rules! overwrite_set_fields {
    ($target:expr, $source:expr, $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field;
            }
        )+
    };
}

fn merge_nested<T>(target: &mut Option<T>, source: Option<T>, merge: impl FnOnce(&mut T, T)) {
    let Some(update) = source else {
        return;
    };
    match target {
        Some(existing) => merge(existing, update),
        None => *target = Some(update),
    }
}

impl Axis {
    pub fn update(&mut self, other: Axis) {
        overwrite_set_fields!(
            self,
            other,
            title,
            showline,
            zeroline,
            showgrid,
            showticklabels,
            domain,
            anchor
        );
    }
}

impl Geo {
    pub fn update(&mut self, other: Geo) {
        overwrite_set_fields!(
            self,
            other,
            domain,
            resolution,
            showcoastlines,
            coastlinecolor,
            showland,
            landcolor,
            showcountries,
            countrycolor,
            countrywidth,
            lonaxis,
            lataxis
        );
    }
}

impl Layout {
    /// Apply every attribute set in `other`, recursing into axes and geo
    /// settings. Lists (shapes, annotations) are replaced wholesale.
    pub fn update(&mut self, other: Layout) {
        merge_nested(&mut self.xaxis, other.xaxis, Axis::update);
        merge_nested(&mut self.yaxis, other.yaxis, Axis::update);
        merge_nested(&mut self.geo, other.geo, Geo::update);
        overwrite_set_fields!(
            self,
            other,
            title,
            paper_bgcolor,
            plot_bgcolor,
            hovermode,
            shapes,
            annotations,
            legend,
            showlegend,
            height,
            width
        );
    }
}
