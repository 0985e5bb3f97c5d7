use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use super::{
    AxisRange, Choropleth, ColorBar, ColorSpec, Figure, Geo, Layout, Marker, ScatterGeo, Title,
    Trace,
};
use crate::color::ColorMap;
use crate::error::{Error, Result};
use crate::metadata::MetadataTable;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum)]
pub enum MapType {
    /// Fill each country with its category color.
    #[default]
    Choropleth,
    /// Place a marker at every sample's latitude/longitude.
    Scatter,
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapType::Choropleth => write!(f, "choropleth"),
            MapType::Scatter => write!(f, "scatter"),
        }
    }
}

impl FromStr for MapType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "choropleth" => Ok(MapType::Choropleth),
            "scatter" => Ok(MapType::Scatter),
            other => Err(Error::config(format!(
                "map type can be 'choropleth' or 'scatter', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapOptions {
    pub title: String,
    pub map_type: MapType,
    pub width: u32,
    pub height: u32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            map_type: MapType::default(),
            width: 1000,
            height: 600,
        }
    }
}

/// One trace per category of `colors`, in color-map order.
pub fn create_world_map(
    metadata: &MetadataTable,
    colors: &ColorMap,
    options: &MapOptions,
) -> Result<Figure> {
    let mut traces = Vec::with_capacity(colors.len());

    for (category, color) in colors.iter() {
        let members: Vec<_> = metadata.members(category).collect();
        let ids = members
            .iter()
            .map(|row| row.id.as_str())
            .collect::<Vec<_>>()
            .join("<br>");
        let hover_text = format!("{}: {category}<br>ID(s): {ids}", metadata.category_label);

        let trace = match options.map_type {
            MapType::Choropleth => Trace::Choropleth(Choropleth {
                locations: vec![category.to_string()],
                locationmode: "country names".to_string(),
                z: vec![1.0],
                colorscale: vec![(0.0, color.to_string()), (1.0, color.to_string())],
                hoverinfo: "text".to_string(),
                text: hover_text,
                colorbar: ColorBar {
                    title: String::new(),
                    tickvals: Vec::new(),
                    ticktext: Vec::new(),
                },
                showscale: false,
                geo: None,
            }),
            MapType::Scatter => {
                let mut lat = Vec::with_capacity(members.len());
                let mut lon = Vec::with_capacity(members.len());
                for row in &members {
                    let (latitude, longitude) = row.coordinates().ok_or_else(|| {
                        Error::config(format!(
                            "scatter map requires Latitude and Longitude for ID '{}'",
                            row.id
                        ))
                    })?;
                    lat.push(latitude);
                    lon.push(longitude);
                }
                Trace::Scattergeo(ScatterGeo {
                    lat,
                    lon,
                    mode: "markers".to_string(),
                    hoverinfo: "text".to_string(),
                    text: hover_text,
                    showlegend: false,
                    marker: Marker {
                        color: ColorSpec::Single(color.to_string()),
                        size: 5.0,
                        opacity: Some(0.8),
                    },
                    geo: None,
                })
            }
        };
        traces.push(trace);
    }

    let layout = Layout {
        title: Some(Title::new(options.title.clone())),
        geo: Some(base_geo()),
        height: Some(options.height),
        width: Some(options.width),
        ..Layout::default()
    };

    Ok(Figure::new(traces, layout))
}

fn base_geo() -> Geo {
    Geo {
        domain: None,
        resolution: Some(110),
        showcoastlines: Some(true),
        coastlinecolor: Some("rgb(255, 255, 255)".to_string()),
        showland: Some(true),
        landcolor: Some("rgb(217, 217, 217)".to_string()),
        showcountries: Some(true),
        countrycolor: Some("rgb(0, 0, 0)".to_string()),
        countrywidth: Some(0.5),
        lonaxis: Some(AxisRange {
            range: [-180.0, 180.0],
        }),
        lataxis: Some(AxisRange {
            range: [-90.0, 90.0],
        }),
    }
}
