use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::color::{ColorMap, ColorSource, DEFAULT_COLOR_SEED};
use crate::export::{self, ExportFormat};
use crate::figure::{
    combine_figures, create_tree_plot, create_world_map, MapOptions, MapType, TreePlotOptions,
};
use crate::geocode::{merge_coordinates, NominatimClient, DEFAULT_NOMINATIM_URL};
use crate::io::{self, MetadataColumns};
use crate::metadata::DEFAULT_CATEGORY_COLUMN;
use crate::ui;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "phyloworld",
    version,
    about = "Draw a phylogenetic tree next to a world map of where its samples came from."
)]
pub struct AppConfig {
    /// Tree file to load (Newick or Nexus formats).
    #[arg(value_name = "TREE_FILE")]
    pub tree_path: PathBuf,

    /// Metadata table (CSV or TSV) with ID and category columns.
    #[arg(value_name = "METADATA_FILE")]
    pub metadata_path: PathBuf,

    /// Title of the combined figure.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Title above the tree panel.
    #[arg(long, default_value = "")]
    pub tree_title: String,

    /// Title above the map panel.
    #[arg(long, default_value = "")]
    pub map_title: String,

    #[arg(long, value_enum, default_value_t = MapType::Choropleth)]
    pub map_type: MapType,

    /// Metadata column holding the category of each leaf.
    #[arg(long, default_value = DEFAULT_CATEGORY_COLUMN)]
    pub category_column: String,

    /// Comma separated colors, one per category in first-seen order.
    #[arg(long, value_delimiter = ',', conflicts_with = "default_palette")]
    pub colors: Option<Vec<String>>,

    /// Use the built-in 21 color palette, cycling when categories outnumber it.
    #[arg(long)]
    pub default_palette: bool,

    /// Seed for randomly generated category colors.
    #[arg(long, default_value_t = DEFAULT_COLOR_SEED)]
    pub seed: u64,

    /// Annotate internal nodes with their support values.
    #[arg(long)]
    pub show_confidence: bool,

    /// Zero-based index of the tree to draw when the file holds several.
    #[arg(long, default_value_t = 0)]
    pub tree_index: usize,

    /// Figure width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Write the figure here; without it a summary is printed instead.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format; inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Look up country coordinates with Nominatim before drawing.
    #[arg(long)]
    pub geocode: bool,

    #[arg(
        long,
        env = "PHYLOWORLD_NOMINATIM_URL",
        default_value = DEFAULT_NOMINATIM_URL
    )]
    pub nominatim_url: String,
}

impl AppConfig {
    pub fn color_source(&self) -> ColorSource {
        if let Some(colors) = &self.colors {
            ColorSource::Palette(colors.iter().map(|c| c.trim().to_string()).collect())
        } else if self.default_palette {
            ColorSource::default_palette()
        } else {
            ColorSource::Seeded { seed: self.seed }
        }
    }

    pub fn export_format(&self) -> Result<Option<ExportFormat>> {
        let Some(output) = &self.output else {
            return Ok(None);
        };
        if let Some(format) = self.format {
            return Ok(Some(format));
        }
        export::infer_format(output).map(Some).ok_or_else(|| {
            anyhow!(
                "cannot infer output format from {}; pass --format",
                output.display()
            )
        })
    }
}

pub struct PhyloWorldApp;

impl PhyloWorldApp {
    pub fn run(config: &AppConfig) -> Result<()> {
        let bundle = io::load_trees(&config.tree_path)
            .with_context(|| format!("loading {}", config.tree_path.display()))?;
        let tree = bundle.tree(config.tree_index)?;

        let columns = MetadataColumns {
            category: config.category_column.clone(),
            ..MetadataColumns::default()
        };
        let mut metadata = io::load_metadata(&config.metadata_path, &columns)
            .with_context(|| format!("loading {}", config.metadata_path.display()))?;

        if config.geocode {
            info!("Geocoding categories via {}", config.nominatim_url);
            let client = NominatimClient::with_base_url(config.nominatim_url.as_str())?;
            metadata = merge_coordinates(&metadata, &client)?;
        } else if config.map_type == MapType::Scatter && !metadata.has_coordinates() {
            warn!("scatter map requested but metadata has no coordinates; try --geocode");
        }

        let colors = ColorMap::from_metadata(&metadata, &config.color_source())?;

        let Some(format) = config.export_format()? else {
            ui::render_preview(&bundle, tree, &metadata, &colors);
            return Ok(());
        };

        let mut tree_options = TreePlotOptions {
            title: config.tree_title.clone(),
            ..TreePlotOptions::default()
        };
        tree_options.layout.show_confidence = config.show_confidence;
        let tree_figure = create_tree_plot(tree, &metadata, &colors, &tree_options)?;

        let map_options = MapOptions {
            title: config.map_title.clone(),
            map_type: config.map_type,
            width: config.width,
            height: config.height,
        };
        let map_figure = create_world_map(&metadata, &colors, &map_options)?;

        let figure = combine_figures(&tree_figure, &map_figure, &config.title);
        if let Some(dest) = &config.output {
            export::export_figure(&figure, format, dest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let mut argv = vec!["phyloworld", "tree.nwk", "meta.csv"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn color_source_follows_flags() {
        assert_eq!(
            parse(&[]).color_source(),
            ColorSource::Seeded {
                seed: DEFAULT_COLOR_SEED
            }
        );
        assert_eq!(
            parse(&["--colors", "red, blue"]).color_source(),
            ColorSource::Palette(vec!["red".to_string(), "blue".to_string()])
        );
        assert_eq!(
            parse(&["--default-palette"]).color_source(),
            ColorSource::default_palette()
        );
        assert!(AppConfig::try_parse_from([
            "phyloworld",
            "t",
            "m",
            "--colors",
            "red",
            "--default-palette"
        ])
        .is_err());
    }

    #[test]
    fn export_format_is_explicit_or_inferred() {
        assert_eq!(parse(&[]).export_format().unwrap(), None);
        assert_eq!(
            parse(&["-o", "out.svg"]).export_format().unwrap(),
            Some(ExportFormat::Svg)
        );
        assert_eq!(
            parse(&["-o", "out.txt", "--format", "json"])
                .export_format()
                .unwrap(),
            Some(ExportFormat::Json)
        );
        assert!(parse(&["-o", "out.txt"]).export_format().is_err());
    }

    #[test]
    fn renders_combined_figure_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let tree_path = dir.path().join("tree.nwk");
        let metadata_path = dir.path().join("meta.csv");
        let output = dir.path().join("figure.json");
        fs::write(&tree_path, "((A:1,B:1)90:1,C:2);\n").unwrap();
        fs::write(&metadata_path, "ID,Country\nA,Peru\nB,Chile\nC,Peru\n").unwrap();

        let config = AppConfig::try_parse_from([
            "phyloworld",
            tree_path.to_str().unwrap(),
            metadata_path.to_str().unwrap(),
            "--title",
            "Overview",
            "--show-confidence",
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        PhyloWorldApp::run(&config).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["layout"]["title"]["text"], "Overview");
        // Two choropleth regions plus the leaf markers.
        assert_eq!(value["data"].as_array().unwrap().len(), 3);
        assert_eq!(value["data"][2]["type"], "scatter");
    }

    #[test]
    fn unknown_tree_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tree_path = dir.path().join("tree.nwk");
        let metadata_path = dir.path().join("meta.csv");
        fs::write(&tree_path, "(A:1,B:1);\n").unwrap();
        fs::write(&metadata_path, "ID,Country\nA,Peru\nB,Chile\n").unwrap();

        let config = AppConfig::try_parse_from([
            "phyloworld",
            tree_path.to_str().unwrap(),
            metadata_path.to_str().unwrap(),
            "--tree-index",
            "3",
        ])
        .unwrap();
        assert!(PhyloWorldApp::run(&config).is_err());
    }
}
