//! Phylogenetic tree plus world map figures.
//!
//! A tree is laid out as a rectangular phylogram, its leaves are colored by a
//! metadata category (usually the sampling country) and the same colors are
//! reused on a world map. Figures follow the plotly.js JSON schema and can be
//! written as JSON, standalone HTML or static SVG.

pub mod app;
pub mod color;
pub mod error;
pub mod export;
pub mod figure;
pub mod geocode;
pub mod io;
pub mod metadata;
pub mod tree;
pub mod ui;

pub use error::{Error, Result};
