use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::tree::Tree;

pub const DEFAULT_CATEGORY_COLUMN: &str = "Country";

/// One sample: the leaf identifier, its category and optional coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub id: String,
    pub category: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl MetadataRow {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Sample table keyed by leaf identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable {
    /// Header of the category column, used in hover text.
    pub category_label: String,
    rows: Vec<MetadataRow>,
}

impl MetadataTable {
    /// Identifiers must be unique. A duplicate is reported by its 1-based
    /// row position.
    pub fn new(category_label: impl Into<String>, rows: Vec<MetadataRow>) -> Result<Self> {
        let positions: Vec<usize> = (1..=rows.len()).collect();
        Self::with_line_numbers(category_label, rows, &positions)
    }

    /// Like [`MetadataTable::new`], but a duplicate is reported at
    /// `lines[i]` for row `i` (the source file line it was read from).
    pub(crate) fn with_line_numbers(
        category_label: impl Into<String>,
        rows: Vec<MetadataRow>,
        lines: &[usize],
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for (index, row) in rows.iter().enumerate() {
            if !seen.insert(row.id.as_str()) {
                return Err(Error::Metadata {
                    line: lines.get(index).copied().unwrap_or(index + 1),
                    message: format!("duplicate ID '{}'", row.id),
                });
            }
        }
        Ok(Self {
            category_label: category_label.into(),
            rows,
        })
    }

    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a leaf identifier; a missing row is a lookup error.
    pub fn row(&self, id: &str) -> Result<&MetadataRow> {
        self.rows
            .iter()
            .find(|row| row.id == id)
            .ok_or_else(|| Error::lookup(format!("no metadata row for ID '{id}'")))
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.category.as_str()))
            .map(|row| row.category.clone())
            .collect()
    }

    pub fn members<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a MetadataRow> + 'a {
        self.rows.iter().filter(move |row| row.category == category)
    }

    /// True when every row carries a latitude/longitude pair.
    pub fn has_coordinates(&self) -> bool {
        self.rows.iter().all(|row| row.coordinates().is_some())
    }

    /// Set the same coordinates on every row of `category`.
    pub fn set_category_coordinates(&mut self, category: &str, latitude: f64, longitude: f64) {
        for row in self.rows.iter_mut().filter(|row| row.category == category) {
            row.latitude = Some(latitude);
            row.longitude = Some(longitude);
        }
    }

    /// Terminal names of `tree` that have no row in this table.
    pub fn missing_ids(&self, tree: &Tree) -> Vec<String> {
        let known: HashSet<&str> = self.rows.iter().map(|row| row.id.as_str()).collect();
        tree.terminals()
            .into_iter()
            .map(|id| tree.nodes[id].name.clone().unwrap_or_default())
            .filter(|name| !known.contains(name.as_str()))
            .collect()
    }
}
