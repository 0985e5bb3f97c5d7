//! Delimited-text loader for the sample metadata table.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::metadata::{MetadataRow, MetadataTable, DEFAULT_CATEGORY_COLUMN};

/// Header names of the columns the table is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataColumns {
    pub id: String,
    pub category: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            id: "ID".to_string(),
            category: DEFAULT_CATEGORY_COLUMN.to_string(),
            latitude: "Latitude".to_string(),
            longitude: "Longitude".to_string(),
        }
    }
}

/// Load a CSV or TSV file. Tabs are used for `.tsv`/`.tab` files and for
/// any file whose header line contains a tab.
pub fn load_metadata(path: &Path, columns: &MetadataColumns) -> Result<MetadataTable> {
    let raw = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;

    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "tsv" | "tab"))
        .unwrap_or(false);
    let header_has_tab = raw.lines().next().is_some_and(|line| line.contains('\t'));
    let delimiter = if by_extension || header_has_tab { '\t' } else { ',' };

    let table = parse_metadata(&raw, delimiter, columns)?;
    debug!(
        "loaded {} metadata row(s) from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

pub fn parse_metadata(raw: &str, delimiter: char, columns: &MetadataColumns) -> Result<MetadataTable> {
    let mut lines = raw
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines.next().ok_or_else(|| Error::Metadata {
        line: 1,
        message: "metadata table is empty".to_string(),
    })?;
    let header = split_record(header, delimiter).map_err(|message| Error::Metadata {
        line: header_line,
        message,
    })?;

    let position = |name: &str| {
        header
            .iter()
            .position(|column| column.trim().trim_start_matches('\u{feff}') == name)
    };
    let required = |name: &str| {
        position(name).ok_or_else(|| Error::Metadata {
            line: header_line,
            message: format!("missing required column '{name}'"),
        })
    };
    let id_col = required(&columns.id)?;
    let category_col = required(&columns.category)?;
    let coordinate_cols = position(&columns.latitude).zip(position(&columns.longitude));

    let mut rows = Vec::new();
    let mut row_lines = Vec::new();
    for (line, text) in lines {
        let fields = split_record(text, delimiter)
            .map_err(|message| Error::Metadata { line, message })?;
        if fields.len() != header.len() {
            return Err(Error::Metadata {
                line,
                message: format!("expected {} field(s), found {}", header.len(), fields.len()),
            });
        }

        let mut row = MetadataRow::new(fields[id_col].trim(), fields[category_col].trim());
        if let Some((lat_col, lon_col)) = coordinate_cols {
            row.latitude = parse_number(&fields[lat_col], &columns.latitude, line)?;
            row.longitude = parse_number(&fields[lon_col], &columns.longitude, line)?;
        }
        rows.push(row);
        row_lines.push(line);
    }

    MetadataTable::with_line_numbers(columns.category.clone(), rows, &row_lines)
}

fn parse_number(field: &str, column: &str, line: usize) -> Result<Option<f64>> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| Error::Metadata {
            line,
            message: format!("'{trimmed}' in column '{column}' is not a number"),
        })
}

/// Split one record. Fields may be double-quoted with `""` as an escaped
/// quote; quoted fields do not span lines.
fn split_record(line: &str, delimiter: char) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut at_field_start = true;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            c if c == delimiter => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            _ => {
                field.push(ch);
                at_field_start = false;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}
