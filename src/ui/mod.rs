use std::fmt::Write;

use crate::color::ColorMap;
use crate::metadata::MetadataTable;
use crate::tree::{Tree, TreeBundle};

const PREVIEW_TREES: usize = 3;
const NEWICK_PREVIEW: usize = 64;

/// Text shown when no output file is requested.
pub fn summary(
    bundle: &TreeBundle,
    tree: &Tree,
    metadata: &MetadataTable,
    colors: &ColorMap,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Loaded {:?} file with {} tree(s).",
        bundle.format,
        bundle.trees.len()
    );

    for candidate in bundle.trees.iter().take(PREVIEW_TREES) {
        let preview = match candidate.newick.char_indices().nth(NEWICK_PREVIEW) {
            Some((cut, _)) => format!("{}...", &candidate.newick[..cut]),
            None => candidate.newick.clone(),
        };
        let marker = if candidate.id == tree.id { "*" } else { "-" };
        match &candidate.label {
            Some(label) => {
                let _ = writeln!(out, "{marker} {label} => {preview}");
            }
            None => {
                let _ = writeln!(out, "{marker} tree #{} => {preview}", candidate.id + 1);
            }
        }
    }
    if bundle.trees.len() > PREVIEW_TREES {
        let _ = writeln!(
            out,
            "... ({} more tree(s) omitted)",
            bundle.trees.len() - PREVIEW_TREES
        );
    }

    let _ = writeln!(
        out,
        "Selected tree has {} leaves and {} internal nodes.",
        tree.leaf_count(),
        tree.internal_count()
    );
    let _ = writeln!(
        out,
        "Metadata: {} row(s), {} {} value(s).",
        metadata.len(),
        colors.len(),
        metadata.category_label
    );
    for (category, color) in colors.iter() {
        let count = metadata.members(category).count();
        let _ = writeln!(out, "  {category} ({count}) {color}");
    }

    let missing = metadata.missing_ids(tree);
    if !missing.is_empty() {
        let _ = writeln!(
            out,
            "Leaves without metadata ({}): {}",
            missing.len(),
            missing.join(", ")
        );
    }

    out
}

pub fn render_preview(
    bundle: &TreeBundle,
    tree: &Tree,
    metadata: &MetadataTable,
    colors: &ColorMap,
) {
    print!("{}", summary(bundle, tree, metadata, colors));
}
