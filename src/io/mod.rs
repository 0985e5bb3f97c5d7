use std::fs;
use std::path::Path;

use log::{debug, warn};
use phylotree::tree::{NewickFormat, Tree as PhyloTree};

use crate::error::{Error, Result};
use crate::tree::{Tree, TreeBundle, TreeFileFormat, TreeNode};

pub mod metadata;

pub use metadata::{load_metadata, parse_metadata, MetadataColumns};

/// Read a Newick or NEXUS file into a bundle of trees.
pub fn load_trees(path: &Path) -> Result<TreeBundle> {
    let raw = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    let bundle = parse_trees(&raw)?;
    debug!(
        "loaded {} tree(s) from {} ({:?})",
        bundle.trees.len(),
        path.display(),
        bundle.format
    );
    Ok(bundle)
}

/// Parse tree text whose format is detected from its first significant line.
pub fn parse_trees(raw: &str) -> Result<TreeBundle> {
    let format = detect_format(raw);
    let trees = match format {
        TreeFileFormat::Newick => parse_newick(raw)?,
        TreeFileFormat::Nexus => parse_nexus(raw),
    };

    if trees.is_empty() {
        return Err(Error::TreeParse {
            message: "tree file did not contain any trees".to_string(),
        });
    }

    Ok(TreeBundle::new(format, trees))
}

fn detect_format(raw: &str) -> TreeFileFormat {
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Whole-line comment
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            continue;
        }

        let upper = trimmed.to_ascii_uppercase();
        if upper.starts_with("#NEXUS") || upper.starts_with("BEGIN ") || upper.starts_with("TREE ")
        {
            return TreeFileFormat::Nexus;
        }

        if trimmed.starts_with('(') || trimmed.contains('(') && trimmed.contains(')') {
            return TreeFileFormat::Newick;
        }
    }

    TreeFileFormat::Newick
}

fn parse_newick(raw: &str) -> Result<Vec<Tree>> {
    let mut trees = Vec::new();

    for chunk in raw.split_inclusive(';') {
        let candidate = chunk.trim();
        if candidate.is_empty() || !candidate.ends_with(';') {
            continue;
        }
        if candidate.trim_end_matches(';').trim().is_empty() {
            debug!("ignoring empty Newick statement");
            continue;
        }

        let index = trees.len();
        trees.push(build_tree(index, None, normalise_newick(candidate))?);
    }

    Ok(trees)
}

/// Collects the `TREE name = ...;` statements of a NEXUS `TREES` block.
/// Statements that fail to parse are skipped with a warning.
fn parse_nexus(raw: &str) -> Vec<Tree> {
    let mut trees = Vec::new();
    let mut in_trees_block = false;
    let mut pending: Vec<String> = Vec::new();

    for line in raw.lines() {
        let line = strip_comment(line.trim());
        if line.is_empty() {
            continue;
        }

        let upper = line.to_ascii_uppercase();
        if upper.starts_with("BEGIN TREES") {
            in_trees_block = true;
            continue;
        }
        if upper.starts_with("END") {
            in_trees_block = false;
            flush_statement(&mut pending, &mut trees);
            continue;
        }
        if !in_trees_block || upper.starts_with("TRANSLATE") {
            continue;
        }

        if upper.starts_with("TREE ") || upper.starts_with("UTREE ") {
            flush_statement(&mut pending, &mut trees);
            pending.push(line.clone());
        } else if !pending.is_empty() {
            pending.push(line.clone());
        } else {
            continue;
        }

        if line.ends_with(';') {
            flush_statement(&mut pending, &mut trees);
        }
    }

    flush_statement(&mut pending, &mut trees);
    trees
}

fn flush_statement(pending: &mut Vec<String>, trees: &mut Vec<Tree>) {
    if pending.is_empty() {
        return;
    }
    let statement = pending.join(" ");
    pending.clear();

    let parsed = parse_nexus_tree_line(&statement)
        .and_then(|(label, newick)| build_tree(trees.len(), label, newick));
    match parsed {
        Ok(tree) => trees.push(tree),
        Err(err) => warn!("skipping NEXUS tree statement: {err}"),
    }
}

/// Remove one bracketed comment; an unterminated one runs to end of line.
fn strip_comment(line: &str) -> String {
    let Some(start) = line.find('[') else {
        return line.to_string();
    };
    match line[start..].find(']') {
        Some(end) => format!("{}{}", &line[..start], &line[start + end + 1..])
            .trim()
            .to_string(),
        None => line[..start].trim().to_string(),
    }
}

fn build_tree(index: usize, label: Option<String>, newick: String) -> Result<Tree> {
    let body = newick.trim_end_matches(';').trim();
    if body.is_empty() {
        return Err(Error::TreeParse {
            message: "empty tree statement".to_string(),
        });
    }
    // phylotree expects at least one clade; a bare `name[:length]` is a
    // single-node tree.
    if !body.contains('(') {
        let mut tree = Tree::from_nodes(index, label, vec![single_leaf(body)?]);
        tree.newick = newick;
        return Ok(tree);
    }

    let phylo = PhyloTree::from_newick(&newick).map_err(|err| Error::TreeParse {
        message: err.to_string(),
    })?;
    let canonical_newick = phylo
        .to_formatted_newick(NewickFormat::NoComments)
        .unwrap_or_else(|_| newick.clone());

    Ok(Tree::new(index, label, canonical_newick, &phylo))
}

fn single_leaf(body: &str) -> Result<TreeNode> {
    let (name, length) = match body.split_once(':') {
        Some((name, length)) => {
            let length = length.trim().parse::<f64>().map_err(|_| Error::TreeParse {
                message: format!("invalid branch length in '{body}'"),
            })?;
            (name, Some(length))
        }
        None => (body, None),
    };
    let name = name.trim().trim_matches('\'');
    if name.contains(&[',', ')'][..]) {
        return Err(Error::TreeParse {
            message: format!("unbalanced parentheses in '{body}'"),
        });
    }
    let name = (!name.is_empty()).then(|| name.to_string());
    Ok(TreeNode::new(0, name, length))
}

fn parse_nexus_tree_line(line: &str) -> Result<(Option<String>, String)> {
    let lower = line.to_ascii_lowercase();
    let keyword_len = if lower.starts_with("tree ") {
        5
    } else if lower.starts_with("utree ") {
        6
    } else {
        return Err(Error::TreeParse {
            message: format!("invalid tree line: {line}"),
        });
    };

    let (label_part, tree_part) = line[keyword_len..]
        .trim()
        .split_once('=')
        .ok_or_else(|| Error::TreeParse {
            message: format!("missing tree definition in NEXUS line: {line}"),
        })?;

    // Quoted or bare, with an optional leading '*' marking the default tree.
    let label = label_part
        .trim()
        .trim_start_matches('*')
        .trim()
        .trim_matches('"')
        .trim_matches('\'');
    let label = (!label.is_empty()).then(|| label.to_owned());

    let mut payload = tree_part.trim().trim_end_matches(';').trim();

    // Rooting hints such as [&R] precede the tree.
    while payload.starts_with('[') {
        match payload.find(']') {
            Some(end_idx) => payload = payload[end_idx + 1..].trim(),
            None => break,
        }
    }

    Ok((label, normalise_newick(payload)))
}

fn normalise_newick(raw: &str) -> String {
    let mut cleaned = raw.trim().trim_end_matches(';').trim().to_owned();
    cleaned.push(';');
    cleaned
}
