use crate::error::{PhyloError, PhyloResult};

use super::format_distance;
use super::table::{NodeId, TreeView};

/// Pick the leaf the rooted tree hangs from.
///
/// With `name`, that taxon is used. Otherwise the leaf with the largest sum
/// of distances to the other leaves wins, the lowest id on ties.
pub fn select_outlier(tree: &TreeView<'_>, name: Option<&str>) -> PhyloResult<NodeId> {
    let table = tree.table();
    if let Some(name) = name {
        return table
            .find_taxon(name)
            .ok_or_else(|| PhyloError::OutlierNotFound {
                name: name.to_string(),
            });
    }

    let n = tree.num_leaves();
    let mut best: Option<(NodeId, f64)> = None;
    for i in 0..n {
        let total: f64 = (0..n).map(|j| table.distance(i, j)).sum();
        if best.map_or(true, |(_, t)| total > t) {
            best = Some((i, total));
        }
    }
    best.map(|(i, _)| i)
        .ok_or_else(|| PhyloError::OutlierNotFound {
            name: String::new(),
        })
}

/// Serialize the tree as Newick, rooted at the outlier's neighbor.
///
/// Expects a tree built by [`super::neighbor_joining`]. The outlier itself
/// is left out; a single-taxon tree is written as its lone leaf.
pub fn to_newick(tree: &TreeView<'_>, outlier: Option<&str>) -> PhyloResult<String> {
    let outlier = select_outlier(tree, outlier)?;

    let mut s = String::new();
    match tree.neighbors(outlier).next() {
        Some(root) => write_subtree(tree, root, outlier, &mut s),
        None => write_label(&mut s, tree.name(outlier)),
    }
    s.push(';');
    Ok(s)
}

fn needs_quoting(label: &str) -> bool {
    label.chars().any(|ch| {
        ch.is_whitespace() || matches!(ch, ':' | ',' | '(' | ')' | ';' | '[' | ']' | '\'')
    })
}

fn write_label(out: &mut String, label: &str) {
    if label.is_empty() {
        return;
    }
    if needs_quoting(label) {
        out.push('\'');
        for ch in label.chars() {
            if ch == '\'' {
                out.push_str("''");
            } else {
                out.push(ch);
            }
        }
        out.push('\'');
    } else {
        out.push_str(label);
    }
}

fn write_subtree(tree: &TreeView<'_>, idx: NodeId, parent: NodeId, out: &mut String) {
    let mut children = tree.neighbors(idx).filter(|&c| c != parent).peekable();

    if children.peek().is_some() {
        out.push('(');
        for (i, child) in children.enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_subtree(tree, child, idx, out);
            out.push(':');
            out.push_str(&format_distance(tree.edge_length(idx, child)));
        }
        out.push(')');
    }
    write_label(out, tree.name(idx));
}
