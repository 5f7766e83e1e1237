pub mod active;
pub mod distance;
pub mod newick;
pub mod table;
pub mod tree;

pub use active::ActiveSet;
pub use distance::DistanceMatrix;
pub use newick::{select_outlier, to_newick};
pub use table::{Node, NodeId, TaxonTable, TreeView};
pub use tree::{neighbor_joining, Edge, EdgeSink, NoEdges};

/// Distance with two decimals; values that round to zero print as `0.00`.
pub fn format_distance(d: f64) -> String {
    let s = format!("{d:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}
