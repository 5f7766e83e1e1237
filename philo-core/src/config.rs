/// Capacity limits for a single build.
///
/// The defaults match the fixed-size tables of the reference `philo` program:
/// 100 taxa, 100 characters per input field, and room for every internal node
/// a 100-taxon tree can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub input_max: usize,
    pub max_taxa: usize,
    pub max_nodes: usize,
}

pub const INPUT_MAX: usize = 100;
pub const MAX_TAXA: usize = 100;
pub const MAX_NODES: usize = 2 * MAX_TAXA - 2;

impl Default for Limits {
    fn default() -> Self {
        Self {
            input_max: INPUT_MAX,
            max_taxa: MAX_TAXA,
            max_nodes: MAX_NODES,
        }
    }
}

/// Number of nodes in the unrooted binary tree over `n` taxa.
pub fn nodes_for_taxa(n: usize) -> usize {
    if n <= 2 {
        n
    } else {
        2 * n - 2
    }
}
