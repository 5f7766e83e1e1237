use crate::config::{nodes_for_taxa, Limits};

use super::active::ActiveSet;
use super::distance::DistanceMatrix;

pub type NodeId = usize;

/// A tree node. Slot 0 points toward the node it was merged into (or, for
/// the last two active nodes, toward each other); slots 1 and 2 hold the two
/// nodes an internal node was synthesized from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub neighbors: [Option<NodeId>; 3],
}

impl Node {
    pub fn degree(&self) -> usize {
        self.neighbors.iter().flatten().count()
    }

    pub fn neighbor_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors.iter().flatten().copied()
    }
}

/// Names, node arena and distance matrix for one taxonomy build.
///
/// Ids `0..num_taxa()` are the input taxa; ids from `num_taxa()` upward are
/// internal nodes appended by the neighbor-joining build.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonTable {
    names: Vec<Box<str>>,
    nodes: Vec<Node>,
    matrix: DistanceMatrix,
    active: ActiveSet,
    num_taxa: usize,
    limits: Limits,
}

impl TaxonTable {
    /// Table over `names` with row-major distances `rows` (`n * n` values).
    ///
    /// No validation is done here; [`crate::io::csv::read_distance_table`]
    /// is the checked entry point.
    pub fn new(names: Vec<Box<str>>, rows: &[f64], limits: Limits) -> Self {
        let n = names.len();
        let capacity = nodes_for_taxa(n).min(limits.max_nodes).max(n);
        let mut table_names = Vec::with_capacity(capacity);
        table_names.extend(names);
        Self {
            names: table_names,
            nodes: vec![Node::default(); n],
            matrix: DistanceMatrix::from_rows(n, capacity, rows),
            active: ActiveSet::identity(n),
            num_taxa: n,
            limits,
        }
    }

    pub fn num_taxa(&self) -> usize {
        self.num_taxa
    }

    pub fn num_all_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_active_nodes(&self) -> usize {
        self.active.len()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn names(&self) -> &[Box<str>] {
        &self.names
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id]
    }

    pub fn find_taxon(&self, name: &str) -> Option<NodeId> {
        self.names[..self.num_taxa]
            .iter()
            .position(|n| &**n == name)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn distance(&self, i: NodeId, j: NodeId) -> f64 {
        self.matrix.get(i, j)
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn tree(&self) -> TreeView<'_> {
        TreeView { table: self }
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut DistanceMatrix {
        &mut self.matrix
    }

    pub(crate) fn active_mut(&mut self) -> &mut ActiveSet {
        &mut self.active
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Append an internal node named `#<id>` with a zeroed matrix row.
    pub(crate) fn push_internal(&mut self) -> NodeId {
        let id = self.matrix.grow();
        debug_assert_eq!(id, self.nodes.len());
        self.names.push(format!("#{id}").into_boxed_str());
        self.nodes.push(Node::default());
        id
    }
}

/// Read-only view of the tree recorded in a [`TaxonTable`].
#[derive(Debug, Clone, Copy)]
pub struct TreeView<'a> {
    table: &'a TaxonTable,
}

impl<'a> TreeView<'a> {
    pub fn num_nodes(&self) -> usize {
        self.table.num_all_nodes()
    }

    pub fn num_leaves(&self) -> usize {
        self.table.num_taxa()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        id < self.table.num_taxa()
    }

    pub fn name(&self, id: NodeId) -> &'a str {
        self.table.name(id)
    }

    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        self.table.node(id).neighbor_ids()
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.table.node(id).degree()
    }

    pub fn edge_length(&self, a: NodeId, b: NodeId) -> f64 {
        self.table.distance(a, b)
    }

    pub fn table(&self) -> &'a TaxonTable {
        self.table
    }
}
