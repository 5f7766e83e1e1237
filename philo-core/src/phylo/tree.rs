use log::{debug, info};

use crate::config::nodes_for_taxa;
use crate::error::{PhyloError, PhyloResult};

use super::table::{NodeId, TaxonTable};

/// One tree edge as reported while the tree is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub length: f64,
}

/// Receiver for the edges produced by [`neighbor_joining`], in build order.
pub trait EdgeSink {
    fn edge(&mut self, edge: Edge) -> PhyloResult<()>;
}

impl EdgeSink for Vec<Edge> {
    fn edge(&mut self, edge: Edge) -> PhyloResult<()> {
        self.push(edge);
        Ok(())
    }
}

/// Discards edges (matrix-only and Newick builds).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEdges;

impl EdgeSink for NoEdges {
    fn edge(&mut self, _edge: Edge) -> PhyloResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Join {
    g: NodeId,
    u: NodeId,
    g_branch: f64,
}

/// Reconstruct the unrooted tree for the taxa in `table` by neighbor joining.
///
/// Internal nodes are appended to `table` together with their matrix rows,
/// adjacency is recorded in the node arena, and every edge is passed to
/// `edges` as soon as it is known. A table can be built only once.
pub fn neighbor_joining<S: EdgeSink + ?Sized>(
    table: &mut TaxonTable,
    edges: &mut S,
) -> PhyloResult<()> {
    let n = table.num_taxa();
    if table.num_all_nodes() != n || table.nodes().iter().any(|node| node.degree() > 0) {
        return Err(PhyloError::TreeAlreadyBuilt);
    }
    let needed = nodes_for_taxa(n);
    let max = table.limits().max_nodes;
    if needed > max {
        return Err(PhyloError::NodeCapacityExceeded {
            taxa: n,
            needed,
            max,
        });
    }

    match n {
        0 | 1 => return Ok(()),
        2 => {
            link(table, 0, 1);
            return edges.edge(Edge {
                a: 0,
                b: 1,
                length: table.distance(0, 1),
            });
        }
        _ => {}
    }

    let mut row_sums = vec![0.0f64; table.matrix().capacity()];
    let mut last = None;
    for _ in 0..n - 2 {
        last = Some(join_step(table, edges, &mut row_sums)?);
    }

    if let Some(join) = last {
        close(table, edges, join)?;
    }
    debug_assert!(table.matrix().is_symmetric() && table.matrix().has_zero_diagonal());
    info!(
        "neighbor joining: {} taxa, {} nodes",
        n,
        table.num_all_nodes()
    );
    Ok(())
}

fn link(table: &mut TaxonTable, a: NodeId, b: NodeId) {
    table.node_mut(a).neighbors[0] = Some(b);
    table.node_mut(b).neighbors[0] = Some(a);
}

/// Q-criterion over active slots; returns `(f_slot, g_slot, q)`.
///
/// Pairs are visited with `i < j` in ascending slot order and a later pair
/// wins only with a strictly smaller Q.
fn select_pair(table: &TaxonTable, row_sums: &[f64]) -> (usize, usize, f64) {
    let active = table.active();
    let m = active.len() as f64;
    let q = |i: usize, j: usize| {
        let (a, b) = (active.get(i), active.get(j));
        (m - 2.0) * table.distance(a, b) - row_sums[a] - row_sums[b]
    };

    let mut best = (0, 1, q(0, 1));
    for i in 0..active.len() {
        for j in (i + 1)..active.len() {
            let qij = q(i, j);
            if qij < best.2 {
                best = (i, j, qij);
            }
        }
    }
    best
}

fn join_step<S: EdgeSink + ?Sized>(
    table: &mut TaxonTable,
    edges: &mut S,
    row_sums: &mut [f64],
) -> PhyloResult<Join> {
    for &i in table.active().as_slice() {
        row_sums[i] = table
            .active()
            .iter()
            .map(|j| table.distance(i, j))
            .sum();
    }

    let (f_slot, g_slot, q) = select_pair(table, row_sums);
    let m = table.num_active_nodes() as f64;
    let f = table.active().get(f_slot);
    let g = table.active().get(g_slot);
    let dfg = table.distance(f, g);

    let f_branch = dfg / 2.0 + (row_sums[f] - row_sums[g]) / (2.0 * (m - 2.0));
    let g_branch = dfg - f_branch;

    let u = table.push_internal();
    debug!(
        "join {} and {} (q = {:.4}) into {}",
        table.name(f),
        table.name(g),
        q,
        table.name(u)
    );
    edges.edge(Edge {
        a: f,
        b: u,
        length: f_branch,
    })?;
    edges.edge(Edge {
        a: g,
        b: u,
        length: g_branch,
    })?;

    {
        let node = table.node_mut(u);
        node.neighbors[1] = Some(f);
        node.neighbors[2] = Some(g);
    }
    table.node_mut(f).neighbors[0] = Some(u);
    table.node_mut(g).neighbors[0] = Some(u);

    for slot in 0..table.num_active_nodes() {
        let k = table.active().get(slot);
        if k == f || k == g {
            continue;
        }
        let duk = (table.distance(f, k) + table.distance(g, k) - dfg) / 2.0;
        table.matrix_mut().set(u, k, duk);
    }
    let matrix = table.matrix_mut();
    matrix.set(u, f, f_branch);
    matrix.set(u, g, g_branch);
    matrix.set(u, u, 0.0);

    table.active_mut().merge(f_slot, g_slot, u);
    Ok(Join { g, u, g_branch })
}

/// Link the last two active nodes and report the closing edge.
fn close<S: EdgeSink + ?Sized>(
    table: &mut TaxonTable,
    edges: &mut S,
    last: Join,
) -> PhyloResult<()> {
    debug_assert_eq!(table.num_active_nodes(), 2);
    let a0 = table.active().get(0);
    let a1 = table.active().get(1);
    let k = if a0 == last.u { a1 } else { a0 };

    // D(k, g) minus g's branch equals D(u, k).
    let length = table.distance(k, last.g) - last.g_branch;
    link(table, a0, a1);
    table.active_mut().clear();

    debug!("close {} - {} ({:.4})", table.name(a1), table.name(a0), length);
    edges.edge(Edge {
        a: a1,
        b: a0,
        length,
    })
}
