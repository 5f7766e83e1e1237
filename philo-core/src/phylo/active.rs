use super::table::NodeId;

/// Compact slot → node id map over the nodes that have not been merged yet.
///
/// Slots `0..len()` are live. Merging rewrites slots in place (see
/// [`ActiveSet::merge`]), so slot order, and with it the enumeration order of
/// candidate pairs, depends on the merge history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSet {
    slots: Vec<NodeId>,
}

impl ActiveSet {
    /// Identity map on `[0, n)`.
    pub fn identity(n: usize) -> Self {
        Self {
            slots: (0..n).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> NodeId {
        self.slots[slot]
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().copied()
    }

    /// Replace the nodes in slots `f_slot` and `g_slot` by `u`.
    ///
    /// `u` takes `f_slot`; `g_slot` receives the id held by the last slot,
    /// and the set shrinks by one.
    pub fn merge(&mut self, f_slot: usize, g_slot: usize, u: NodeId) {
        debug_assert!(f_slot != g_slot);
        debug_assert!(f_slot < self.slots.len() && g_slot < self.slots.len());
        self.slots[f_slot] = u;
        self.slots.swap_remove(g_slot);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
