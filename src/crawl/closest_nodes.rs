//! Capped, distance-ordered view over the nodes discovered during a lookup.
use std::collections::HashSet;

use crate::common::{Id, Node};

#[derive(Debug, Clone)]
/// Nodes ordered by XOR distance to an anchor, with membership capped at
/// `capacity`.
///
/// Every node ever pushed stays in the sorted arena; only the first
/// `capacity` entries count as members. Removing a close node can therefore
/// re-expose one that had been crowded out earlier. Duplicate pushes of an
/// id are ignored, keeping the first-seen entry, which is what makes
/// capacity-1 sets usable as "current best" registers.
pub struct ClosestNodes {
    anchor: Id,
    capacity: usize,
    nodes: Vec<Node>,
    contacted: HashSet<Id>,
}

impl ClosestNodes {
    pub fn new(anchor: Id, capacity: usize) -> Self {
        Self {
            anchor,
            capacity,
            nodes: Vec::new(),
            contacted: HashSet::new(),
        }
    }

    // === Getters ===

    pub fn anchor(&self) -> Id {
        self.anchor
    }

    /// Current members in ascending distance-to-anchor order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes[..self.len()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len().min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of member ids in current distance order.
    pub fn ids(&self) -> Vec<Id> {
        self.nodes().iter().map(|node| node.id).collect()
    }

    pub fn get(&self, id: &Id) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == *id)
    }

    // === Public Methods ===

    pub fn push(&mut self, node: Node) {
        if self.nodes.iter().any(|existing| existing.id == node.id) {
            return;
        }

        let distance = node.id.xor(&self.anchor);
        let position = self
            .nodes
            .partition_point(|probe| probe.id.xor(&self.anchor) <= distance);

        self.nodes.insert(position, node);
    }

    pub fn extend<I: IntoIterator<Item = Node>>(&mut self, nodes: I) {
        for node in nodes {
            self.push(node);
        }
    }

    pub fn mark_contacted(&mut self, id: &Id) {
        self.contacted.insert(*id);
    }

    pub fn is_contacted(&self, id: &Id) -> bool {
        self.contacted.contains(id)
    }

    /// Members not yet contacted, in ascending distance order.
    pub fn uncontacted(&self) -> Vec<Node> {
        self.nodes()
            .iter()
            .filter(|node| !self.contacted.contains(&node.id))
            .cloned()
            .collect()
    }

    /// True once every member has been contacted. An empty set counts as
    /// fully contacted, which is what terminates a lookup whose seeds all
    /// died.
    pub fn all_contacted(&self) -> bool {
        self.nodes()
            .iter()
            .all(|node| self.contacted.contains(&node.id))
    }

    /// Evict nodes regardless of contacted state, e.g. unresponsive ones.
    ///
    /// Contacted marks survive eviction, so a dead node re-reported by a
    /// later responder is not queried a second time.
    pub fn remove(&mut self, ids: &[Id]) {
        if ids.is_empty() {
            return;
        }

        self.nodes.retain(|node| !ids.contains(&node.id));
    }

    /// Remove and return the closest member.
    pub fn pop_nearest(&mut self) -> Option<Node> {
        if self.nodes.is_empty() {
            None
        } else {
            let node = self.nodes.remove(0);
            self.contacted.remove(&node.id);
            Some(node)
        }
    }

    /// Rebuild this set around a new anchor: the same arena re-sorted by
    /// distance to `anchor`, with contacted marks carried over by ownership.
    pub fn re_anchor(self, anchor: Id) -> ClosestNodes {
        let mut rebuilt = ClosestNodes::new(anchor, self.capacity);
        rebuilt.contacted = self.contacted;
        for node in self.nodes {
            rebuilt.push(node);
        }

        rebuilt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ID_SIZE;
    use std::net::SocketAddr;

    fn id(n: u8) -> Id {
        let mut bytes = [0_u8; ID_SIZE];
        bytes[0] = n;
        Id(bytes)
    }

    fn node(n: u8) -> Node {
        Node::new(id(n), SocketAddr::from(([127, 0, 0, 1], 6881 + n as u16)))
    }

    #[test]
    fn members_are_the_closest_and_ordered() {
        let mut set = ClosestNodes::new(id(0), 3);

        for n in [8, 2, 32, 16, 1, 4] {
            set.push(node(n));
        }

        assert_eq!(set.len(), 3);
        assert_eq!(set.ids(), vec![id(1), id(2), id(4)]);
    }

    #[test]
    fn capacity_invariant_holds_after_every_push() {
        let anchor = Id::random();
        let mut set = ClosestNodes::new(anchor, 8);

        for _ in 0..50 {
            set.push(Node::random());
            assert!(set.len() <= 8);

            let distances: Vec<Id> = set
                .nodes()
                .iter()
                .map(|node| node.id.xor(&anchor))
                .collect();
            let mut sorted = distances.clone();
            sorted.sort();
            assert_eq!(sorted, distances);
        }
    }

    #[test]
    fn removal_re_exposes_crowded_out_nodes() {
        let mut set = ClosestNodes::new(id(0), 2);

        set.push(node(1));
        set.push(node(2));
        set.push(node(4));
        assert_eq!(set.ids(), vec![id(1), id(2)]);

        set.remove(&[id(1)]);
        assert_eq!(set.ids(), vec![id(2), id(4)]);
    }

    #[test]
    fn duplicate_pushes_are_ignored() {
        let mut set = ClosestNodes::new(id(0), 4);

        set.push(node(1));
        set.push(node(1));

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn contacted_partitioning() {
        let mut set = ClosestNodes::new(id(0), 4);
        set.push(node(1));
        set.push(node(2));

        assert!(!set.all_contacted());

        set.mark_contacted(&id(1));
        assert_eq!(set.uncontacted(), vec![node(2)]);

        set.mark_contacted(&id(2));
        assert!(set.all_contacted());
        assert!(set.uncontacted().is_empty());
    }

    #[test]
    fn evicted_nodes_stay_contacted_when_re_reported() {
        let mut set = ClosestNodes::new(id(0), 4);
        set.push(node(1));
        set.mark_contacted(&id(1));
        set.remove(&[id(1)]);

        // A dead node re-reported by a later responder must not become
        // eligible for another round.
        set.push(node(1));

        assert!(set.is_contacted(&id(1)));
        assert!(set.uncontacted().is_empty());
        assert!(set.all_contacted());
    }

    #[test]
    fn empty_set_is_all_contacted() {
        let set = ClosestNodes::new(id(0), 4);
        assert!(set.all_contacted());
    }

    #[test]
    fn pop_nearest_in_distance_order() {
        let mut set = ClosestNodes::new(id(0), 4);
        set.push(node(4));
        set.push(node(1));

        assert_eq!(set.pop_nearest(), Some(node(1)));
        assert_eq!(set.pop_nearest(), Some(node(4)));
        assert_eq!(set.pop_nearest(), None);
    }

    #[test]
    fn re_anchor_resorts_and_preserves_contacted() {
        let mut set = ClosestNodes::new(id(0), 10);
        for n in [1, 8, 12] {
            set.push(node(n));
        }
        set.mark_contacted(&id(1));

        let set = set.re_anchor(id(12));

        assert_eq!(set.ids(), vec![id(12), id(8), id(1)]);
        assert!(set.is_contacted(&id(1)));
        assert!(!set.is_contacted(&id(8)));
    }
}
