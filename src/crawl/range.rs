//! Retrieve every value whose key falls in an identifier interval under a
//! shared prefix, scanning rightward from a lower bound.
use bytes::Bytes;
use tracing::{debug, trace};

use super::{fan_out, ClosestNodes, Lookup, MAX_ROUNDS};
use crate::common::{Id, Node};
use crate::rpc::Rpc;

#[derive(Debug, PartialEq)]
enum Phase {
    /// One find_node cycle against the seed neighborhood to grow the scan
    /// frontier before any range query goes out.
    Discover,
    /// find_range against the frontier, advancing the scan anchor as the
    /// frontier expands rightward.
    Scan,
}

#[derive(Debug)]
/// A crawl that collects every value stored in the open interval
/// `(lower, upper)` under `prefix`.
pub struct RangeCrawl {
    lookup: Lookup,
    prefix: Bytes,
    lower: Id,
    upper: Id,
    phase: Phase,
    /// The scan frontier: every node discovered so far, ordered by distance
    /// to the moving lower-bound anchor. Effectively unbounded.
    nodes_to_query: ClosestNodes,
    last_scan_ids: Vec<Id>,
    found_values: Vec<Bytes>,
}

impl RangeCrawl {
    pub fn new(
        prefix: Bytes,
        lower: Id,
        upper: Id,
        seeds: Vec<Node>,
        ksize: usize,
        alpha: usize,
    ) -> Self {
        let mut nodes_to_query = ClosestNodes::new(lower, usize::MAX);
        nodes_to_query.extend(seeds.iter().cloned());

        Self {
            lookup: Lookup::new(lower, seeds, ksize, alpha),
            prefix,
            lower,
            upper,
            phase: Phase::Discover,
            nodes_to_query,
            last_scan_ids: Vec::new(),
            found_values: Vec::new(),
        }
    }

    /// Drive the crawl to completion. `None` means the whole frontier was
    /// contacted without finding a single value in the range.
    pub fn find(mut self, rpc: &impl Rpc) -> Option<Vec<Bytes>> {
        for _ in 0..MAX_ROUNDS {
            match self.phase {
                Phase::Discover => self.discover_round(rpc),
                Phase::Scan => {
                    if let Some(result) = self.scan_round(rpc) {
                        return result;
                    }
                }
            }
        }

        // Round cap hit: settle for what the scan has accumulated.
        if self.found_values.is_empty() {
            None
        } else {
            Some(dedup(self.found_values))
        }
    }

    /// One find_node cycle mirroring every discovered neighbor into the
    /// frontier. Discovery runs for exactly one response cycle, not to
    /// convergence.
    fn discover_round(&mut self, rpc: &impl Rpc) {
        let target = self.lookup.target();
        let responses = self.lookup.round(|node| rpc.find_node(node, &target));

        let mut to_remove = Vec::new();
        for (id, response) in &responses {
            if !response.happened() {
                to_remove.push(*id);
            } else {
                self.lookup
                    .nearest_mut()
                    .extend(response.node_list().iter().cloned());
                self.nodes_to_query
                    .extend(response.node_list().iter().cloned());
            }
        }
        self.lookup.nearest_mut().remove(&to_remove);
        self.nodes_to_query.remove(&to_remove);

        self.phase = Phase::Scan;
    }

    /// One find_range round against the frontier. Returns the terminal
    /// result once the whole frontier has been contacted.
    fn scan_round(&mut self, rpc: &impl Rpc) -> Option<Option<Vec<Bytes>>> {
        let selected = self.select_scan();
        let prefix = self.prefix.clone();
        let responses = fan_out(selected, |node| rpc.find_range(node, &prefix));

        let mut to_remove = Vec::new();
        for (id, response) in &responses {
            if !response.happened() {
                to_remove.push(*id);
            } else {
                self.found_values
                    .extend(response.values().iter().cloned());
                self.nodes_to_query
                    .extend(response.neighbors().iter().cloned());
            }
        }
        self.nodes_to_query.remove(&to_remove);

        if self.nodes_to_query.all_contacted() {
            if self.found_values.is_empty() {
                debug!(lower = ?self.lower, upper = ?self.upper, "range crawl found nothing");
                return Some(None);
            }

            let values = dedup(std::mem::take(&mut self.found_values));
            debug!(lower = ?self.lower, upper = ?self.upper, found = values.len(), "range crawl done");
            return Some(Some(values));
        }

        self.advance_anchor();

        None
    }

    /// Stall-aware selection out of the frontier, mirroring
    /// [Lookup::select] but reading the frontier set. The broadcast
    /// threshold is the frontier's own size, not the nearest set's.
    fn select_scan(&mut self) -> Vec<Node> {
        let current = self.nodes_to_query.ids();
        let count = if current == self.last_scan_ids && !current.is_empty() {
            trace!(lower = ?self.lower, "scan frontier stalled, contacting all remaining");
            self.nodes_to_query.len()
        } else {
            self.lookup.alpha()
        };
        self.last_scan_ids = current;

        let selected: Vec<Node> = self
            .nodes_to_query
            .uncontacted()
            .into_iter()
            .take(count)
            .collect();
        for node in &selected {
            self.nodes_to_query.mark_contacted(&node.id);
        }

        selected
    }

    /// Move the scan anchor to the largest uncontacted id still strictly
    /// inside `(lower, upper)` and re-sort the frontier around it. Contacted
    /// marks survive the rebuild so no node is ever contacted twice.
    fn advance_anchor(&mut self) {
        let mut new_lower = self.lower;
        for node in self.nodes_to_query.uncontacted() {
            if node.id > new_lower && node.id < self.upper {
                new_lower = node.id;
            }
        }

        if new_lower == self.lower {
            return;
        }

        trace!(from = ?self.lower, to = ?new_lower, "advancing scan anchor");
        self.lower = new_lower;

        let frontier = std::mem::replace(
            &mut self.nodes_to_query,
            ClosestNodes::new(new_lower, usize::MAX),
        );
        self.nodes_to_query = frontier.re_anchor(new_lower);
    }
}

/// Exact-equality dedup preserving first-seen order.
fn dedup(values: Vec<Bytes>) -> Vec<Bytes> {
    let mut out: Vec<Bytes> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }

    out
}
