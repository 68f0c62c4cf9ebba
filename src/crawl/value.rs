//! Resolve the value stored under a target id, write-back caching it at the
//! nearest node that lacked it.
use bytes::Bytes;
use tracing::{debug, warn};

use super::{ClosestNodes, Lookup, MAX_ROUNDS};
use crate::common::{Id, Node};
use crate::rpc::Rpc;

#[derive(Debug)]
/// A crawl that resolves the value stored under `target`, or reports that no
/// reachable node has it.
pub struct ValueCrawl {
    lookup: Lookup,
    /// The single nearest responding node that did not have the value: the
    /// write-back target once the value is resolved, so future lookups
    /// terminate closer to the key's natural location.
    nearest_without_value: ClosestNodes,
}

impl ValueCrawl {
    pub fn new(target: Id, seeds: Vec<Node>, ksize: usize, alpha: usize) -> Self {
        Self {
            nearest_without_value: ClosestNodes::new(target, 1),
            lookup: Lookup::new(target, seeds, ksize, alpha),
        }
    }

    /// Drive the crawl to completion. `None` means every reachable node was
    /// contacted and none had the value.
    pub fn find(mut self, rpc: &impl Rpc) -> Option<Bytes> {
        let target = self.lookup.target();

        for _ in 0..MAX_ROUNDS {
            let responses = self.lookup.round(|node| rpc.find_value(node, &target));

            let mut to_remove = Vec::new();
            let mut found_values = Vec::new();
            for (id, response) in &responses {
                if !response.happened() {
                    to_remove.push(*id);
                } else if response.has_value() {
                    found_values.push(response.value().clone());
                } else {
                    // A responder without the value is a write-back
                    // candidate, and its neighbors feed the next round.
                    if let Some(node) = self.lookup.nearest().get(id).cloned() {
                        self.nearest_without_value.push(node);
                    }
                    self.lookup
                        .nearest_mut()
                        .extend(response.node_list().iter().cloned());
                }
            }
            self.lookup.nearest_mut().remove(&to_remove);

            if !found_values.is_empty() {
                return Some(self.resolve(rpc, found_values));
            }

            if self.lookup.nearest().all_contacted() {
                debug!(?target, "value not found");
                return None;
            }
        }

        None
    }

    /// Majority-vote the values found in one round and cache the winner at
    /// the nearest node that lacked it. The store outcome never gates the
    /// returned value.
    fn resolve(&mut self, rpc: &impl Rpc, values: Vec<Bytes>) -> Bytes {
        let mut counts: Vec<(Bytes, usize)> = Vec::new();
        for value in values {
            match counts.iter_mut().find(|(seen, _)| *seen == value) {
                Some((_, count)) => *count += 1,
                None => counts.push((value, 1)),
            }
        }

        if counts.len() > 1 {
            warn!(
                id = ?self.lookup.target(),
                ?counts,
                "got multiple values for key, resolving by majority"
            );
        }

        // Ties keep the value tallied first.
        let (value, _) = counts.into_iter().fold((Bytes::new(), 0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });

        if let Some(node) = self.nearest_without_value.pop_nearest() {
            rpc.store(&node, &self.lookup.target(), &value);
        }

        value
    }
}
