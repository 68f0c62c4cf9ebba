//! Converge on the k nodes nearest a target id.
use tracing::debug;

use super::{Lookup, MAX_ROUNDS};
use crate::common::{Id, Node};
use crate::rpc::Rpc;

#[derive(Debug)]
/// A crawl that converges on the `ksize` nodes nearest `target`.
pub struct NodeCrawl {
    lookup: Lookup,
}

impl NodeCrawl {
    pub fn new(target: Id, seeds: Vec<Node>, ksize: usize, alpha: usize) -> Self {
        Self {
            lookup: Lookup::new(target, seeds, ksize, alpha),
        }
    }

    /// Drive the crawl to completion and return the nearest nodes found, in
    /// ascending distance order. Empty when every seed died before reporting
    /// any neighbors.
    pub fn find(mut self, rpc: &impl Rpc) -> Vec<Node> {
        let target = self.lookup.target();

        for _ in 0..MAX_ROUNDS {
            let responses = self.lookup.round(|node| rpc.find_node(node, &target));

            let mut to_remove = Vec::new();
            for (id, response) in &responses {
                if !response.happened() {
                    to_remove.push(*id);
                } else {
                    self.lookup
                        .nearest_mut()
                        .extend(response.node_list().iter().cloned());
                }
            }
            self.lookup.nearest_mut().remove(&to_remove);

            if self.lookup.nearest().all_contacted() {
                break;
            }
        }

        debug!(?target, found = self.lookup.nearest().len(), "node crawl done");

        self.lookup.nearest().nodes().to_vec()
    }
}
