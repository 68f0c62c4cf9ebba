//! Iterative lookup crawls: bounded-concurrency rounds against the nodes
//! currently believed closest to a target.

mod closest_nodes;
mod nodes;
mod range;
mod value;

pub use closest_nodes::ClosestNodes;
pub use nodes::NodeCrawl;
pub use range::RangeCrawl;
pub use value::ValueCrawl;

use std::collections::HashMap;

use tracing::trace;

use crate::common::{Id, Node};
use crate::rpc::RpcResponse;

/// Hard cap on rounds per crawl. Termination normally comes from the
/// proximity sets becoming fully contacted; this bound keeps a pathological
/// transport from spinning a crawl forever, settling for the best answer
/// accumulated so far.
pub(crate) const MAX_ROUNDS: usize = 128;

/// One round's responses, keyed by the id of the node that was contacted.
pub(crate) type RoundResponses = HashMap<Id, RpcResponse>;

#[derive(Debug)]
/// State shared by every crawl variant: the capped set of nearest known
/// nodes and the previous round's snapshot for stall detection.
pub(crate) struct Lookup {
    target: Id,
    alpha: usize,
    nearest: ClosestNodes,
    last_round_ids: Vec<Id>,
}

impl Lookup {
    pub(crate) fn new(target: Id, seeds: Vec<Node>, ksize: usize, alpha: usize) -> Self {
        let mut nearest = ClosestNodes::new(target, ksize);
        nearest.extend(seeds);

        Self {
            target,
            alpha,
            nearest,
            last_round_ids: Vec::new(),
        }
    }

    pub(crate) fn target(&self) -> Id {
        self.target
    }

    pub(crate) fn alpha(&self) -> usize {
        self.alpha
    }

    pub(crate) fn nearest(&self) -> &ClosestNodes {
        &self.nearest
    }

    pub(crate) fn nearest_mut(&mut self) -> &mut ClosestNodes {
        &mut self.nearest
    }

    /// Pick this round's recipients: the `alpha` nearest uncontacted nodes,
    /// or every uncontacted node once the nearest set has stopped changing
    /// since the previous round. Alpha-limited probing alone cannot
    /// terminate a lookup whose neighborhood has converged.
    ///
    /// Selected nodes are marked contacted before any request is issued, so
    /// a node is never picked twice even while its response is pending.
    pub(crate) fn select(&mut self) -> Vec<Node> {
        let current = self.nearest.ids();
        let count = if current == self.last_round_ids && !current.is_empty() {
            trace!(id = ?self.target, "nearest set stalled, contacting all remaining");
            self.nearest.len()
        } else {
            self.alpha
        };
        self.last_round_ids = current;

        let selected: Vec<Node> = self.nearest.uncontacted().into_iter().take(count).collect();
        for node in &selected {
            self.nearest.mark_contacted(&node.id);
        }

        selected
    }

    /// One full round: select, fan out, wait for everyone.
    pub(crate) fn round<F>(&mut self, rpc: F) -> RoundResponses
    where
        F: Fn(&Node) -> RpcResponse + Sync,
    {
        let selected = self.select();
        trace!(id = ?self.target, contacting = selected.len(), "crawl round");

        fan_out(selected, rpc)
    }
}

/// Issue `rpc` against every selected node concurrently and wait for all of
/// them to resolve: a full barrier, not first-response-wins. Individual
/// failures arrive as [RpcResponse::Unreachable], never as panics or errors.
pub(crate) fn fan_out<F>(selected: Vec<Node>, rpc: F) -> RoundResponses
where
    F: Fn(&Node) -> RpcResponse + Sync,
{
    let (tx, rx) = flume::bounded(selected.len().max(1));

    std::thread::scope(|scope| {
        for node in &selected {
            let tx = tx.clone();
            let rpc = &rpc;
            scope.spawn(move || {
                let response = rpc(node);
                let _ = tx.send((node.id, response));
            });
        }
    });
    drop(tx);

    rx.into_iter().collect()
}
