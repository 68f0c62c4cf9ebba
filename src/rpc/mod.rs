//! Transport-facing surface of the lookup engine.

pub mod response;

pub use response::{RpcPayload, RpcResponse};

use bytes::Bytes;

use crate::common::{Id, Node};

/// The wire/RPC collaborator that actually talks to the network.
///
/// Every find call resolves to an [RpcResponse]; an unreachable or timed-out
/// peer is reported as [RpcResponse::Unreachable], never as an error. Timeout,
/// cancellation and retry policy all live behind this trait; the engine only
/// ever observes terminal outcomes.
///
/// `Sync` so one round can fan calls out across threads.
pub trait Rpc: Sync {
    /// Ask `node` for the nodes it knows closest to `target`.
    fn find_node(&self, node: &Node, target: &Id) -> RpcResponse;

    /// Ask `node` for the value stored under `target`, falling back to its
    /// closest known nodes when it does not have it.
    fn find_value(&self, node: &Node, target: &Id) -> RpcResponse;

    /// Ask `node` for every value it stores under `prefix`, along with the
    /// nodes it knows bordering that range.
    fn find_range(&self, node: &Node, prefix: &Bytes) -> RpcResponse;

    /// Instruct `node` to store `value` under `key`. Fire-and-forget; the
    /// engine ignores the outcome.
    fn store(&self, node: &Node, key: &Id, value: &Bytes);
}
