//! Semantic wrapper over the result of a single find RPC.
use bytes::Bytes;

use crate::common::Node;

#[derive(Clone, Debug)]
/// Payload of a find RPC that reached its peer.
pub enum RpcPayload {
    /// A plain neighbor list: a find_node answer, or a find_value miss.
    Nodes(Vec<Node>),
    /// The single value stored under the requested key.
    Value(Bytes),
    /// Values under a requested prefix plus the nodes bordering the range.
    Range {
        values: Vec<Bytes>,
        neighbors: Vec<Node>,
    },
}

#[derive(Clone, Debug)]
/// Outcome of one find RPC.
///
/// Callers must branch on [happened](RpcResponse::happened) and
/// [has_value](RpcResponse::has_value) before reaching for a shape accessor;
/// calling an accessor against the wrong payload shape is a bug in the caller
/// and panics.
pub enum RpcResponse {
    /// The peer never answered.
    Unreachable,
    /// The peer answered with a payload.
    Responded(RpcPayload),
}

impl RpcResponse {
    /// Did the other host actually respond?
    pub fn happened(&self) -> bool {
        matches!(self, RpcResponse::Responded(_))
    }

    pub fn has_value(&self) -> bool {
        matches!(self, RpcResponse::Responded(RpcPayload::Value(_)))
    }

    /// The stored value of a [RpcPayload::Value] response.
    pub fn value(&self) -> &Bytes {
        match self {
            RpcResponse::Responded(RpcPayload::Value(value)) => value,
            other => panic!("value() called on a non-value response: {:?}", other),
        }
    }

    /// The values of a [RpcPayload::Range] response.
    pub fn values(&self) -> &[Bytes] {
        match self {
            RpcResponse::Responded(RpcPayload::Range { values, .. }) => values,
            other => panic!("values() called on a non-range response: {:?}", other),
        }
    }

    /// The bordering nodes of a [RpcPayload::Range] response.
    pub fn neighbors(&self) -> &[Node] {
        match self {
            RpcResponse::Responded(RpcPayload::Range { neighbors, .. }) => neighbors,
            other => panic!("neighbors() called on a non-range response: {:?}", other),
        }
    }

    /// The node list of a [RpcPayload::Nodes] response.
    pub fn node_list(&self) -> &[Node] {
        match self {
            RpcResponse::Responded(RpcPayload::Nodes(nodes)) => nodes,
            other => panic!("node_list() called on a non-node-list response: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Id;

    #[test]
    fn unreachable_never_happened() {
        assert!(!RpcResponse::Unreachable.happened());
        assert!(!RpcResponse::Unreachable.has_value());
    }

    #[test]
    fn value_response() {
        let response = RpcResponse::Responded(RpcPayload::Value(Bytes::from_static(b"x")));

        assert!(response.happened());
        assert!(response.has_value());
        assert_eq!(response.value(), &Bytes::from_static(b"x"));
    }

    #[test]
    fn node_list_response() {
        let nodes = vec![Node::random(), Node::random()];
        let response = RpcResponse::Responded(RpcPayload::Nodes(nodes.clone()));

        assert!(response.happened());
        assert!(!response.has_value());
        assert_eq!(response.node_list(), &nodes[..]);
    }

    #[test]
    fn range_response() {
        let neighbors = vec![Node::random()];
        let response = RpcResponse::Responded(RpcPayload::Range {
            values: vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")],
            neighbors: neighbors.clone(),
        });

        assert!(response.happened());
        assert_eq!(response.values().len(), 2);
        assert_eq!(response.neighbors(), &neighbors[..]);
    }

    #[test]
    #[should_panic]
    fn wrong_shape_accessor_panics() {
        let response = RpcResponse::Responded(RpcPayload::Value(Bytes::from_static(b"x")));
        let _ = response.node_list();
    }

    #[test]
    fn ids_are_usable_as_map_keys() {
        let mut map = std::collections::HashMap::new();
        map.insert(Id::random(), RpcResponse::Unreachable);
        assert_eq!(map.len(), 1);
    }
}
