//! Struct and implementation of the Node entries a lookup crawls over
use std::net::SocketAddr;

use crate::common::Id;

#[derive(Debug, Clone, PartialEq)]
/// A peer as seen by a lookup: an id and the address it answers on.
///
/// Nodes are immutable value objects, created from seed lists or RPC
/// response payloads and never mutated afterwards.
pub struct Node {
    pub id: Id,
    pub address: SocketAddr,
}

impl Node {
    /// Creates a new Node from an id and socket address.
    pub fn new(id: Id, address: SocketAddr) -> Node {
        Node { id, address }
    }

    /// A node with a random Id and an unspecified address.
    pub fn random() -> Node {
        Node {
            id: Id::random(),
            address: SocketAddr::from(([0, 0, 0, 0], 0)),
        }
    }
}
