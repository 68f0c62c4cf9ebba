#![doc = include_str!("../README.md")]

mod common;
mod error;

pub mod crawl;
pub mod rpc;

pub use crate::common::{Id, Node, ID_SIZE};
pub use crate::crawl::{ClosestNodes, NodeCrawl, RangeCrawl, ValueCrawl};
pub use crate::error::Error;
pub use crate::rpc::{Rpc, RpcPayload, RpcResponse};
pub use bytes::Bytes;

/// Alias for `Result<T, spider::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
