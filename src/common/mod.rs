mod id;
mod node;

pub use id::*;
pub use node::*;
