pub mod errors;
pub mod node;
pub mod pending;
pub mod tree;

pub use errors::*;
pub use node::*;
pub use pending::*;
pub use tree::*;
