pub mod errors;
pub mod pool;

pub use errors::*;
pub use pool::*;
