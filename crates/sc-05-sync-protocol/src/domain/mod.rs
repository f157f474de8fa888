pub mod call;
pub mod errors;

pub use call::*;
pub use errors::*;
