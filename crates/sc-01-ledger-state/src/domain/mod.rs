pub mod apply;
pub mod bounty;
pub mod errors;
pub mod overlay;
pub mod state;

pub use apply::*;
pub use bounty::*;
pub use errors::*;
pub use overlay::*;
pub use state::*;
