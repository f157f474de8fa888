pub mod eligibility;
pub mod errors;

pub use eligibility::*;
pub use errors::*;
