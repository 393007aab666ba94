pub mod constants;
pub mod errors;
pub mod fx;
pub mod pricing;

pub use pricing::*;
