pub mod error;
pub mod hash;
pub mod model;

pub use error::*;
pub use hash::*;
pub use model::*;
