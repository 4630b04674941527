pub mod align;
pub mod locate;
pub mod normalize;
pub mod result;
pub mod sanitize;
pub mod spans;
pub mod worker;

pub use result::*;
pub use worker::{AlignEngine, EngineConfig, PreparedText};
