pub mod contract;
pub mod enums;

pub use contract::*;
pub use enums::*;
