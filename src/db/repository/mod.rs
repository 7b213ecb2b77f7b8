pub mod contract;
pub mod contract_file;
pub mod extraction_record;
pub mod party;
pub mod review_record;

pub use contract::*;
pub use contract_file::*;
pub use extraction_record::*;
pub use party::*;
pub use review_record::*;
