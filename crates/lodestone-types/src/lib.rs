pub mod bracket;
pub mod types;
pub mod version;

pub use bracket::*;
pub use types::*;
pub use version::*;
