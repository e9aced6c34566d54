//! CLI command implementations

pub mod cache;
pub mod serve;
pub mod status;

pub use cache::execute as cache;
pub use serve::execute as serve;
pub use status::execute as status;
