pub mod completion;
pub mod config;
pub mod fit;
pub mod version;
