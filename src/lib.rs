pub mod completion;
pub mod config;
pub mod credits;
pub mod env_loader;
pub mod errors;
pub mod json_encoder;
pub mod literal;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod table_io;
