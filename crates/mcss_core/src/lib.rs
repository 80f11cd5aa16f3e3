pub mod bundler;
pub mod diagnostic;
pub mod error;
pub mod hash;
pub mod namer;
pub mod plugin;
pub mod project_path;
pub mod resolver;
pub mod stylesheet;
pub mod types;
pub mod value_parser;
