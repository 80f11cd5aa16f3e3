pub use mcss_filesystem as file_system;
pub use options::*;
pub use processor::*;
pub use watch::*;

pub mod import_dependencies;
pub mod invalidation;
pub mod options;
pub mod output;
pub mod plugins;
pub mod processor;

mod watch;
