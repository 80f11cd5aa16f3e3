pub use path_resolver_transform::*;

mod path_resolver_transform;
