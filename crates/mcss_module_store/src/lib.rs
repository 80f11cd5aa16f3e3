pub use module_store::*;

mod composes;
mod imports;
mod module_graph;
mod module_store;
