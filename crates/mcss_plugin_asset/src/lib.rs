pub use asset_transform::*;

mod asset_transform;
