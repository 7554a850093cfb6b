//! Static image assets referenced by scenes.

pub mod image;
