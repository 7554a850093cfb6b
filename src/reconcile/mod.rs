//! Diffing a scene against the layers and audio inputs believed present on the compositor.

pub mod geometry;
pub mod reconciler;
pub mod registry;
pub mod report;
