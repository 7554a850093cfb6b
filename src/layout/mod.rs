//! Canvas-relative dimension specs and fill/crop placement.

pub mod dimensions;
pub mod fill;
