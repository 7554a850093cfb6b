//! Seams to the external broadcast SDK and media layer, plus in-memory implementations.

pub mod memory;
pub mod traits;
