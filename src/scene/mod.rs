//! Declarative scene descriptions and the canonical scene templates.

pub mod model;
pub mod templates;
