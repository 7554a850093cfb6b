//! Arithmetic layout expressions over canvas and layer dimensions.

pub(crate) mod ast;
pub mod error;
pub mod eval;
pub(crate) mod lexer;
pub(crate) mod parser;
