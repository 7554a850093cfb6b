//! Orchestration surface: the operations a broadcast UI calls.

pub mod controller;
pub mod script;
