//! Text output for the terminal and conversation export.

pub mod generator;

pub use generator::*;
