//! Pure numeric routines behind the charts.
//!
//! Nothing in here keeps state or performs I/O. Degenerate inputs produce
//! sentinel results (`None` correlation, the `{0, 1}` default range) rather
//! than errors wherever a chart still has to be drawn.

pub mod color;
pub mod grid;
pub mod summary;

pub use color::*;
pub use grid::*;
pub use summary::*;

use thiserror::Error;

/// Errors from the statistics routines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The input sequence had no elements at all.
    #[error("cannot compute statistics over an empty sequence")]
    EmptyInput,

    /// Paired series must be the same length.
    #[error("series length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}
