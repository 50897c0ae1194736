pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MatchConfigError {
    #[display("grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
    #[display("max bases must be between 1 and {cells} (grid size), got {max_bases}")]
    InvalidMaxBases { max_bases: usize, cells: usize },
}
