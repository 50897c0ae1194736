pub use self::{grid::*, position_set::*};

pub mod grid;
pub mod position_set;
