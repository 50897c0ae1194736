use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::position_set::PositionSet;

/// A cell on the match grid, addressed by row and column.
///
/// Positions are plain values: two positions are equal when both coordinates
/// are equal. A `Position` on its own carries no bounds; use [`Grid::position`]
/// to build one from untrusted coordinates.
///
/// # Wire Format
///
/// Serialized as a two-element array `[row, col]`.
///
/// ```
/// use blitz_engine::Position;
///
/// let pos = Position::new(1, 3);
/// assert_eq!(serde_json::to_string(&pos).unwrap(), "[1,3]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> usize {
        self.col
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.row, self.col).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (row, col) = <(usize, usize)>::deserialize(deserializer)?;
        Ok(Self { row, col })
    }
}

/// Dimensions of the rectangular match grid.
///
/// The grid has no state of its own; it only knows which positions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
}

impl Grid {
    pub const DEFAULT_ROWS: usize = 3;
    pub const DEFAULT_COLS: usize = 5;

    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    #[must_use]
    pub const fn rows(self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(self) -> usize {
        self.cols
    }

    /// Returns the number of cells in the grid.
    #[must_use]
    pub const fn len(self) -> usize {
        self.rows * self.cols
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn contains(self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Builds a position from signed wire coordinates.
    ///
    /// Returns `None` when either coordinate is negative or outside the grid.
    #[must_use]
    pub fn position(self, row: i64, col: i64) -> Option<Position> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        let pos = Position::new(row, col);
        self.contains(pos).then_some(pos)
    }

    /// Iterates over every position in row-major order.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Position::new(row, col)))
    }

    /// Returns the set of every position on the grid.
    #[must_use]
    pub fn all(self) -> PositionSet {
        self.positions().collect()
    }

    /// Returns the 3×3 block centered on `center`, clipped to the grid.
    ///
    /// Corners yield 4 cells, edges 6 and interior cells 9. Cells are returned
    /// in row-major order.
    #[must_use]
    pub fn neighborhood(self, center: Position) -> Vec<Position> {
        let rows = center.row.saturating_sub(1)..=(center.row + 1).min(self.rows.saturating_sub(1));
        let cols = center.col.saturating_sub(1)..=(center.col + 1).min(self.cols.saturating_sub(1));
        rows.flat_map(|row| cols.clone().map(move |col| Position::new(row, col)))
            .filter(|pos| self.contains(*pos))
            .collect()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROWS, Self::DEFAULT_COLS)
    }
}
