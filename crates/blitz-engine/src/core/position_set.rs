use std::collections::BTreeSet;

use rand::{Rng, seq::IteratorRandom as _};
use serde::{Deserialize, Serialize};

use super::grid::Position;

/// An ordered set of grid positions.
///
/// Iteration order is row-major, which keeps random selection reproducible
/// for a given random source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionSet(BTreeSet<Position>);

impl PositionSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.0.contains(&pos)
    }

    /// Adds a position. Returns `false` if it was already present.
    pub fn insert(&mut self, pos: Position) -> bool {
        self.0.insert(pos)
    }

    /// Removes a position. Returns `false` if it was not present.
    pub fn remove(&mut self, pos: Position) -> bool {
        self.0.remove(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.0.iter().copied()
    }

    /// Picks one position uniformly at random, or `None` if the set is empty.
    pub fn choose<R>(&self, rng: &mut R) -> Option<Position>
    where
        R: Rng + ?Sized,
    {
        self.iter().choose(rng)
    }

    /// Returns the positions of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &PositionSet) -> PositionSet {
        Self(self.0.difference(&other.0).copied().collect())
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Position> {
        self.iter().collect()
    }
}

impl FromIterator<Position> for PositionSet {
    fn from_iter<T: IntoIterator<Item = Position>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Position> for PositionSet {
    fn extend<T: IntoIterator<Item = Position>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::Grid;

    #[test]
    fn test_choose_from_empty_set() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(PositionSet::new().choose(&mut rng), None);
    }

    #[test]
    fn test_choose_is_member_and_reproducible() {
        let set = Grid::default().all();
        let mut a = Pcg32::seed_from_u64(7);
        let mut b = Pcg32::seed_from_u64(7);
        for _ in 0..32 {
            let picked = set.choose(&mut a).unwrap();
            assert!(set.contains(picked));
            assert_eq!(Some(picked), set.choose(&mut b));
        }
    }

    #[test]
    fn test_difference() {
        let all = Grid::new(2, 2).all();
        let owned: PositionSet = [Position::new(0, 0), Position::new(1, 1)].into_iter().collect();
        assert_eq!(
            all.difference(&owned).to_vec(),
            vec![Position::new(0, 1), Position::new(1, 0)]
        );
    }
}
