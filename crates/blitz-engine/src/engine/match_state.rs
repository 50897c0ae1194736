use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    MatchConfigError,
    core::{
        grid::{Grid, Position},
        position_set::PositionSet,
    },
};

use super::{
    player::{Player, PlayerId},
    status::Status,
};

/// Maximum number of players in a match.
pub const MAX_PLAYERS: usize = 2;

/// Phase of a match.
///
/// Phases only move forward:
/// `lobby -> placement -> battle -> ended`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[display("lobby")]
    Lobby,
    #[display("placement")]
    Placement,
    #[display("battle")]
    Battle,
    #[display("ended")]
    Ended,
}

/// Static parameters of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub rows: usize,
    pub cols: usize,
    pub max_bases: usize,
}

impl MatchConfig {
    pub const DEFAULT_MAX_BASES: usize = 5;

    pub fn new(rows: usize, cols: usize, max_bases: usize) -> Result<Self, MatchConfigError> {
        let config = Self {
            rows,
            cols,
            max_bases,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchConfigError> {
        let grid = self.grid();
        if grid.is_empty() {
            return Err(MatchConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.max_bases == 0 || self.max_bases > grid.len() {
            return Err(MatchConfigError::InvalidMaxBases {
                max_bases: self.max_bases,
                cells: grid.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn grid(&self) -> Grid {
        Grid::new(self.rows, self.cols)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rows: Grid::DEFAULT_ROWS,
            cols: Grid::DEFAULT_COLS,
            max_bases: Self::DEFAULT_MAX_BASES,
        }
    }
}

/// The entity graph of one match.
///
/// Read-only from outside the crate; all mutation goes through
/// [`MatchEngine`](crate::MatchEngine).
///
/// # Invariants
///
/// - At most [`MAX_PLAYERS`] players, kept in join order
/// - Every player has a base set and a normal-shot candidate set
/// - A turn holder is assigned only when battle starts
/// - Balances never go negative (`u32`, every debit is checked)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    pub(crate) grid: Grid,
    pub(crate) max_bases: usize,
    pub(crate) phase: Phase,
    pub(crate) turn_player_id: Option<PlayerId>,
    pub(crate) winner_id: Option<PlayerId>,
    pub(crate) players: Vec<Player>,
    pub(crate) bases: HashMap<PlayerId, PositionSet>,
    pub(crate) normal_candidates: HashMap<PlayerId, PositionSet>,
    pub(crate) last_impacts: Vec<Position>,
    pub(crate) last_status: Option<Status>,
    pub(crate) last_shooter_id: Option<PlayerId>,
}

impl MatchState {
    pub(crate) fn new(config: MatchConfig) -> Self {
        Self {
            grid: config.grid(),
            max_bases: config.max_bases,
            phase: Phase::Lobby,
            turn_player_id: None,
            winner_id: None,
            players: Vec::with_capacity(MAX_PLAYERS),
            bases: HashMap::new(),
            normal_candidates: HashMap::new(),
            last_impacts: Vec::new(),
            last_status: None,
            last_shooter_id: None,
        }
    }

    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    #[must_use]
    pub const fn max_bases(&self) -> usize {
        self.max_bases
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn turn_player_id(&self) -> Option<PlayerId> {
        self.turn_player_id
    }

    #[must_use]
    pub const fn winner_id(&self) -> Option<PlayerId> {
        self.winner_id
    }

    /// Players in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Returns the other player of the match, if present.
    #[must_use]
    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        self.players.iter().map(|p| p.id).find(|&other| other != id)
    }

    /// Bases currently owned by `id`, or `None` for unknown players.
    #[must_use]
    pub fn bases(&self, id: PlayerId) -> Option<&PositionSet> {
        self.bases.get(&id)
    }

    /// Remaining untried positions for `id`'s normal shots.
    #[must_use]
    pub fn normal_candidates(&self, id: PlayerId) -> Option<&PositionSet> {
        self.normal_candidates.get(&id)
    }

    #[must_use]
    pub fn last_impacts(&self) -> &[Position] {
        &self.last_impacts
    }

    #[must_use]
    pub const fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    #[must_use]
    pub const fn last_shooter_id(&self) -> Option<PlayerId> {
        self.last_shooter_id
    }

    pub(crate) fn all_ready(&self) -> bool {
        self.players.len() == MAX_PLAYERS && self.players.iter().all(|p| p.ready)
    }

    pub(crate) fn all_placement_ready(&self) -> bool {
        self.players.len() == MAX_PLAYERS && self.players.iter().all(|p| p.placement_ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchConfig::default();
        assert_eq!((config.rows, config.cols, config.max_bases), (3, 5, 5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            MatchConfig::new(0, 5, 1),
            Err(MatchConfigError::EmptyGrid { .. })
        ));
        assert!(matches!(
            MatchConfig::new(2, 2, 5),
            Err(MatchConfigError::InvalidMaxBases { cells: 4, .. })
        ));
        assert!(matches!(
            MatchConfig::new(2, 2, 0),
            Err(MatchConfigError::InvalidMaxBases { .. })
        ));
        assert!(MatchConfig::new(4, 4, 16).is_ok());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"max_bases": 3}"#).unwrap();
        assert_eq!(config, MatchConfig::new(3, 5, 3).unwrap());
    }

    #[test]
    fn test_phase_wire_names() {
        assert_eq!(serde_json::to_string(&Phase::Placement).unwrap(), "\"placement\"");
        assert_eq!(Phase::Battle.to_string(), "battle");
    }
}
