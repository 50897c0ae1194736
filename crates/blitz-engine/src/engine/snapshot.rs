use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::grid::Position;

use super::{
    match_state::{MatchState, Phase},
    player::{Player, PlayerId},
};

/// Full, serializable view of a match.
///
/// This is the whole contract between the engine and the transport: every
/// mutation is followed by pushing a fresh snapshot to every connection of the
/// match. There are no partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub max_bases: usize,
    pub phase: Phase,
    pub turn_player_id: Option<PlayerId>,
    pub winner_id: Option<PlayerId>,
    pub players: Vec<PlayerSnapshot>,
    pub bases: BTreeMap<PlayerId, Vec<Position>>,
    pub last_impacts: Vec<Position>,
    pub message: String,
    pub last_shooter_id: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub balance: u32,
    pub ready: bool,
    pub placement_ready: bool,
    pub connected: bool,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            balance: player.balance,
            ready: player.ready,
            placement_ready: player.placement_ready,
            connected: player.connected,
        }
    }
}

impl From<&MatchState> for Snapshot {
    fn from(state: &MatchState) -> Self {
        Self {
            rows: state.grid.rows(),
            cols: state.grid.cols(),
            max_bases: state.max_bases,
            phase: state.phase,
            turn_player_id: state.turn_player_id,
            winner_id: state.winner_id,
            players: state.players.iter().map(PlayerSnapshot::from).collect(),
            bases: state
                .bases
                .iter()
                .map(|(id, bases)| (*id, bases.to_vec()))
                .collect(),
            last_impacts: state.last_impacts.clone(),
            message: state
                .last_status
                .map(|status| status.to_string())
                .unwrap_or_default(),
            last_shooter_id: state.last_shooter_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchConfig, MatchEngine, MatchSeed};

    #[test]
    fn test_snapshot_shape() {
        let mut engine = MatchEngine::with_seed(MatchConfig::default(), MatchSeed::from_u64(1));
        let a = engine.join("Alice").unwrap();
        let b = engine.join("Bob").unwrap();

        let json = serde_json::to_value(engine.snapshot()).unwrap();
        assert_eq!(json["rows"], 3);
        assert_eq!(json["cols"], 5);
        assert_eq!(json["max_bases"], 5);
        assert_eq!(json["phase"], "lobby");
        assert!(json["turn_player_id"].is_null());
        assert!(json["winner_id"].is_null());
        assert_eq!(json["message"], "two players connected, mark ready");

        let players = json["players"].as_array().unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0]["id"], a.to_string());
        assert_eq!(players[0]["name"], "Alice");
        assert_eq!(players[0]["balance"], 0);
        assert_eq!(players[0]["connected"], true);
        assert_eq!(players[1]["id"], b.to_string());

        let bases = json["bases"].as_object().unwrap();
        assert_eq!(bases.len(), 2);
        assert!(bases[&a.to_string()].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_positions_and_roundtrip() {
        let mut engine = MatchEngine::with_seed(MatchConfig::default(), MatchSeed::from_u64(2));
        let a = engine.join("A").unwrap();
        let b = engine.join("B").unwrap();
        engine.set_ready(a, true);
        engine.set_ready(b, true);
        engine.place_base(a, Position::new(2, 1));
        engine.place_base(a, Position::new(0, 3));

        let snapshot = engine.snapshot();
        assert_eq!(
            snapshot.bases[&a],
            vec![Position::new(0, 3), Position::new(2, 1)]
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("[[0,3],[2,1]]"));
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
