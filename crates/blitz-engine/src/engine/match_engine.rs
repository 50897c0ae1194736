use rand::{Rng as _, seq::IndexedRandom as _};
use rand_pcg::Pcg32;

use crate::core::{grid::Position, position_set::PositionSet};

use super::{
    match_state::{MatchConfig, MatchState, Phase},
    player::{Player, PlayerId},
    seed::MatchSeed,
    shot::{BASE_PRICE, ShotType},
    snapshot::Snapshot,
    status::Status,
};

/// Owns one [`MatchState`] and applies the match rules to it.
///
/// The engine is plain sequential code: callers are expected to serialize
/// access per match. All randomness (first turn, shot targets, player ids)
/// comes from the engine's own seeded generator.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    state: MatchState,
    rng: Pcg32,
}

impl MatchEngine {
    /// Creates an empty match with a random seed.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self::with_seed(config, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic matches.
    #[must_use]
    pub fn with_seed(config: MatchConfig, seed: MatchSeed) -> Self {
        Self {
            state: MatchState::new(config),
            rng: seed.rng(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(&self.state)
    }

    /// Adds a human player. Returns `None` (recording the reason) if the
    /// match is full or already past the lobby.
    pub fn join(&mut self, name: &str) -> Option<PlayerId> {
        self.add_player(name, false)
    }

    /// Adds the scripted opponent. It joins already marked ready.
    pub fn join_scripted(&mut self, name: &str) -> Option<PlayerId> {
        self.add_player(name, true)
    }

    fn add_player(&mut self, name: &str, scripted: bool) -> Option<PlayerId> {
        if self.state.is_full() {
            self.record(Status::RoomFull);
            return None;
        }
        if !self.state.phase.is_lobby() {
            self.record(Status::NotInLobby);
            return None;
        }

        let id = PlayerId::random(&mut self.rng);
        self.state.players.push(Player::new(id, name, scripted));
        self.state.bases.insert(id, PositionSet::new());
        self.state
            .normal_candidates
            .insert(id, self.state.grid.all());

        let status = if self.state.all_ready() {
            self.start_placement()
        } else if self.state.is_full() {
            Status::WaitingForReady
        } else {
            Status::RoomCreated
        };
        self.record(status);
        Some(id)
    }

    /// Sets the lobby ready flag. Moves to placement once every player is ready.
    pub fn set_ready(&mut self, id: PlayerId, ready: bool) -> Status {
        if !self.state.phase.is_lobby() {
            return self.record(Status::NotInLobby);
        }
        let Some(player) = self.state.player_mut(id) else {
            return self.record(Status::InvalidPlayer);
        };
        player.ready = ready;

        if self.state.all_ready() {
            let status = self.start_placement();
            return self.record(status);
        }
        self.record(Status::ReadyUpdated)
    }

    /// Places one base during the placement phase.
    ///
    /// Battle starts as soon as both players have placed `max_bases` bases.
    pub fn place_base(&mut self, id: PlayerId, pos: Position) -> Status {
        if !self.state.phase.is_placement() {
            return self.record(Status::NotInPlacement);
        }
        if !self.state.grid.contains(pos) {
            return self.record(Status::InvalidPosition);
        }
        let max_bases = self.state.max_bases;
        let Some(bases) = self.state.bases.get_mut(&id) else {
            return self.record(Status::InvalidPlayer);
        };
        if bases.contains(pos) {
            return self.record(Status::PositionOccupied);
        }
        if bases.len() >= max_bases {
            return self.record(Status::BaseLimitReached);
        }

        bases.insert(pos);
        let placed = bases.len();
        if placed == max_bases
            && let Some(player) = self.state.player_mut(id)
        {
            player.placement_ready = true;
        }

        if self.state.all_placement_ready() {
            let status = self.start_battle();
            return self.record(status);
        }
        self.record(Status::BasePlaced)
    }

    /// Buys an extra base for [`BASE_PRICE`] and hands the turn over.
    ///
    /// Buying is allowed off-turn; the turn still flips away from whoever
    /// holds it. Only the buyer's own bases count as occupied, so the opponent
    /// may own the same cell on their side.
    pub fn buy_base(&mut self, id: PlayerId, pos: Position) -> Status {
        if !self.state.phase.is_battle() {
            return self.record(Status::NotInBattle);
        }
        if !self.state.grid.contains(pos) {
            return self.record(Status::InvalidPosition);
        }
        let Some(player) = self.state.player(id) else {
            return self.record(Status::InvalidPlayer);
        };
        if player.balance < BASE_PRICE {
            return self.record(Status::InsufficientBalance);
        }
        if self.state.bases.get(&id).is_some_and(|b| b.contains(pos)) {
            return self.record(Status::PositionOccupied);
        }

        if let Some(player) = self.state.player_mut(id) {
            player.try_spend(BASE_PRICE);
        }
        self.state.bases.entry(id).or_default().insert(pos);
        self.end_turn();
        self.record(Status::BasePurchased)
    }

    /// Fires one shot at the opponent.
    ///
    /// Every destroyed base credits the shooter with one balance point. If the
    /// opponent loses its last base the match ends and the turn stays with the
    /// shooter; otherwise the turn passes to the opponent.
    pub fn shoot(&mut self, id: PlayerId, shot: ShotType) -> Status {
        if !self.state.phase.is_battle() {
            return self.record(Status::NotInBattle);
        }
        let Some(player) = self.state.player(id) else {
            return self.record(Status::InvalidPlayer);
        };
        if self.state.turn_player_id != Some(id) {
            return self.record(Status::NotYourTurn);
        }
        if player.balance < shot.cost() {
            return self.record(Status::InsufficientBalance);
        }
        if let Some(player) = self.state.player_mut(id) {
            player.try_spend(shot.cost());
        }

        let opponent = self.state.opponent_of(id);
        let impacts = match opponent {
            None => Vec::new(),
            Some(opponent) => match shot {
                ShotType::Normal => self.normal_impacts(id, opponent),
                ShotType::Precise => self.precise_impacts(opponent),
                ShotType::Strong => self.strong_impacts(),
            },
        };

        self.state.last_shooter_id = Some(id);
        if let Some(opponent) = opponent {
            self.apply_impacts(id, opponent, &impacts);
        }
        self.state.last_impacts = impacts;

        if let Some(opponent) = opponent
            && self.state.bases.get(&opponent).is_none_or(PositionSet::is_empty)
        {
            self.state.phase = Phase::Ended;
            self.state.winner_id = Some(id);
            return self.record(Status::MatchOver);
        }

        self.end_turn();
        self.record(Status::ShotFired)
    }

    /// Definitive leave: the player forfeits and the other player wins.
    ///
    /// A match that already ended keeps its winner.
    pub fn forfeit(&mut self, id: PlayerId) -> Status {
        let Some(player) = self.state.player_mut(id) else {
            return self.record(Status::InvalidPlayer);
        };
        player.connected = false;
        if !self.state.phase.is_ended() {
            self.state.phase = Phase::Ended;
            self.state.winner_id = self.state.opponent_of(id);
        }
        self.record(Status::OpponentForfeited)
    }

    /// Transient network loss: only flags the player offline.
    pub fn disconnect(&mut self, id: PlayerId) -> Status {
        let Some(player) = self.state.player_mut(id) else {
            return self.record(Status::InvalidPlayer);
        };
        player.connected = false;
        self.record(Status::OpponentDisconnected)
    }

    pub fn reconnect(&mut self, id: PlayerId) -> Status {
        let Some(player) = self.state.player_mut(id) else {
            return self.record(Status::InvalidPlayer);
        };
        player.connected = true;
        self.record(Status::OpponentReconnected)
    }

    /// Records a rejection detected before reaching the engine, such as a
    /// malformed position or an unknown shot type.
    pub fn reject(&mut self, status: Status) -> Status {
        debug_assert!(status.is_rejection(), "{status:?} is not a rejection");
        self.record(status)
    }

    fn record(&mut self, status: Status) -> Status {
        self.state.last_status = Some(status);
        status
    }

    fn start_placement(&mut self) -> Status {
        self.state.phase = Phase::Placement;
        for player in &mut self.state.players {
            player.placement_ready = false;
        }
        Status::PlayersReady
    }

    fn start_battle(&mut self) -> Status {
        self.state.phase = Phase::Battle;
        self.state.turn_player_id = self.state.players.choose(&mut self.rng).map(Player::id);
        Status::BattleStarted
    }

    fn end_turn(&mut self) {
        if let Some(opponent) = self
            .state
            .turn_player_id
            .and_then(|holder| self.state.opponent_of(holder))
        {
            self.state.turn_player_id = Some(opponent);
        }
    }

    /// Picks from the shooter's remaining candidates.
    ///
    /// A miss removes the cell for good; a hit resets the candidates to the
    /// full grid. An exhausted candidate set is refilled first.
    fn normal_impacts(&mut self, shooter: PlayerId, opponent: PlayerId) -> Vec<Position> {
        let grid = self.state.grid;
        let candidates = self.state.normal_candidates.entry(shooter).or_default();
        if candidates.is_empty() {
            *candidates = grid.all();
        }
        let Some(pos) = candidates.choose(&mut self.rng) else {
            return Vec::new();
        };

        let hit = self
            .state
            .bases
            .get(&opponent)
            .is_some_and(|bases| bases.contains(pos));
        if hit {
            *candidates = grid.all();
        } else {
            candidates.remove(pos);
        }
        vec![pos]
    }

    fn precise_impacts(&mut self, opponent: PlayerId) -> Vec<Position> {
        let grid = self.state.grid;
        let empty_bases = PositionSet::new();
        let enemy_bases = self.state.bases.get(&opponent).unwrap_or(&empty_bases);

        if !enemy_bases.is_empty() && self.rng.random_bool(0.5) {
            return enemy_bases.choose(&mut self.rng).into_iter().collect();
        }

        let empty = grid.all().difference(enemy_bases);
        empty
            .choose(&mut self.rng)
            .or_else(|| grid.all().choose(&mut self.rng))
            .into_iter()
            .collect()
    }

    fn strong_impacts(&mut self) -> Vec<Position> {
        let grid = self.state.grid;
        grid.all()
            .choose(&mut self.rng)
            .map(|center| grid.neighborhood(center))
            .unwrap_or_default()
    }

    fn apply_impacts(&mut self, shooter: PlayerId, opponent: PlayerId, impacts: &[Position]) {
        let Some(enemy_bases) = self.state.bases.get_mut(&opponent) else {
            return;
        };
        let hits = impacts.iter().filter(|&&pos| enemy_bases.remove(pos)).count();
        if let Some(player) = self.state.player_mut(shooter) {
            player.balance += u32::try_from(hits).unwrap_or(u32::MAX);
        }
    }
}
