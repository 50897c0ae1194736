use blitz_engine::{MatchEngine, MatchState, Phase, PlayerId, Position, ShotType, Status};
use rand::{Rng, seq::SliceRandom as _};

use crate::{Difficulty, shot_choice::choose_shot};

/// What the scripted opponent intends to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Place bases at these positions, in order.
    PlaceBases(Vec<Position>),
    /// Fire one shot of this type.
    Shoot(ShotType),
}

/// Decision policy for the scripted player of a match.
///
/// The policy holds no match state: it reads a [`MatchState`] and issues the
/// same [`MatchEngine`] operations a remote player would, so every rule and
/// rejection applies to it unchanged.
///
/// # Example
///
/// ```
/// use blitz_ai::{Difficulty, OpponentPolicy};
/// use blitz_engine::{MatchConfig, MatchEngine, Phase};
///
/// let mut engine = MatchEngine::new(MatchConfig::default());
/// let human = engine.join("Alice").unwrap();
/// let cpu = engine.join_scripted("CPU").unwrap();
/// let policy = OpponentPolicy::new(cpu, Difficulty::Hard);
///
/// engine.set_ready(human, true);
/// assert_eq!(engine.state().phase(), Phase::Placement);
///
/// policy.act(&mut engine, &mut rand::rng());
/// assert!(engine.state().player(cpu).unwrap().is_placement_ready());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpponentPolicy {
    player_id: PlayerId,
    difficulty: Difficulty,
}

impl OpponentPolicy {
    #[must_use]
    pub const fn new(player_id: PlayerId, difficulty: Difficulty) -> Self {
        Self {
            player_id,
            difficulty,
        }
    }

    #[must_use]
    pub const fn player_id(&self) -> PlayerId {
        self.player_id
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Returns `true` if the scripted player has something to do: placing its
    /// bases during placement, or shooting while it holds the battle turn.
    #[must_use]
    pub fn should_act(&self, state: &MatchState) -> bool {
        match state.phase() {
            Phase::Placement => state
                .player(self.player_id)
                .is_some_and(|player| !player.is_placement_ready()),
            Phase::Battle => state.turn_player_id() == Some(self.player_id),
            Phase::Lobby | Phase::Ended => false,
        }
    }

    /// Decides the next action without touching the match.
    pub fn decide<R>(&self, state: &MatchState, rng: &mut R) -> Option<Decision>
    where
        R: Rng + ?Sized,
    {
        if !self.should_act(state) {
            return None;
        }
        let player = state.player(self.player_id)?;

        match state.phase() {
            Phase::Placement => {
                let owned = state.bases(self.player_id)?;
                let missing = state.max_bases().saturating_sub(owned.len());
                let mut free: Vec<_> = state
                    .grid()
                    .positions()
                    .filter(|pos| !owned.contains(*pos))
                    .collect();
                free.shuffle(rng);
                free.truncate(missing);
                Some(Decision::PlaceBases(free))
            }
            Phase::Battle => Some(Decision::Shoot(choose_shot(
                self.difficulty,
                player.balance(),
                rng,
            ))),
            Phase::Lobby | Phase::Ended => None,
        }
    }

    /// Decides and applies the next action.
    ///
    /// Returns the status of the last engine operation issued, or `None` if
    /// the scripted player had nothing to do.
    pub fn act<R>(&self, engine: &mut MatchEngine, rng: &mut R) -> Option<Status>
    where
        R: Rng + ?Sized,
    {
        match self.decide(engine.state(), rng)? {
            Decision::PlaceBases(positions) => positions
                .into_iter()
                .map(|pos| engine.place_base(self.player_id, pos))
                .last(),
            Decision::Shoot(shot) => Some(engine.shoot(self.player_id, shot)),
        }
    }
}

#[cfg(test)]
mod tests {
    use blitz_engine::{MatchConfig, MatchSeed};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn setup(difficulty: Difficulty, seed: u64) -> (MatchEngine, PlayerId, OpponentPolicy) {
        let mut engine = MatchEngine::with_seed(MatchConfig::default(), MatchSeed::from_u64(seed));
        let human = engine.join("Human").unwrap();
        let cpu = engine.join_scripted("CPU").unwrap();
        (engine, human, OpponentPolicy::new(cpu, difficulty))
    }

    fn place_human(engine: &mut MatchEngine, human: PlayerId) {
        for col in 0..5 {
            engine.place_base(human, Position::new(1, col));
        }
    }

    #[test]
    fn test_idle_in_lobby() {
        let (mut engine, _, policy) = setup(Difficulty::Normal, 1);
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(!policy.should_act(engine.state()));
        assert_eq!(policy.act(&mut engine, &mut rng), None);
    }

    #[test]
    fn test_places_all_bases_without_overlap() {
        let (mut engine, human, policy) = setup(Difficulty::Normal, 2);
        let mut rng = Pcg32::seed_from_u64(2);
        engine.set_ready(human, true);
        assert!(policy.should_act(engine.state()));

        assert_eq!(policy.act(&mut engine, &mut rng), Some(Status::BasePlaced));
        let state = engine.state();
        assert_eq!(state.bases(policy.player_id()).unwrap().len(), 5);
        assert!(state.player(policy.player_id()).unwrap().is_placement_ready());
        assert!(!policy.should_act(state));
        assert_eq!(state.phase(), Phase::Placement);
    }

    #[test]
    fn test_placing_last_starts_battle() {
        let (mut engine, human, policy) = setup(Difficulty::Normal, 3);
        let mut rng = Pcg32::seed_from_u64(3);
        engine.set_ready(human, true);
        place_human(&mut engine, human);

        assert_eq!(policy.act(&mut engine, &mut rng), Some(Status::BattleStarted));
        assert_eq!(engine.state().phase(), Phase::Battle);
    }

    #[test]
    fn test_tops_up_partial_placement() {
        let (mut engine, human, policy) = setup(Difficulty::Easy, 4);
        let mut rng = Pcg32::seed_from_u64(4);
        engine.set_ready(human, true);
        engine.place_base(policy.player_id(), Position::new(0, 0));
        engine.place_base(policy.player_id(), Position::new(0, 1));

        let Some(Decision::PlaceBases(plan)) = policy.decide(engine.state(), &mut rng) else {
            panic!("expected a placement decision");
        };
        assert_eq!(plan.len(), 3);
        assert!(!plan.contains(&Position::new(0, 0)));
        assert!(!plan.contains(&Position::new(0, 1)));
    }

    #[test]
    fn test_shoots_only_on_its_turn() {
        let (mut engine, human, policy) = setup(Difficulty::Easy, 5);
        let mut rng = Pcg32::seed_from_u64(5);
        engine.set_ready(human, true);
        place_human(&mut engine, human);
        policy.act(&mut engine, &mut rng);

        if engine.state().turn_player_id() == Some(human) {
            assert!(!policy.should_act(engine.state()));
            assert_eq!(policy.decide(engine.state(), &mut rng), None);
            engine.shoot(human, ShotType::Normal);
        }
        if engine.state().phase().is_battle() {
            assert!(policy.should_act(engine.state()));
            assert_eq!(
                policy.decide(engine.state(), &mut rng),
                Some(Decision::Shoot(ShotType::Normal))
            );
            let status = policy.act(&mut engine, &mut rng).unwrap();
            assert!(!status.is_rejection());
            assert_eq!(engine.state().last_shooter_id(), Some(policy.player_id()));
        }
    }

    #[test]
    fn test_scripted_match_reaches_the_end() {
        for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            let (mut engine, human, policy) = setup(difficulty, 6);
            let mut rng = Pcg32::seed_from_u64(6);
            let rival = OpponentPolicy::new(human, Difficulty::Hard);
            engine.set_ready(human, true);

            for _ in 0..1000 {
                if engine.state().phase().is_ended() {
                    break;
                }
                let acted = policy.act(&mut engine, &mut rng).is_some()
                    | rival.act(&mut engine, &mut rng).is_some();
                assert!(acted, "nobody could act in {:?}", engine.state().phase());
                if let Some(status) = engine.state().last_status() {
                    assert!(!status.is_rejection(), "{status:?}");
                }
            }
            assert_eq!(engine.state().phase(), Phase::Ended);
            assert!(engine.state().winner_id().is_some());
        }
    }
}
