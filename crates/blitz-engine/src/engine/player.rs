use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier of a player within a match.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Creates a random-version UUID from the given random source.
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self(uuid::Builder::from_random_bytes(rng.random()).into_uuid())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// A participant in a match.
///
/// Owned by [`MatchState`](crate::MatchState) and only mutated through
/// [`MatchEngine`](crate::MatchEngine) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) balance: u32,
    pub(crate) ready: bool,
    pub(crate) placement_ready: bool,
    pub(crate) connected: bool,
    pub(crate) scripted: bool,
}

impl Player {
    pub(crate) fn new(id: PlayerId, name: &str, scripted: bool) -> Self {
        Self {
            id,
            name: name.to_owned(),
            balance: 0,
            ready: scripted,
            placement_ready: false,
            connected: true,
            scripted,
        }
    }

    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// In-match currency earned by destroying bases.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.balance
    }

    /// Lobby ready flag.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Set once the player has placed the maximum number of bases.
    #[must_use]
    pub const fn is_placement_ready(&self) -> bool {
        self.placement_ready
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether this player is driven by the scripted opponent.
    #[must_use]
    pub const fn is_scripted(&self) -> bool {
        self.scripted
    }

    /// Debits `amount` if the balance covers it.
    pub(crate) fn try_spend(&mut self, amount: u32) -> bool {
        match self.balance.checked_sub(amount) {
            Some(rest) => {
                self.balance = rest;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_try_spend_never_goes_negative() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut player = Player::new(PlayerId::random(&mut rng), "A", false);
        assert!(!player.try_spend(1));
        player.balance = 3;
        assert!(player.try_spend(2));
        assert_eq!(player.balance(), 1);
        assert!(!player.try_spend(2));
        assert_eq!(player.balance(), 1);
    }

    #[test]
    fn test_player_ids_are_unique_and_seeded() {
        let mut a = Pcg32::seed_from_u64(9);
        let mut b = Pcg32::seed_from_u64(9);
        let first = PlayerId::random(&mut a);
        assert_eq!(first, PlayerId::random(&mut b));
        assert_ne!(first, PlayerId::random(&mut a));
        assert_eq!(first.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_player_id_parses_its_display() {
        let mut rng = Pcg32::seed_from_u64(3);
        let id = PlayerId::random(&mut rng);
        assert_eq!(id.to_string().parse::<PlayerId>().unwrap(), id);
        assert!("not-a-uuid".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_scripted_player_starts_ready() {
        let mut rng = Pcg32::seed_from_u64(2);
        let player = Player::new(PlayerId::random(&mut rng), "CPU", true);
        assert!(player.is_ready());
        assert!(player.is_scripted());
        assert!(player.is_connected());
    }
}
