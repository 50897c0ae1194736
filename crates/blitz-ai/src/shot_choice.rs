use blitz_engine::ShotType;
use rand::Rng;

use crate::Difficulty;

/// Picks the shot type for the scripted opponent.
///
/// - `Easy`: always [`ShotType::Normal`]
/// - `Hard`: [`ShotType::Strong`] when affordable, else [`ShotType::Precise`],
///   else [`ShotType::Normal`]
/// - `Normal`: [`ShotType::Precise`] half of the time when affordable,
///   otherwise [`ShotType::Normal`]
///
/// The returned shot is always affordable with `balance`.
pub fn choose_shot<R>(difficulty: Difficulty, balance: u32, rng: &mut R) -> ShotType
where
    R: Rng + ?Sized,
{
    match difficulty {
        Difficulty::Easy => ShotType::Normal,
        Difficulty::Hard => [ShotType::Strong, ShotType::Precise]
            .into_iter()
            .find(|shot| balance >= shot.cost())
            .unwrap_or(ShotType::Normal),
        Difficulty::Normal => {
            if balance >= ShotType::Precise.cost() && rng.random_bool(0.5) {
                ShotType::Precise
            } else {
                ShotType::Normal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_easy_never_spends() {
        let mut rng = Pcg32::seed_from_u64(0);
        for balance in 0..10 {
            assert_eq!(choose_shot(Difficulty::Easy, balance, &mut rng), ShotType::Normal);
        }
    }

    #[test]
    fn test_hard_table() {
        let mut rng = Pcg32::seed_from_u64(0);
        let expected = [
            (0, ShotType::Normal),
            (1, ShotType::Precise),
            (2, ShotType::Precise),
            (3, ShotType::Strong),
            (7, ShotType::Strong),
        ];
        for (balance, shot) in expected {
            assert_eq!(choose_shot(Difficulty::Hard, balance, &mut rng), shot, "{balance}");
        }
    }

    #[test]
    fn test_normal_mixes_precise_only_when_affordable() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(choose_shot(Difficulty::Normal, 0, &mut rng), ShotType::Normal);
        }

        let picks: Vec<_> = (0..200)
            .map(|_| choose_shot(Difficulty::Normal, 5, &mut rng))
            .collect();
        assert!(picks.contains(&ShotType::Precise));
        assert!(picks.contains(&ShotType::Normal));
        assert!(!picks.contains(&ShotType::Strong));
    }
}
