use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seed for deterministic matches.
///
/// A 128-bit (16-byte) seed for the random source owned by a
/// [`MatchEngine`](crate::MatchEngine). Using the same seed and the same
/// sequence of operations replays a match exactly: first turn, shot targets
/// and player ids all derive from it.
///
/// # Example
///
/// ```
/// use blitz_engine::{MatchConfig, MatchEngine, MatchSeed};
/// use rand::Rng as _;
///
/// let seed: MatchSeed = rand::rng().random();
///
/// let mut first = MatchEngine::with_seed(MatchConfig::default(), seed);
/// let mut second = MatchEngine::with_seed(MatchConfig::default(), seed);
/// assert_eq!(first.join("A"), second.join("A"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSeed([u8; 16]);

impl MatchSeed {
    /// Expands a 64-bit number into a seed, for command-line use.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Pcg32::seed_from_u64(value).random()
    }

    pub(crate) fn rng(self) -> Pcg32 {
        Pcg32::from_seed(self.0)
    }
}

impl Serialize for MatchSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        serializer.serialize_str(&format!("{num:032x}"))
    }
}

impl<'de> Deserialize<'de> for MatchSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<MatchSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> MatchSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        MatchSeed(seed)
    }
}
