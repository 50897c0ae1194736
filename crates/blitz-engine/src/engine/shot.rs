use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Price of buying an extra base during battle.
pub const BASE_PRICE: u32 = 2;

/// The three shot archetypes, trading cost for accuracy or area.
///
/// - `Normal` (free): one random cell from the shooter's shrinking candidate
///   set; misses are eliminated so later shots are more likely to hit
/// - `Precise` (1): half the time a guaranteed hit on an enemy base, otherwise
///   a random empty cell
/// - `Strong` (3): a random 3×3 blast clipped to the grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ShotType {
    #[display("normal")]
    Normal,
    #[display("precise")]
    Precise,
    #[display("strong")]
    Strong,
}

impl ShotType {
    pub const ALL: [Self; 3] = [Self::Normal, Self::Precise, Self::Strong];

    /// Balance debited before the shot is resolved.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Precise => 1,
            Self::Strong => 3,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown shot type: {_0}")]
pub struct ParseShotTypeError(#[error(not(source))] String);

impl FromStr for ShotType {
    type Err = ParseShotTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shot| shot.to_string() == s)
            .ok_or_else(|| ParseShotTypeError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_names() {
        assert_eq!("normal".parse::<ShotType>().unwrap(), ShotType::Normal);
        assert_eq!("precise".parse::<ShotType>().unwrap(), ShotType::Precise);
        assert_eq!("strong".parse::<ShotType>().unwrap(), ShotType::Strong);
        assert!("laser".parse::<ShotType>().is_err());
        assert!("".parse::<ShotType>().is_err());
    }

    #[test]
    fn test_costs() {
        assert_eq!(ShotType::Normal.cost(), 0);
        assert_eq!(ShotType::Precise.cost(), 1);
        assert_eq!(ShotType::Strong.cost(), 3);
    }

    #[test]
    fn test_serde_matches_display() {
        for shot in ShotType::ALL {
            assert_eq!(serde_json::to_string(&shot).unwrap(), format!("\"{shot}\""));
        }
    }
}
