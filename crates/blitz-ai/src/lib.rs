//! Scripted opponent for cannon blitz matches.
//!
//! The opponent is not a scheduled actor. The caller re-invokes
//! [`OpponentPolicy::act`] after every human-triggered mutation, under the
//! same exclusive access to the match, and the policy drives the
//! [`MatchEngine`](blitz_engine::MatchEngine) exactly as a remote player would.

pub use self::{policy::*, shot_choice::*};

mod policy;
mod shot_choice;

use serde::{Deserialize, Serialize};

/// Difficulty tier of the scripted opponent.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Always fires free normal shots.
    #[display("easy")]
    Easy,
    /// Mixes in precise shots at random when it can afford them.
    #[default]
    #[display("normal")]
    Normal,
    /// Spends its balance on the strongest affordable shot.
    #[display("hard")]
    Hard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("brutal".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Normal);
    }

    #[test]
    fn test_difficulty_wire_name() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "\"hard\"");
        assert_eq!(Difficulty::Easy.to_string(), "easy");
    }
}
