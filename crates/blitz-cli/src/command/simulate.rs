use std::path::PathBuf;

use blitz_ai::{Difficulty, OpponentPolicy};
use blitz_engine::{MatchConfig, MatchEngine, MatchSeed, PlayerId};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{command::MatchConfigArg, util::Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Number of matches to play
    #[arg(long, default_value_t = 100)]
    games: usize,
    /// Difficulty of the first player
    #[arg(long, default_value = "normal")]
    first: Difficulty,
    /// Difficulty of the second player
    #[arg(long, default_value = "normal")]
    second: Difficulty,
    /// Give up a match after this many shots
    #[arg(long, default_value_t = 500)]
    max_shots: usize,
    /// Seed for reproducible runs
    #[arg(long, env = "BLITZ_SEED")]
    seed: Option<u64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    #[clap(flatten)]
    match_config: MatchConfigArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Side {
    First,
    Second,
}

#[derive(Debug, Clone, Serialize)]
struct MatchRecord {
    seed: MatchSeed,
    winner: Option<Side>,
    shots: usize,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    config: MatchConfig,
    first: Difficulty,
    second: Difficulty,
    first_wins: usize,
    second_wins: usize,
    unfinished: usize,
    mean_shots: f64,
    matches: Vec<MatchRecord>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let config = arg.match_config.to_config()?;
    let mut rng = match arg.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };

    tracing::info!(
        games = arg.games,
        first = %arg.first,
        second = %arg.second,
        "simulating matches"
    );
    let matches = (0..arg.games)
        .map(|_| {
            play_match(
                config,
                [arg.first, arg.second],
                rng.random(),
                &mut Pcg32::from_rng(&mut rng),
                arg.max_shots,
            )
        })
        .collect();
    let report = SimulationReport::new(config, arg.first, arg.second, matches);
    tracing::info!(
        first_wins = report.first_wins,
        second_wins = report.second_wins,
        unfinished = report.unfinished,
        "simulation finished"
    );

    Output::create(arg.output.as_deref())?.write_json(&report)
}

impl SimulationReport {
    fn new(
        config: MatchConfig,
        first: Difficulty,
        second: Difficulty,
        matches: Vec<MatchRecord>,
    ) -> Self {
        let count = |side| matches.iter().filter(|m| m.winner == side).count();
        let total_shots: usize = matches.iter().map(|m| m.shots).sum();
        #[expect(clippy::cast_precision_loss)]
        let mean_shots = if matches.is_empty() {
            0.0
        } else {
            total_shots as f64 / matches.len() as f64
        };
        Self {
            config,
            first,
            second,
            first_wins: count(Some(Side::First)),
            second_wins: count(Some(Side::Second)),
            unfinished: count(None),
            mean_shots,
            matches,
        }
    }
}

/// Plays one scripted-vs-scripted match, letting whichever policy has
/// something to do act until the match ends or the shot cap is hit.
fn play_match(
    config: MatchConfig,
    difficulties: [Difficulty; 2],
    seed: MatchSeed,
    rng: &mut Pcg32,
    max_shots: usize,
) -> MatchRecord {
    let mut engine = MatchEngine::with_seed(config, seed);
    // Both seats are scripted, so the match skips straight to placement.
    let policies: Vec<_> = difficulties
        .into_iter()
        .enumerate()
        .filter_map(|(i, difficulty)| {
            let id = engine.join_scripted(&format!("CPU {}", i + 1))?;
            Some(OpponentPolicy::new(id, difficulty))
        })
        .collect();

    let mut shots = 0;
    while shots < max_shots {
        let Some(policy) = policies.iter().find(|p| p.should_act(engine.state())) else {
            break;
        };
        shots += usize::from(engine.state().phase().is_battle());
        policy.act(&mut engine, rng);
    }

    let winner = engine.state().winner_id().and_then(|id| side_of(&policies, id));
    if winner.is_none() {
        tracing::debug!(?seed, shots, phase = %engine.state().phase(), "match unfinished");
    }
    MatchRecord {
        seed,
        winner,
        shots,
    }
}

fn side_of(policies: &[OpponentPolicy], id: PlayerId) -> Option<Side> {
    match policies.iter().position(|p| p.player_id() == id)? {
        0 => Some(Side::First),
        _ => Some(Side::Second),
    }
}
