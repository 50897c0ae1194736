use std::{collections::BTreeMap, str::FromStr};

use blitz_ai::{Difficulty, OpponentPolicy};
use blitz_engine::{MatchConfig, MatchEngine, MatchSeed, PlayerId};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::ServerMessage;

/// Outbound queue of one connection.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Identifies one transport connection for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("conn-{_0}")]
pub struct ConnectionId(pub u64);

/// Short human-typeable room identifier: five characters from `A-Z0-9`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(into = "String", try_from = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub const LEN: usize = 5;
    const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let code = (0..Self::LEN)
            .map(|_| char::from(Self::ALPHABET[rng.random_range(0..Self::ALPHABET.len())]))
            .collect();
        Self(code)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid room code: {_0:?}")]
pub struct ParseRoomCodeError(#[error(not(source))] String);

impl FromStr for RoomCode {
    type Err = ParseRoomCodeError;

    /// Parses a code case-insensitively, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == Self::LEN && code.bytes().all(|b| Self::ALPHABET.contains(&b)) {
            Ok(Self(code))
        } else {
            Err(ParseRoomCodeError(s.to_owned()))
        }
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ParseRoomCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

#[derive(Debug, Clone)]
struct Attachment {
    connection: ConnectionId,
    outbox: Outbox,
}

/// One match instance and the connections watching it.
///
/// A room is always accessed through its own lock (see
/// [`SessionRegistry`](crate::SessionRegistry)); nothing here is
/// synchronized.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    engine: MatchEngine,
    connections: BTreeMap<PlayerId, Attachment>,
    opponent: Option<OpponentPolicy>,
    opponent_rng: Pcg32,
    closed: bool,
}

impl Room {
    pub(crate) fn new(
        code: RoomCode,
        config: MatchConfig,
        seed: MatchSeed,
        opponent_rng: Pcg32,
    ) -> Self {
        Self {
            code,
            engine: MatchEngine::with_seed(config, seed),
            connections: BTreeMap::new(),
            opponent: None,
            opponent_rng,
            closed: false,
        }
    }

    #[must_use]
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    #[must_use]
    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MatchEngine {
        &mut self.engine
    }

    /// Returns `true` once the room was evicted from the registry.
    ///
    /// A handler that looked the room up before eviction must treat it as
    /// gone.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    #[must_use]
    pub fn is_attached(&self, player_id: PlayerId) -> bool {
        self.connections.contains_key(&player_id)
    }

    /// Adds the scripted opponent to the match.
    ///
    /// Returns `None` if the match has no free seat.
    pub fn add_opponent(&mut self, difficulty: Difficulty) -> Option<PlayerId> {
        let id = self.engine.join_scripted("CPU")?;
        self.opponent = Some(OpponentPolicy::new(id, difficulty));
        Some(id)
    }

    /// Routes `player_id`'s updates to `outbox`, replacing any previous
    /// connection of that player.
    pub fn attach(&mut self, player_id: PlayerId, connection: ConnectionId, outbox: Outbox) {
        self.connections.insert(player_id, Attachment { connection, outbox });
    }

    /// Returns `true` if `player_id` is currently driven by `connection`.
    ///
    /// A connection replaced by a reconnect no longer owns its player.
    #[must_use]
    pub fn is_owned_by(&self, player_id: PlayerId, connection: ConnectionId) -> bool {
        self.connections
            .get(&player_id)
            .is_some_and(|a| a.connection == connection)
    }

    /// Detaches `player_id` if it is still attached through `connection`.
    ///
    /// A stale connection detaches nothing.
    pub fn detach(&mut self, player_id: PlayerId, connection: ConnectionId) -> bool {
        let owned = self.is_owned_by(player_id, connection);
        if owned {
            self.connections.remove(&player_id);
        }
        owned
    }

    /// Lets the scripted opponent act until it has nothing left to do.
    ///
    /// Returns the number of actions taken.
    pub fn run_opponent(&mut self) -> usize {
        let Some(policy) = self.opponent else {
            return 0;
        };
        let mut actions = 0;
        // Each action either finishes placement or passes the turn, so this
        // settles after a couple of rounds.
        while policy.should_act(self.engine.state()) {
            let Some(status) = policy.act(&mut self.engine, &mut self.opponent_rng) else {
                break;
            };
            actions += 1;
            if status.is_rejection() {
                tracing::warn!(room = %self.code, %status, "scripted opponent was rejected");
                break;
            }
        }
        actions
    }

    /// Queues a full snapshot on every attached connection.
    ///
    /// Closed outboxes are skipped; their transport task detaches them.
    pub fn broadcast(&self) {
        let message = ServerMessage::RoomState {
            room_code: self.code.clone(),
            data: Box::new(self.engine.snapshot()),
        };
        for (player_id, attachment) in &self.connections {
            if attachment.outbox.send(message.clone()).is_err() {
                tracing::debug!(room = %self.code, player = %player_id, "outbox closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use blitz_engine::Phase;
    use rand::SeedableRng as _;

    use super::*;

    fn room(seed: u64) -> Room {
        let mut rng = Pcg32::seed_from_u64(seed);
        let code = RoomCode::random(&mut rng);
        Room::new(code, MatchConfig::default(), rng.random(), Pcg32::from_rng(&mut rng))
    }

    mod room_code {
        use super::*;

        #[test]
        fn test_random_codes_are_well_formed() {
            let mut rng = Pcg32::seed_from_u64(1);
            for _ in 0..100 {
                let code = RoomCode::random(&mut rng);
                assert_eq!(code.as_str().len(), RoomCode::LEN);
                assert_eq!(code.as_str().parse::<RoomCode>().unwrap(), code);
            }
        }

        #[test]
        fn test_parse_upper_cases() {
            let code: RoomCode = " ab1cd ".parse().unwrap();
            assert_eq!(code.as_str(), "AB1CD");
            assert!("ABCD".parse::<RoomCode>().is_err());
            assert!("ABCDEF".parse::<RoomCode>().is_err());
            assert!("AB-CD".parse::<RoomCode>().is_err());
        }

        #[test]
        fn test_serde_validates() {
            let code: RoomCode = serde_json::from_str("\"xyz12\"").unwrap();
            assert_eq!(serde_json::to_string(&code).unwrap(), "\"XYZ12\"");
            assert!(serde_json::from_str::<RoomCode>("\"nope\"").is_err());
        }
    }

    #[test]
    fn test_stale_connection_does_not_detach() {
        let mut room = room(2);
        let player = room.engine_mut().join("A").unwrap();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, _new_rx) = mpsc::unbounded_channel();

        room.attach(player, ConnectionId(1), old_tx);
        room.attach(player, ConnectionId(2), new_tx);
        assert!(!room.is_owned_by(player, ConnectionId(1)));
        assert!(room.is_owned_by(player, ConnectionId(2)));
        assert!(!room.detach(player, ConnectionId(1)));
        assert!(room.is_attached(player));
        assert!(room.detach(player, ConnectionId(2)));
        assert!(room.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_every_connection() {
        let mut room = room(3);
        let a = room.engine_mut().join("A").unwrap();
        let b = room.engine_mut().join("B").unwrap();
        let (a_tx, mut a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        room.attach(a, ConnectionId(1), a_tx);
        room.attach(b, ConnectionId(2), b_tx);

        room.broadcast();
        for rx in [&mut a_rx, &mut b_rx] {
            let Ok(ServerMessage::RoomState { room_code, data }) = rx.try_recv() else {
                panic!("expected a room state");
            };
            assert_eq!(&room_code, room.code());
            assert_eq!(data.players.len(), 2);
        }
    }

    #[test]
    fn test_opponent_places_as_soon_as_placement_starts() {
        let mut room = room(4);
        let human = room.engine_mut().join("A").unwrap();
        let cpu = room.add_opponent(Difficulty::Hard).unwrap();
        assert_eq!(room.run_opponent(), 0);

        room.engine_mut().set_ready(human, true);
        assert_eq!(room.run_opponent(), 1);
        let state = room.engine().state();
        assert_eq!(state.phase(), Phase::Placement);
        assert!(state.player(cpu).unwrap().is_placement_ready());
        assert!(room.add_opponent(Difficulty::Easy).is_none());
    }
}
