use std::sync::atomic::{AtomicU64, Ordering};

use blitz_ai::Difficulty;
use blitz_engine::{Grid, PlayerId, Position, ShotType, Status};
use serde_json::Value;
use tokio::sync::MutexGuard;

use crate::{
    ClientMessage, ConnectionId, HubError, Identity, Outbox, ProtocolError, Room, RoomCode,
    ServerMessage, SessionRegistry, SharedRoom, TokenVerifier,
};

/// The player a connection currently controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
}

/// Per-connection state, owned by the transport task of that connection.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbox: Outbox,
    identity: Option<Identity>,
    seat: Option<Seat>,
}

impl Connection {
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn seat(&self) -> Option<&Seat> {
        self.seat.as_ref()
    }

    fn send(&self, message: ServerMessage) {
        if self.outbox.send(message).is_err() {
            tracing::debug!(connection = %self.id, "outbox closed");
        }
    }
}

#[derive(Debug, derive_more::From)]
enum DispatchError {
    Protocol(ProtocolError),
    Fatal(HubError),
}

type DispatchResult = Result<(), DispatchError>;

/// Single entry point for client intents.
///
/// Each call handles one intent under the lock of the room it targets:
/// resolve the room, apply one engine operation, let the scripted opponent
/// respond, then queue the resulting snapshot on every attached connection.
/// Rule violations are carried by the snapshot's status message; protocol
/// errors go to the offending connection only.
pub struct Hub {
    registry: SessionRegistry,
    verifier: Box<dyn TokenVerifier>,
    next_connection: AtomicU64,
}

impl Hub {
    pub fn new<V>(registry: SessionRegistry, verifier: V) -> Self
    where
        V: TokenVerifier + 'static,
    {
        Self {
            registry,
            verifier: Box::new(verifier),
            next_connection: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Registers a new transport connection whose messages go to `outbox`.
    pub fn connect(&self, outbox: Outbox) -> Connection {
        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(connection = %id, "connection opened");
        Connection {
            id,
            outbox,
            identity: None,
            seat: None,
        }
    }

    /// Parses and handles one line of input.
    pub async fn handle_line(&self, conn: &mut Connection, line: &str) -> Result<(), HubError> {
        match ClientMessage::from_json(line) {
            Ok(message) => self.handle(conn, message).await,
            Err(err) => {
                tracing::debug!(connection = %conn.id, error = %err, "unparsable message");
                conn.send(error_message(&ProtocolError::InvalidMessage));
                Ok(())
            }
        }
    }

    /// Handles one intent.
    ///
    /// Only fatal errors are returned; the caller should close the
    /// connection (after calling [`Self::disconnect`]).
    pub async fn handle(
        &self,
        conn: &mut Connection,
        message: ClientMessage,
    ) -> Result<(), HubError> {
        match self.dispatch(conn, message).await {
            Ok(()) => Ok(()),
            Err(DispatchError::Protocol(err)) => {
                tracing::debug!(connection = %conn.id, error = %err, "intent refused");
                conn.send(error_message(&err));
                Ok(())
            }
            Err(DispatchError::Fatal(err)) => Err(err),
        }
    }

    async fn dispatch(&self, conn: &mut Connection, message: ClientMessage) -> DispatchResult {
        match message {
            ClientMessage::Authenticate { token } => self.authenticate(conn, &token),
            _ if conn.identity.is_none() => Err(ProtocolError::NotAuthenticated.into()),
            ClientMessage::CreateRoom { name } => self.create_room(conn, &name, None).await,
            ClientMessage::StartSingle { name, difficulty } => {
                self.create_room(conn, &name, Some(difficulty)).await
            }
            ClientMessage::JoinRoom { name, room_code } => {
                self.join_room(conn, &name, &room_code).await
            }
            ClientMessage::Reconnect {
                room_code,
                player_id,
            } => self.reconnect(conn, &room_code, &player_id).await,
            ClientMessage::LeaveRoom => self.leave_room(conn).await,
            ClientMessage::Ready { ready } => {
                self.apply(conn, |room, id| room.engine_mut().set_ready(id, ready))
                    .await
            }
            ClientMessage::PlaceBase { pos } => {
                self.apply(conn, |room, id| {
                    match wire_position(room.engine().state().grid(), &pos) {
                        Some(pos) => room.engine_mut().place_base(id, pos),
                        None => room.engine_mut().reject(Status::InvalidPosition),
                    }
                })
                .await
            }
            ClientMessage::BuyBase { pos } => {
                self.apply(conn, |room, id| {
                    match wire_position(room.engine().state().grid(), &pos) {
                        Some(pos) => room.engine_mut().buy_base(id, pos),
                        None => room.engine_mut().reject(Status::InvalidPosition),
                    }
                })
                .await
            }
            ClientMessage::Shot { shot_type } => {
                self.apply(conn, |room, id| match shot_type.parse::<ShotType>() {
                    Ok(shot) => room.engine_mut().shoot(id, shot),
                    Err(_) => room.engine_mut().reject(Status::InvalidShotType),
                })
                .await
            }
        }
    }

    fn authenticate(&self, conn: &mut Connection, token: &str) -> DispatchResult {
        let identity = self.verifier.verify(token).map_err(ProtocolError::from)?;
        tracing::info!(connection = %conn.id, uid = %identity, "authenticated");
        conn.identity = Some(identity);
        Ok(())
    }

    async fn create_room(
        &self,
        conn: &mut Connection,
        name: &str,
        opponent: Option<Difficulty>,
    ) -> DispatchResult {
        if conn.seat.is_some() {
            return Err(ProtocolError::AlreadyInRoom.into());
        }
        let (code, shared) = self.registry.create()?;
        let mut room = shared.lock().await;
        let Some(player_id) = room.engine_mut().join(name) else {
            room.close();
            self.registry.remove(&code)?;
            return Err(ProtocolError::RoomFull.into());
        };
        if let Some(difficulty) = opponent {
            room.add_opponent(difficulty);
            tracing::info!(room = %code, %difficulty, "scripted opponent added");
        }
        seat_player(conn, &mut room, player_id);
        room.run_opponent();
        room.broadcast();
        Ok(())
    }

    async fn join_room(
        &self,
        conn: &mut Connection,
        name: &str,
        room_code: &str,
    ) -> DispatchResult {
        if conn.seat.is_some() {
            return Err(ProtocolError::AlreadyInRoom.into());
        }
        let code = room_code
            .parse::<RoomCode>()
            .map_err(|_| ProtocolError::RoomNotFound)?;
        let shared = self.find(&code)?.ok_or(ProtocolError::RoomNotFound)?;
        let mut room = lock_open(&shared).await.ok_or(ProtocolError::RoomNotFound)?;
        if room.engine().state().is_full() {
            return Err(ProtocolError::RoomFull.into());
        }
        let player_id = room
            .engine_mut()
            .join(name)
            .ok_or(ProtocolError::RoomFull)?;
        seat_player(conn, &mut room, player_id);
        room.run_opponent();
        room.broadcast();
        Ok(())
    }

    async fn reconnect(
        &self,
        conn: &mut Connection,
        room_code: &str,
        player_id: &str,
    ) -> DispatchResult {
        if conn.seat.is_some() {
            return Err(ProtocolError::AlreadyInRoom.into());
        }
        let (Ok(code), Ok(player_id)) = (
            room_code.parse::<RoomCode>(),
            player_id.parse::<PlayerId>(),
        ) else {
            return Err(ProtocolError::InvalidReconnect.into());
        };
        let shared = self.find(&code)?.ok_or(ProtocolError::InvalidReconnect)?;
        let mut room = lock_open(&shared)
            .await
            .ok_or(ProtocolError::InvalidReconnect)?;
        let known = room
            .engine()
            .state()
            .player(player_id)
            .is_some_and(|player| !player.is_scripted());
        if !known {
            return Err(ProtocolError::InvalidReconnect.into());
        }
        seat_player(conn, &mut room, player_id);
        room.engine_mut().reconnect(player_id);
        room.broadcast();
        Ok(())
    }

    /// Forfeits the match and gives up the seat.
    ///
    /// Leaving without a seat is a no-op. A connection whose player was taken
    /// over by a reconnect only loses its seat.
    async fn leave_room(&self, conn: &mut Connection) -> DispatchResult {
        let Some(seat) = conn.seat.take() else {
            return Ok(());
        };
        let Some(shared) = self.find(&seat.room_code)? else {
            return Ok(());
        };
        let Some(mut room) = lock_open(&shared).await else {
            return Ok(());
        };
        if !room.is_owned_by(seat.player_id, conn.id) {
            return Err(ProtocolError::NotInRoom.into());
        }
        room.engine_mut().forfeit(seat.player_id);
        room.detach(seat.player_id, conn.id);
        tracing::info!(room = %seat.room_code, player = %seat.player_id, "player left");
        room.broadcast();
        self.evict_if_empty(&mut room)?;
        Ok(())
    }

    /// Handles the loss of a connection's transport.
    ///
    /// The player keeps its seat in the match and may `reconnect`; the room
    /// is evicted if no connection is left.
    pub async fn disconnect(&self, conn: &mut Connection) -> Result<(), HubError> {
        tracing::debug!(connection = %conn.id, "connection closed");
        let Some(seat) = conn.seat.take() else {
            return Ok(());
        };
        let Some(shared) = self.registry.get(&seat.room_code)? else {
            return Ok(());
        };
        let Some(mut room) = lock_open(&shared).await else {
            return Ok(());
        };
        if room.detach(seat.player_id, conn.id) {
            room.engine_mut().disconnect(seat.player_id);
            tracing::info!(room = %seat.room_code, player = %seat.player_id, "player disconnected");
            room.broadcast();
        }
        self.evict_if_empty(&mut room)
    }

    /// Runs `op` for the connection's player under the room lock.
    ///
    /// A connection whose player was taken over by a reconnect loses its seat
    /// instead.
    async fn apply<F>(&self, conn: &mut Connection, op: F) -> DispatchResult
    where
        F: FnOnce(&mut Room, PlayerId) -> Status,
    {
        let seat = conn.seat.clone().ok_or(ProtocolError::NotInRoom)?;
        let shared = self
            .find(&seat.room_code)?
            .ok_or(ProtocolError::RoomNotFound)?;
        let mut room = lock_open(&shared).await.ok_or(ProtocolError::RoomNotFound)?;
        if !room.is_owned_by(seat.player_id, conn.id) {
            tracing::debug!(connection = %conn.id, player = %seat.player_id, "seat taken over");
            conn.seat = None;
            return Err(ProtocolError::NotInRoom.into());
        }
        let status = op(&mut *room, seat.player_id);
        tracing::debug!(
            room = %seat.room_code,
            player = %seat.player_id,
            %status,
            "intent applied"
        );
        room.run_opponent();
        room.broadcast();
        Ok(())
    }

    fn find(&self, code: &RoomCode) -> Result<Option<SharedRoom>, HubError> {
        self.registry.get(code)
    }

    fn evict_if_empty(&self, room: &mut Room) -> Result<(), HubError> {
        if room.is_empty() {
            room.close();
            self.registry.remove(room.code())?;
        }
        Ok(())
    }
}

/// Attaches the connection to `player_id` and confirms with `joined`.
fn seat_player(conn: &mut Connection, room: &mut Room, player_id: PlayerId) {
    room.attach(player_id, conn.id, conn.outbox.clone());
    let room_code = room.code().clone();
    tracing::info!(
        room = %room_code,
        player = %player_id,
        connection = %conn.id,
        "player seated"
    );
    conn.send(ServerMessage::Joined {
        player_id,
        room_code: room_code.clone(),
    });
    conn.seat = Some(Seat {
        room_code,
        player_id,
    });
}

/// Locks a room, or returns `None` if it was evicted meanwhile.
async fn lock_open(shared: &SharedRoom) -> Option<MutexGuard<'_, Room>> {
    let room = shared.lock().await;
    (!room.is_closed()).then_some(room)
}

/// Reads a `[row, col]` pair of integers that lies on `grid`.
fn wire_position(grid: Grid, pos: &Value) -> Option<Position> {
    match pos.as_array()?.as_slice() {
        [row, col] => grid.position(row.as_i64()?, col.as_i64()?),
        _ => None,
    }
}

fn error_message(err: &ProtocolError) -> ServerMessage {
    ServerMessage::Error {
        message: err.to_string(),
    }
}
