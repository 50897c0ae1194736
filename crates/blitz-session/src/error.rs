use crate::AuthError;

/// Errors reported back to the offending connection as an `error` message.
///
/// They never touch room state.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum ProtocolError {
    #[display("invalid message")]
    InvalidMessage,
    #[display("not authenticated")]
    NotAuthenticated,
    #[display("authentication failed: {_0}")]
    #[from]
    Auth(AuthError),
    #[display("already in a room")]
    AlreadyInRoom,
    #[display("not in room")]
    NotInRoom,
    #[display("room not found")]
    RoomNotFound,
    #[display("room full")]
    RoomFull,
    #[display("invalid reconnect")]
    InvalidReconnect,
}

/// Failures the hub cannot recover from; the transport closes the connection.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum HubError {
    #[display("session registry lock poisoned")]
    LockPoisoned,
}
