/// Outcome of a [`MatchEngine`](crate::MatchEngine) operation.
///
/// Every operation reports a status instead of failing. The status is also
/// recorded as the match's last message, so it reaches every client on the
/// next broadcast. Callers branch on the variant; the `Display` form is the
/// text shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::IsVariant)]
pub enum Status {
    #[display("room created, waiting for another player")]
    RoomCreated,
    #[display("two players connected, mark ready")]
    WaitingForReady,
    #[display("room full")]
    RoomFull,
    #[display("ready updated")]
    ReadyUpdated,
    #[display("players ready, place your bases")]
    PlayersReady,
    #[display("base placed")]
    BasePlaced,
    #[display("match started")]
    BattleStarted,
    #[display("base purchased")]
    BasePurchased,
    #[display("shot fired")]
    ShotFired,
    #[display("match over")]
    MatchOver,
    #[display("opponent forfeited")]
    OpponentForfeited,
    #[display("opponent disconnected")]
    OpponentDisconnected,
    #[display("opponent reconnected")]
    OpponentReconnected,

    #[display("ready can not be changed now")]
    NotInLobby,
    #[display("match is not in placement phase")]
    NotInPlacement,
    #[display("match must be in progress")]
    NotInBattle,
    #[display("not your turn")]
    NotYourTurn,
    #[display("insufficient balance")]
    InsufficientBalance,
    #[display("position occupied")]
    PositionOccupied,
    #[display("base limit reached")]
    BaseLimitReached,
    #[display("invalid position")]
    InvalidPosition,
    #[display("invalid player")]
    InvalidPlayer,
    #[display("invalid shot type")]
    InvalidShotType,
}

impl Status {
    /// Returns `true` if the operation was refused by the match rules.
    ///
    /// A rejected operation changed nothing except the recorded status.
    #[must_use]
    pub const fn is_rejection(self) -> bool {
        matches!(
            self,
            Self::RoomFull
                | Self::NotInLobby
                | Self::NotInPlacement
                | Self::NotInBattle
                | Self::NotYourTurn
                | Self::InsufficientBalance
                | Self::PositionOccupied
                | Self::BaseLimitReached
                | Self::InvalidPosition
                | Self::InvalidPlayer
                | Self::InvalidShotType
        )
    }
}
