use blitz_ai::Difficulty;
use blitz_engine::{PlayerId, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RoomCode;

const DEFAULT_NAME: &str = "Player";

fn default_name() -> String {
    DEFAULT_NAME.to_owned()
}

/// Intent sent by a client, one JSON object per message, tagged by `type`.
///
/// Coordinates and identifiers are kept loosely typed here and validated by
/// the [`Hub`](crate::Hub), so malformed values become rule rejections or
/// targeted errors instead of failing the whole message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Authenticate {
        #[serde(default)]
        token: String,
    },
    CreateRoom {
        #[serde(default = "default_name")]
        name: String,
    },
    /// Creates a room against a scripted opponent.
    StartSingle {
        #[serde(default = "default_name")]
        name: String,
        #[serde(default)]
        difficulty: Difficulty,
    },
    JoinRoom {
        #[serde(default = "default_name")]
        name: String,
        #[serde(default)]
        room_code: String,
    },
    Reconnect {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        player_id: String,
    },
    LeaveRoom,
    Ready {
        #[serde(default)]
        ready: bool,
    },
    /// `pos` is expected to be a `[row, col]` pair; any other shape is
    /// rejected as an invalid position.
    PlaceBase {
        #[serde(default)]
        pos: Value,
    },
    BuyBase {
        #[serde(default)]
        pos: Value,
    },
    Shot {
        #[serde(default)]
        shot_type: String,
    },
}

impl ClientMessage {
    /// Parses one line of input.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        player_id: PlayerId,
        room_code: RoomCode,
    },
    RoomState {
        room_code: RoomCode,
        data: Box<Snapshot>,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_intents() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type": "create_room", "name": "Alice"}"#).unwrap(),
            ClientMessage::CreateRoom {
                name: "Alice".to_owned()
            }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type": "leave_room"}"#).unwrap(),
            ClientMessage::LeaveRoom
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type": "place_base", "pos": [1, 4]}"#).unwrap(),
            ClientMessage::PlaceBase {
                pos: serde_json::json!([1, 4])
            }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type": "start_single", "difficulty": "hard"}"#).unwrap(),
            ClientMessage::StartSingle {
                name: "Player".to_owned(),
                difficulty: Difficulty::Hard,
            }
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type": "ready"}"#).unwrap(),
            ClientMessage::Ready { ready: false }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type": "buy_base"}"#).unwrap(),
            ClientMessage::BuyBase { pos: Value::Null }
        );
    }

    #[test]
    fn test_rejects_unknown_or_malformed() {
        assert!(ClientMessage::from_json(r#"{"type": "dance"}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"name": "Alice"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_error_wire_format() {
        let json = ServerMessage::Error {
            message: "room full".to_owned(),
        }
        .to_json()
        .unwrap();
        assert_eq!(json, r#"{"type":"error","message":"room full"}"#);
    }
}
