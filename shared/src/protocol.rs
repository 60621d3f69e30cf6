//! Typed client and server messages on top of the packet codec.
//!
//! Inbound packets are turned into a closed [`ClientMessage`] enum so the
//! server handles every message kind exhaustively. Outbound messages are
//! encoded through [`ServerMessage::encode`].

use crate::codec::{Packet, PacketCodec, PacketError};
use crate::entities::{Inventory, MobKind, ResourceKind, StructureKind, Weapon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire type identifiers.
pub mod kinds {
    pub const INPUT: &str = "i";
    pub const ATTACK: &str = "a";
    pub const CHAT: &str = "c";
    pub const BUILD: &str = "b";
    pub const CRAFT: &str = "cr";

    pub const INIT: &str = "I";
    pub const STATE: &str = "S";
    pub const INVENTORY: &str = "V";
}

#[derive(Debug, Error, PartialEq)]
pub enum MessageError {
    #[error("unknown message type '{0}'")]
    UnknownKind(String),
    #[error("bad payload for '{kind}': {reason}")]
    BadPayload { kind: &'static str, reason: String },
}

/// Held movement keys. Missing keys count as released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildRequest {
    structure_type: String,
    x: f32,
    y: f32,
}

/// Client intents, one variant per inbound message kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Input(MoveKeys),
    Attack,
    Chat { text: String },
    Build { kind: StructureKind, x: f32, y: f32 },
    Craft { recipe: String },
}

impl TryFrom<Packet> for ClientMessage {
    type Error = MessageError;

    fn try_from(packet: Packet) -> Result<Self, Self::Error> {
        let Packet { kind, payload } = packet;
        let mut items = payload.into_iter();

        match kind.as_str() {
            kinds::INPUT => {
                let value = items.next().ok_or_else(|| missing(kinds::INPUT))?;
                let keys = rmpv::ext::from_value(value).map_err(|e| bad(kinds::INPUT, e))?;
                Ok(ClientMessage::Input(keys))
            }
            kinds::ATTACK => Ok(ClientMessage::Attack),
            kinds::CHAT => {
                let text = items
                    .next()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or_else(|| missing(kinds::CHAT))?;
                Ok(ClientMessage::Chat { text })
            }
            kinds::BUILD => {
                let value = items.next().ok_or_else(|| missing(kinds::BUILD))?;
                let request: BuildRequest =
                    rmpv::ext::from_value(value).map_err(|e| bad(kinds::BUILD, e))?;
                let kind = StructureKind::from_name(&request.structure_type).ok_or_else(|| {
                    MessageError::BadPayload {
                        kind: kinds::BUILD,
                        reason: format!("unknown structure type '{}'", request.structure_type),
                    }
                })?;
                Ok(ClientMessage::Build {
                    kind,
                    x: request.x,
                    y: request.y,
                })
            }
            kinds::CRAFT => {
                let recipe = items
                    .next()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or_else(|| missing(kinds::CRAFT))?;
                Ok(ClientMessage::Craft { recipe })
            }
            _ => Err(MessageError::UnknownKind(kind)),
        }
    }
}

fn missing(kind: &'static str) -> MessageError {
    MessageError::BadPayload {
        kind,
        reason: "missing or mistyped payload item".to_string(),
    }
}

fn bad(kind: &'static str, err: rmpv::ext::Error) -> MessageError {
    MessageError::BadPayload {
        kind,
        reason: err.to_string(),
    }
}

/// Public view of a player. Inventories are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub hp: u32,
    pub max_hp: u32,
    pub name: String,
    pub color: String,
    pub weapon: Weapon,
    pub chat: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobView {
    pub id: u32,
    pub kind: MobKind,
    pub x: f32,
    pub y: f32,
    pub hp: u32,
    pub max_hp: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    pub id: u32,
    pub kind: ResourceKind,
    pub x: f32,
    pub y: f32,
    pub hp: u32,
    pub max_hp: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureView {
    pub id: u32,
    pub kind: StructureKind,
    pub x: f32,
    pub y: f32,
    pub hp: u32,
    pub max_hp: u32,
    pub owner_id: u32,
}

/// Full public world state, broadcast once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub players: Vec<PlayerView>,
    pub mobs: Vec<MobView>,
    pub resources: Vec<ResourceView>,
    pub structures: Vec<StructureView>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Sent once per connection with the id of the player it controls.
    Init { id: u32 },
    State(Snapshot),
    /// Private inventory update for the receiving player.
    Inventory(Inventory),
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Init { .. } => kinds::INIT,
            ServerMessage::State(_) => kinds::STATE,
            ServerMessage::Inventory(_) => kinds::INVENTORY,
        }
    }

    pub fn encode(&self, codec: &PacketCodec) -> Result<Vec<u8>, PacketError> {
        match self {
            ServerMessage::Init { id } => codec.encode(self.kind(), &[*id]),
            ServerMessage::State(snapshot) => codec.encode(self.kind(), std::slice::from_ref(snapshot)),
            ServerMessage::Inventory(inventory) => {
                codec.encode(self.kind(), std::slice::from_ref(inventory))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Frame;
    use rmpv::Value;

    fn packet(kind: &str, payload: Vec<Value>) -> Packet {
        Packet {
            kind: kind.to_string(),
            payload,
        }
    }

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (Value::from(k), v)).collect())
    }

    #[test]
    fn test_parse_input() {
        let keys = map(vec![
            ("up", Value::Boolean(true)),
            ("down", Value::Boolean(false)),
            ("left", Value::Boolean(true)),
        ]);
        let msg = ClientMessage::try_from(packet("i", vec![keys])).unwrap();

        assert_eq!(
            msg,
            ClientMessage::Input(MoveKeys {
                up: true,
                down: false,
                left: true,
                right: false,
            })
        );
    }

    #[test]
    fn test_parse_attack_ignores_payload() {
        let msg = ClientMessage::try_from(packet("a", vec![Value::from(1)])).unwrap();
        assert_eq!(msg, ClientMessage::Attack);
    }

    #[test]
    fn test_parse_chat() {
        let msg = ClientMessage::try_from(packet("c", vec![Value::from("hi all")])).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Chat {
                text: "hi all".to_string()
            }
        );

        let err = ClientMessage::try_from(packet("c", vec![Value::from(3)])).unwrap_err();
        assert!(matches!(err, MessageError::BadPayload { kind: "c", .. }));
    }

    #[test]
    fn test_parse_build_accepts_integer_coordinates() {
        let request = map(vec![
            ("structureType", Value::from("wall")),
            ("x", Value::from(120)),
            ("y", Value::from(-40.5)),
        ]);
        let msg = ClientMessage::try_from(packet("b", vec![request])).unwrap();

        assert_eq!(
            msg,
            ClientMessage::Build {
                kind: StructureKind::Wall,
                x: 120.0,
                y: -40.5,
            }
        );
    }

    #[test]
    fn test_parse_build_unknown_structure() {
        let request = map(vec![
            ("structureType", Value::from("tower")),
            ("x", Value::from(0)),
            ("y", Value::from(0)),
        ]);
        let err = ClientMessage::try_from(packet("b", vec![request])).unwrap_err();
        assert!(matches!(err, MessageError::BadPayload { kind: "b", .. }));
    }

    #[test]
    fn test_parse_craft() {
        let msg = ClientMessage::try_from(packet("cr", vec![Value::from("wood_sword")])).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Craft {
                recipe: "wood_sword".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_kind() {
        let err = ClientMessage::try_from(packet("zz", vec![])).unwrap_err();
        assert_eq!(err, MessageError::UnknownKind("zz".to_string()));
    }

    #[test]
    fn test_client_message_through_codec() {
        let codec = PacketCodec::default();
        let bytes = codec.encode("cr", &["stone_sword"]).unwrap();
        let packet = codec.decode(Frame::Binary(&bytes)).unwrap();

        assert_eq!(
            ClientMessage::try_from(packet).unwrap(),
            ClientMessage::Craft {
                recipe: "stone_sword".to_string()
            }
        );
    }

    #[test]
    fn test_encode_init() {
        let codec = PacketCodec::default();
        let bytes = ServerMessage::Init { id: 7 }.encode(&codec).unwrap();
        let packet = codec.decode(Frame::Binary(&bytes)).unwrap();

        assert_eq!(packet.kind, "I");
        assert_eq!(packet.payload, vec![Value::from(7)]);
    }

    #[test]
    fn test_encode_state_uses_named_fields() {
        let codec = PacketCodec::new(usize::MAX);
        let snapshot = Snapshot {
            tick: 3,
            players: vec![PlayerView {
                id: 1,
                x: 10.0,
                y: -5.0,
                hp: 100,
                max_hp: 100,
                name: "Player 1".to_string(),
                color: "#ff0000".to_string(),
                weapon: Weapon::WoodSword,
                chat: None,
                team: None,
            }],
            ..Snapshot::default()
        };

        let bytes = ServerMessage::State(snapshot).encode(&codec).unwrap();
        let packet = codec.decode(Frame::Binary(&bytes)).unwrap();
        assert_eq!(packet.kind, "S");

        let players = packet.payload[0]
            .as_map()
            .and_then(|m| m.iter().find(|(k, _)| k.as_str() == Some("players")))
            .and_then(|(_, v)| v.as_array())
            .unwrap();
        let player = players[0].as_map().unwrap();
        let field = |name: &str| {
            player
                .iter()
                .find(|(k, _)| k.as_str() == Some(name))
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(field("maxHp"), Value::from(100));
        assert_eq!(field("weapon"), Value::from("wood_sword"));
        assert_eq!(field("chat"), Value::Nil);
    }
}
