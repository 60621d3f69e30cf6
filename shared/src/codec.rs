//! Binary packet codec for the WebSocket transport.
//!
//! Every frame is a MessagePack array `[type, [payload items...]]`. Inbound
//! frames are validated before and after decoding so that a hostile or broken
//! client can only ever produce a [`PacketError::Invalid`], never a panic or
//! an unbounded amount of decoding work. The codec knows nothing about game
//! semantics; [`crate::protocol`] interprets the decoded packets.

use serde::Serialize;
use thiserror::Error;

/// Default inbound frame budget in bytes.
pub const DEFAULT_MAX_PACKET_BYTES: usize = 2048;
/// Maximum number of payload items in an inbound packet.
pub const MAX_PAYLOAD_ITEMS: usize = 16;
/// Maximum length of a normalized packet type identifier.
pub const MAX_TYPE_LEN: usize = 3;
/// Nesting budget handed to the MessagePack reader. Each container level
/// costs two units; well-formed packets need fewer than ten.
pub const MAX_DECODE_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum PacketError {
    /// The inbound frame violates the protocol. All inbound rejections share
    /// this kind; the reason is only meant for logs.
    #[error("invalid packet: {0}")]
    Invalid(&'static str),
    #[error("failed to encode packet: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// A transport frame as handed over by the WebSocket layer.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Binary(&'a [u8]),
    Text(&'a str),
}

/// A decoded packet: normalized type identifier plus raw payload items.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub kind: String,
    pub payload: Vec<rmpv::Value>,
}

#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_bytes: usize,
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACKET_BYTES)
    }
}

impl PacketCodec {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validates and decodes one inbound frame.
    pub fn decode(&self, frame: Frame<'_>) -> Result<Packet, PacketError> {
        let bytes = match frame {
            Frame::Binary(bytes) => bytes,
            Frame::Text(_) => return Err(PacketError::Invalid("text frames are not supported")),
        };

        // Size is checked before any decoding work happens
        if bytes.is_empty() {
            return Err(PacketError::Invalid("empty packet"));
        }
        if bytes.len() > self.max_bytes {
            return Err(PacketError::Invalid("packet exceeds maximum size"));
        }

        let mut reader = bytes;
        let decoded = rmpv::decode::read_value_with_max_depth(&mut reader, MAX_DECODE_DEPTH)
            .map_err(|_| PacketError::Invalid("incomplete or malformed msgpack payload"))?;

        let mut items = match decoded {
            rmpv::Value::Array(items) if items.len() >= 2 => items,
            _ => return Err(PacketError::Invalid("malformed packet structure")),
        };

        // Anything after the first two elements is ignored
        items.truncate(2);
        let payload = items.pop().unwrap_or(rmpv::Value::Nil);
        let raw_kind = items.pop().unwrap_or(rmpv::Value::Nil);

        let kind = normalize_kind(&raw_kind)?;

        let payload = match payload {
            rmpv::Value::Array(payload) => payload,
            _ => return Err(PacketError::Invalid("packet payload is not an array")),
        };
        if payload.len() > MAX_PAYLOAD_ITEMS {
            return Err(PacketError::Invalid("packet payload is too long"));
        }

        Ok(Packet { kind, payload })
    }

    /// Encodes an outbound packet. Structs in the payload are written as
    /// MessagePack maps keyed by field name.
    pub fn encode<T: Serialize>(&self, kind: &str, payload: &[T]) -> Result<Vec<u8>, PacketError> {
        Ok(rmp_serde::to_vec_named(&(kind, payload))?)
    }
}

fn normalize_kind(raw: &rmpv::Value) -> Result<String, PacketError> {
    let kind = match raw {
        rmpv::Value::String(s) => s.as_str().map(str::to_string),
        rmpv::Value::Integer(n) => n
            .as_i64()
            .map(|v| v.to_string())
            .or_else(|| n.as_u64().map(|v| v.to_string())),
        _ => None,
    };

    match kind {
        Some(kind) if !kind.is_empty() && kind.chars().count() <= MAX_TYPE_LEN => Ok(kind),
        _ => Err(PacketError::Invalid("invalid packet identifier")),
    }
}
