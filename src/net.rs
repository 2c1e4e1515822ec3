//! Multiplayer broadcast payloads
//!
//! The transport (a realtime pub/sub channel) is an external collaborator;
//! this module only defines the JSON wire shapes and the envelope that tags
//! them. Remote cars are ghosts: they render and interpolate but never
//! collide, so the payloads carry pose and cosmetics, not physics.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::state::{DestructibleProp, Pickup};
use crate::tuning::CarProfileId;

/// Pose broadcast rate ceiling (messages per second)
pub const SNAPSHOT_RATE_HZ: f32 = 12.0;
/// Remote cars are dropped after this long without a snapshot
pub const PEER_TIMEOUT_SEC: f64 = 6.0;

/// One peer's car pose and cosmetics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarSnapshot {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub color: String,
    pub profile: CarProfileId,
    /// Sender's clock in milliseconds, for staleness ordering
    pub sent_at: f64,
}

impl CarSnapshot {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// A peer collected a pickup; receivers remove it locally
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickupCollected {
    pub id: String,
    pub pickup_id: u32,
}

/// A peer broke a prop; receivers replay the same burst seed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DestructibleBroken {
    pub id: String,
    pub prop_id: u32,
    pub burst_seed: u32,
}

/// Authoritative entity lists, sent by the room host to late joiners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSync {
    pub id: String,
    pub pickups: Vec<Pickup>,
    pub destructibles: Vec<DestructibleProp>,
}

/// Tagged envelope for everything that crosses the channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetMessage {
    Car(CarSnapshot),
    PickupCollected(PickupCollected),
    DestructibleBroken(DestructibleBroken),
    WorldSync(WorldSync),
    /// A peer left cleanly; receivers drop the ghost immediately
    Leave { id: String },
}

impl NetMessage {
    /// Sender id carried by every message variant
    pub fn sender(&self) -> &str {
        match self {
            NetMessage::Car(m) => &m.id,
            NetMessage::PickupCollected(m) => &m.id,
            NetMessage::DestructibleBroken(m) => &m.id,
            NetMessage::WorldSync(m) => &m.id,
            NetMessage::Leave { id } => id,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> serde_json::Result<NetMessage> {
        serde_json::from_str(raw)
    }
}

const ID_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Short shareable room code (no confusable characters)
pub fn generate_room_code(rng: &mut impl Rng) -> String {
    (0..5).map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char).collect()
}

/// Session-unique client id
pub fn generate_client_id(rng: &mut impl Rng) -> String {
    let tail: String =
        (0..10).map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char).collect();
    format!("car-{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_envelope_round_trip() {
        let msg = NetMessage::Car(CarSnapshot {
            id: "car-abc".to_string(),
            x: 1.5,
            y: 0.8,
            z: -3.0,
            yaw: 0.4,
            color: "#ef4444".to_string(),
            profile: CarProfileId::Zippy,
            sent_at: 1234.0,
        });
        let json = msg.encode().unwrap();
        assert!(json.contains(r#""type":"car"#));
        let back = NetMessage::decode(&json).unwrap();
        assert_eq!(back.sender(), "car-abc");
        match back {
            NetMessage::Car(snapshot) => assert_eq!(snapshot.position(), Vec3::new(1.5, 0.8, -3.0)),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_break_event_carries_seed() {
        let msg = NetMessage::DestructibleBroken(DestructibleBroken {
            id: "car-xyz".to_string(),
            prop_id: 4,
            burst_seed: 0xDEAD,
        });
        let json = msg.encode().unwrap();
        match NetMessage::decode(&json).unwrap() {
            NetMessage::DestructibleBroken(event) => assert_eq!(event.burst_seed, 0xDEAD),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        assert!(NetMessage::decode(r#"{"type":"dance","id":"car-a"}"#).is_err());
    }

    #[test]
    fn test_id_generation() {
        let mut rng = Pcg32::seed_from_u64(1);
        let room = generate_room_code(&mut rng);
        assert_eq!(room.len(), 5);
        assert!(room.chars().all(|c| ID_ALPHABET.contains(&(c as u8))));

        let client = generate_client_id(&mut rng);
        assert!(client.starts_with("car-"));
        assert_eq!(client.len(), 14);

        // deterministic for a fixed seed
        let mut rng2 = Pcg32::seed_from_u64(1);
        assert_eq!(generate_room_code(&mut rng2), room);
    }
}
