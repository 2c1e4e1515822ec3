//! Deterministic game simulation
//!
//! All gameplay state advances in fixed ticks driven by [`Simulation::tick`].
//! Nothing in here touches wall time, platform APIs, or unseeded randomness;
//! the same seed, tuning, and input stream always produce the same run.

pub mod damage;
pub mod map;
pub mod state;
pub mod tick;
pub mod vehicle;
pub mod world;

pub use damage::{CollisionResolver, HitReport};
pub use map::{MapId, TrackMap};
pub use state::{
    CollisionMaterial, DestructibleProp, HitFx, Obstacle, Pickup, PickupKind, PropPhase,
    RunState, RunStatus, Telemetry,
};
pub use tick::{FrameEvents, Simulation};
pub use vehicle::{EngineAudioParams, EngineDirection, VehicleController, VehicleKinematics};
pub use world::{fragment_impulses, World, WorldEvent};
