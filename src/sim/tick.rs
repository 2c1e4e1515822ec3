//! Per-frame simulation orchestration
//!
//! `Simulation` owns the map, the world, the vehicle, and the run record,
//! and advances them together on a fixed cadence. Collision contacts arrive
//! from the rigid-body collaborator between ticks via `contact_*`; everything
//! else happens inside `tick`.

use glam::Vec2;

use crate::input::DriveInput;
use crate::sim::damage::CollisionResolver;
use crate::sim::map::{MapId, TrackMap};
use crate::sim::state::{CollisionMaterial, PickupKind, RunState};
use crate::sim::vehicle::{VehicleController, VehicleKinematics};
use crate::sim::world::{
    World, WorldEvent, PART_REPAIR_AMOUNT, PART_SCORE, REPAIR_AMOUNT, SMASH_SCORE, STAR_SCORE,
};
use crate::tuning::{CarProfileId, Tuning};

/// Everything notable that happened during one tick
#[derive(Debug, Clone, Default)]
pub struct FrameEvents {
    /// The run was reset this tick
    pub restarted: bool,
    /// The run ended this tick
    pub lost: bool,
    /// The out-of-bounds recovery fired
    pub returned_to_spawn: bool,
    /// A parts pickup armed the shield
    pub shield_activated: bool,
    pub world: Vec<WorldEvent>,
}

/// The complete headless game state
pub struct Simulation {
    map: TrackMap,
    world: World,
    vehicle: VehicleController,
    run: RunState,
    kinematics: VehicleKinematics,
    resolver: CollisionResolver,
    tuning: Tuning,
    clock: f64,
}

impl Simulation {
    pub fn new(map_id: MapId, seed: u64, profile: CarProfileId) -> Self {
        Self::with_tuning(map_id, seed, profile, Tuning::default())
    }

    pub fn with_tuning(map_id: MapId, seed: u64, profile: CarProfileId, tuning: Tuning) -> Self {
        let map = TrackMap::get(map_id, seed);
        let kinematics = VehicleKinematics::at_spawn(&map);
        log::info!(
            "simulation start: map {} seed {seed} profile {}",
            map.id.label(),
            profile.label()
        );
        Self {
            world: World::new(seed, map.world_half),
            vehicle: VehicleController::new(profile, seed),
            run: RunState::new(),
            kinematics,
            resolver: CollisionResolver::new(),
            tuning,
            map,
            clock: 0.0,
        }
    }

    pub fn map(&self) -> &TrackMap {
        &self.map
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn kinematics(&self) -> &VehicleKinematics {
        &self.kinematics
    }

    pub fn vehicle(&self) -> &VehicleController {
        &self.vehicle
    }

    /// Simulated seconds since construction
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Advance one fixed tick
    pub fn tick(&mut self, input: DriveInput, dt: f32) -> FrameEvents {
        let mut events = FrameEvents::default();
        self.clock += dt as f64;
        let was_lost = self.run.is_lost();

        if input.restart {
            self.restart();
            events.restarted = true;
        }

        let vehicle_events =
            self.vehicle
                .step(input, dt, &self.map, &self.tuning, &mut self.run, &mut self.kinematics);
        events.returned_to_spawn = vehicle_events.returned_to_spawn;

        // sustained grinding on hard geometry
        let scrape = self.resolver.tick_scrape(
            dt as f64,
            self.kinematics.forward_speed(),
            self.vehicle.profile_id().profile(),
            &self.tuning.assist,
            self.vehicle.shield_active(),
        );
        if scrape > 0 {
            self.run.add_damage(scrape);
            self.run.trigger_hit_fx(0.2, "Side scrape");
        }

        // the world idles while the run is lost; restart revives it
        let world_events = if self.run.is_lost() {
            Vec::new()
        } else {
            self.world.step(
                dt,
                self.clock,
                self.kinematics.position,
                self.run.damage(),
                &self.tuning.assist,
            )
        };
        for event in &world_events {
            if let WorldEvent::PickupCollected { pickup } = event {
                match pickup.kind {
                    PickupKind::Star => self.run.add_score(STAR_SCORE),
                    PickupKind::Repair => self.run.repair(REPAIR_AMOUNT),
                    PickupKind::Part => {
                        self.run.repair(PART_REPAIR_AMOUNT);
                        self.run.add_score(PART_SCORE);
                        self.vehicle.activate_shield(self.tuning.assist.shield_duration_sec);
                        events.shield_activated = true;
                    }
                }
            }
        }
        events.world = world_events;

        events.lost = !was_lost && self.run.is_lost();
        events
    }

    /// Reset the run, vehicle, world, and contact bookkeeping
    pub fn restart(&mut self) {
        self.run.restart_run();
        self.vehicle.reset(&mut self.kinematics, &self.map);
        self.world.reset();
        self.resolver.reset();
    }

    /// A contact with the named body began
    pub fn contact_started(&mut self, body_name: &str) {
        self.resolver.contact_started(CollisionMaterial::from_body_name(body_name));
    }

    /// A contact with the named body ended
    pub fn contact_ended(&mut self, body_name: &str) {
        self.resolver.contact_ended(CollisionMaterial::from_body_name(body_name));
    }

    /// Score an impact reported by the rigid-body collaborator.
    ///
    /// Alignment is how much of the motion lands along the car's own axis:
    /// the travel direction dotted with the heading, absolute value, so a
    /// reverse hit square on the tail counts the same as a head-on one and
    /// a sideways slide counts as a scrape.
    pub fn impact(&mut self, body_name: &str, impact_speed: f32) {
        if self.run.is_lost() {
            return;
        }
        let material = CollisionMaterial::from_body_name(body_name);
        let forward = crate::forward_from_yaw(self.kinematics.yaw);
        let planar = Vec2::new(self.kinematics.velocity.x, self.kinematics.velocity.z);
        let alignment = if planar.length_squared() > 1e-4 {
            planar.normalize().dot(forward).abs()
        } else {
            0.0
        };

        let report = self.resolver.on_impact(
            self.clock,
            material,
            impact_speed,
            alignment,
            self.vehicle.profile_id().profile(),
            &self.tuning.assist,
            self.vehicle.shield_active(),
        );
        if let Some(report) = report {
            self.run.add_damage(report.damage);
            self.run.trigger_hit_fx(report.strength, report.label);
        }
    }

    /// The car hit a destructible prop; breaks it at speed and scores it
    pub fn impact_destructible(&mut self, prop_id: u32) -> Option<WorldEvent> {
        if self.run.is_lost() {
            return None;
        }
        let speed = self.kinematics.forward_speed();
        let event = self.world.strike_destructible(prop_id, speed, self.clock)?;
        self.run.add_score(SMASH_SCORE);
        Some(event)
    }
}
