//! Arcade vehicle dynamics
//!
//! A bicycle-model integrator driven by boolean controls. Velocity is
//! decomposed into forward/lateral components in the car's frame each tick;
//! throttle, braking, drag, and top-speed clamping act on the forward
//! component, grip decays the lateral one, and a lagged steering angle feeds
//! yaw rate through the wheelbase. Damage degrades acceleration, top speed,
//! steering authority, and grip, and past the critical threshold a seeded
//! duty cycle cuts the throttle in and out.
//!
//! The integrator owns yaw and planar velocity; vertical placement follows
//! the terrain directly (four sampled wheel heights give pitch and roll).

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::OUT_OF_BOUNDS_SCALE;
use crate::input::DriveInput;
use crate::sim::map::TrackMap;
use crate::sim::state::RunState;
use crate::tuning::{CarProfileId, EngineTone, Tuning};
use crate::{forward_from_yaw, normalize_angle, right_from_yaw};

/// Half the distance between left and right wheel contact points
const HALF_TRACK: f32 = 0.82;
/// Chassis height above the averaged wheel contact height
const RIDE_HEIGHT: f32 = 0.55;
/// Blend rate for the smoothed chassis pitch/roll
const TILT_RESPONSE: f32 = 6.0;
/// Yaw-rate blend rate
const YAW_RESPONSE: f32 = 10.0;
/// Steering flips and weakens below this reverse speed
const REVERSE_STEER_SPEED: f32 = -0.15;
const REVERSE_STEER_FACTOR: f32 = -0.55;
/// Yaw-rate delta per tick below which the car counts as rotationally stuck
const STUCK_YAW_EPSILON: f32 = 0.0006;
/// Seconds of stuck steering before the nudge kicks in
const STUCK_NUDGE_DELAY: f32 = 0.45;

/// Pose and velocity owned by the rigid-body collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleKinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
}

impl VehicleKinematics {
    pub fn at_spawn(map: &TrackMap) -> Self {
        Self {
            position: map.spawn_position(),
            velocity: Vec3::ZERO,
            yaw: map.start_yaw,
        }
    }

    /// Signed forward speed in the car's frame
    pub fn forward_speed(&self) -> f32 {
        let fwd = forward_from_yaw(self.yaw);
        Vec2::new(self.velocity.x, self.velocity.z).dot(fwd)
    }
}

/// Drive direction as heard by the engine voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineDirection {
    Forward,
    Reverse,
    #[default]
    Idle,
}

/// Parameters the audio collaborator needs to voice the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineAudioParams {
    /// 0..1 fraction of the current top speed
    pub intensity: f32,
    /// 0..1 strain from damage, sliding, and off-road driving
    pub load: f32,
    pub direction: EngineDirection,
    pub tone: EngineTone,
    /// True while the critical-damage throttle cut is active
    pub sputtering: bool,
}

/// Events a vehicle tick can raise
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleStepEvents {
    /// The out-of-bounds recovery teleported the car back to spawn
    pub returned_to_spawn: bool,
}

/// Per-run driving state machine
#[derive(Debug, Clone)]
pub struct VehicleController {
    profile_id: CarProfileId,
    steer_angle: f32,
    yaw_rate: f32,
    last_yaw: f32,
    stuck_timer: f32,
    sputter_timer: f32,
    sputter_active: bool,
    shield_timer: f32,
    pitch: f32,
    roll: f32,
    audio: EngineAudioParams,
    rng: Pcg32,
}

impl VehicleController {
    pub fn new(profile_id: CarProfileId, seed: u64) -> Self {
        Self {
            profile_id,
            steer_angle: 0.0,
            yaw_rate: 0.0,
            last_yaw: 0.0,
            stuck_timer: 0.0,
            sputter_timer: 0.0,
            sputter_active: false,
            shield_timer: 0.0,
            pitch: 0.0,
            roll: 0.0,
            audio: EngineAudioParams {
                intensity: 0.0,
                load: 0.0,
                direction: EngineDirection::Idle,
                tone: profile_id.profile().engine_tone,
                sputtering: false,
            },
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn profile_id(&self) -> CarProfileId {
        self.profile_id
    }

    /// Clear transient driving state for a fresh run. The RNG stream keeps
    /// advancing; determinism is per construction seed, not per restart.
    pub fn reset(&mut self, kin: &mut VehicleKinematics, map: &TrackMap) {
        *kin = VehicleKinematics::at_spawn(map);
        self.steer_angle = 0.0;
        self.yaw_rate = 0.0;
        self.last_yaw = kin.yaw;
        self.stuck_timer = 0.0;
        self.sputter_timer = 0.0;
        self.sputter_active = false;
        self.shield_timer = 0.0;
        self.pitch = 0.0;
        self.roll = 0.0;
        self.audio.intensity = 0.0;
        self.audio.load = 0.0;
        self.audio.direction = EngineDirection::Idle;
        self.audio.sputtering = false;
    }

    pub fn activate_shield(&mut self, duration_sec: f32) {
        self.shield_timer = self.shield_timer.max(duration_sec);
    }

    pub fn shield_active(&self) -> bool {
        self.shield_timer > 0.0
    }

    pub fn shield_remaining(&self) -> f32 {
        self.shield_timer.max(0.0)
    }

    /// Smoothed chassis tilt, for the renderer
    pub fn tilt(&self) -> (f32, f32) {
        (self.pitch, self.roll)
    }

    pub fn engine_audio(&self) -> EngineAudioParams {
        self.audio
    }

    /// Advance one tick. Reads controls and damage, writes velocity, yaw,
    /// and vertical placement back into `kin`, and publishes telemetry.
    pub fn step(
        &mut self,
        input: DriveInput,
        dt: f32,
        map: &TrackMap,
        tuning: &Tuning,
        run: &mut RunState,
        kin: &mut VehicleKinematics,
    ) -> VehicleStepEvents {
        let mut events = VehicleStepEvents::default();

        // bounds recovery comes first so a flung car is never integrated
        // from a position outside the playable area
        let limit = map.world_half * OUT_OF_BOUNDS_SCALE;
        if kin.position.x.abs() > limit || kin.position.z.abs() > limit {
            log::info!(
                "out of bounds at ({:.1}, {:.1}), returning to spawn",
                kin.position.x,
                kin.position.z
            );
            *kin = VehicleKinematics::at_spawn(map);
            self.steer_angle = 0.0;
            self.yaw_rate = 0.0;
            self.last_yaw = kin.yaw;
            self.stuck_timer = 0.0;
            run.trigger_hit_fx(0.22, "Back on road");
            events.returned_to_spawn = true;
        }

        if run.is_lost() {
            self.audio.intensity = 0.0;
            self.audio.load = 0.0;
            self.audio.direction = EngineDirection::Idle;
            self.audio.sputtering = false;
            run.set_telemetry(0.0, 0.0);
            return events;
        }

        if self.shield_timer > 0.0 {
            self.shield_timer = (self.shield_timer - dt).max(0.0);
        }

        let profile = self.profile_id.profile();
        let physics = &tuning.vehicle;
        let effects = &tuning.damage_effects;
        let on_road = map.is_on_road(kin.position.x, kin.position.z);
        let surface = if on_road { &tuning.surfaces.road } else { &tuning.surfaces.grass };

        let ratio = run.damage_ratio();
        let accel_scale = 1.0 - ratio * effects.acceleration_loss;
        let top_speed_scale = 1.0 - ratio * effects.top_speed_loss;
        let steering_scale = 1.0 - ratio * effects.steering_loss;
        let grip_scale = 1.0 - ratio * effects.grip_loss;

        // critical-damage sputter duty cycle
        let throttle_factor = if run.damage() >= effects.critical_threshold {
            self.sputter_timer -= dt;
            if self.sputter_timer <= 0.0 {
                self.sputter_active = self.rng.random::<f32>() < tuning.sputter.chance;
                self.sputter_timer = tuning.sputter.min_interval
                    + self.rng.random::<f32>() * tuning.sputter.variable_interval;
            }
            if self.sputter_active { tuning.sputter.throttle_factor } else { 1.0 }
        } else {
            self.sputter_active = false;
            1.0
        };
        self.audio.sputtering =
            self.sputter_active && run.damage() >= effects.critical_threshold;

        // decompose planar velocity into the car frame
        let fwd_dir = forward_from_yaw(kin.yaw);
        let right_dir = right_from_yaw(kin.yaw);
        let planar = Vec2::new(kin.velocity.x, kin.velocity.z);
        let mut speed = planar.dot(fwd_dir);
        let mut lateral = planar.dot(right_dir);

        // throttle / brake / coast on the forward component
        if input.forward {
            if speed < -0.3 {
                speed += physics.reverse_brake_decel * dt;
            } else {
                speed +=
                    surface.forward_acceleration * profile.accel_mult * accel_scale * throttle_factor * dt;
            }
        } else if input.backward {
            if speed > 0.3 {
                speed -= physics.brake_decel * dt;
            } else {
                // the sputter cut only starves forward throttle
                speed -= surface.reverse_acceleration * profile.accel_mult * accel_scale * dt;
            }
        } else if speed.abs() > 0.05 {
            let engine_brake = physics.engine_brake * dt;
            speed -= speed.signum() * engine_brake.min(speed.abs());
        } else {
            speed = 0.0;
        }

        // drag, then clamp against the damage-degraded speed envelope
        speed -= speed * (physics.rolling_resistance + physics.aero_drag * speed.abs()) * dt;
        let top = surface.forward_top_speed * profile.top_speed_mult * top_speed_scale;
        let bottom = surface.reverse_top_speed * profile.reverse_speed_mult * top_speed_scale;
        speed = speed.clamp(bottom, top);

        // grip bleeds lateral velocity, faster at speed
        let grip_rate = (6.4 + speed.abs() * 0.45)
            * grip_scale.max(0.05)
            * surface.grip_factor
            * profile.grip_mult;
        lateral *= 1.0 - (dt * grip_rate).min(1.0);

        // lagged steering toward the input target, with less authority at speed
        let turn = (input.right as i32 - input.left as i32) as f32;
        let speed_steer_scale = 1.0 - (speed.abs() / 16.0).min(0.62);
        let target_steer = turn
            * physics.max_steer_rad
            * (0.55 + speed_steer_scale * 0.45)
            * steering_scale
            * profile.steering_mult;
        let steer_blend = (dt * physics.steer_response).min(1.0);
        self.steer_angle += (target_steer - self.steer_angle) * steer_blend;

        // bicycle model: yaw rate from steer angle through the wheelbase,
        // softened at speed and flipped while reversing
        let reverse_factor = if speed < REVERSE_STEER_SPEED { REVERSE_STEER_FACTOR } else { 1.0 };
        let mut target_yaw_rate = (speed / physics.wheel_base) * self.steer_angle.tan()
            * reverse_factor
            / (0.55 + speed.abs() * 0.06).max(1.0);
        let yaw_blend = (dt * YAW_RESPONSE).min(1.0);
        self.yaw_rate += (target_yaw_rate - self.yaw_rate) * yaw_blend;

        // stuck-steer assist: wedged against geometry at speed with the wheel
        // held, yaw barely moving, give the yaw a direct nudge
        let yaw_delta = normalize_angle(kin.yaw - self.last_yaw).abs();
        if turn != 0.0 && speed.abs() > 2.0 && yaw_delta < STUCK_YAW_EPSILON {
            self.stuck_timer += dt;
            if self.stuck_timer > STUCK_NUDGE_DELAY {
                kin.yaw = normalize_angle(kin.yaw + turn * 0.015);
                target_yaw_rate *= 0.75;
                self.yaw_rate = target_yaw_rate;
                self.stuck_timer = 0.0;
            }
        } else {
            self.stuck_timer = (self.stuck_timer - dt * 2.0).max(0.0);
        }
        self.last_yaw = kin.yaw;

        kin.yaw = normalize_angle(kin.yaw + self.yaw_rate * dt);

        // recompose planar velocity in the updated frame
        let fwd_dir = forward_from_yaw(kin.yaw);
        let right_dir = right_from_yaw(kin.yaw);
        let planar = fwd_dir * speed + right_dir * lateral;
        kin.velocity.x = planar.x;
        kin.velocity.z = planar.y;

        kin.position.x += kin.velocity.x * dt;
        kin.position.z += kin.velocity.z * dt;

        // four-wheel terrain sampling for vertical placement and tilt
        let half_base = physics.wheel_base * 0.5;
        let fl = Vec2::new(kin.position.x, kin.position.z) + fwd_dir * half_base - right_dir * HALF_TRACK;
        let fr = Vec2::new(kin.position.x, kin.position.z) + fwd_dir * half_base + right_dir * HALF_TRACK;
        let bl = Vec2::new(kin.position.x, kin.position.z) - fwd_dir * half_base - right_dir * HALF_TRACK;
        let br = Vec2::new(kin.position.x, kin.position.z) - fwd_dir * half_base + right_dir * HALF_TRACK;
        let h_fl = map.terrain_height(fl.x, fl.y);
        let h_fr = map.terrain_height(fr.x, fr.y);
        let h_bl = map.terrain_height(bl.x, bl.y);
        let h_br = map.terrain_height(br.x, br.y);

        let front = (h_fl + h_fr) * 0.5;
        let back = (h_bl + h_br) * 0.5;
        let left = (h_fl + h_bl) * 0.5;
        let right = (h_fr + h_br) * 0.5;
        let target_pitch = (back - front).atan2(physics.wheel_base);
        let target_roll = (left - right).atan2(HALF_TRACK * 2.0);
        let tilt_blend = (dt * TILT_RESPONSE).min(1.0);
        self.pitch += (target_pitch - self.pitch) * tilt_blend;
        self.roll += (target_roll - self.roll) * tilt_blend;
        kin.position.y = (front + back) * 0.5 + RIDE_HEIGHT;

        // telemetry and engine voice
        run.set_telemetry(speed * 3.6, self.steer_angle.to_degrees());
        self.audio.intensity = if top > 0.0 { (speed.abs() / top).clamp(0.0, 1.0) } else { 0.0 };
        self.audio.direction = if speed > 0.35 {
            EngineDirection::Forward
        } else if speed < -0.35 {
            EngineDirection::Reverse
        } else {
            EngineDirection::Idle
        };
        let lateral_load = (lateral.abs() / 2.4).min(1.0);
        let offroad_load = if on_road { 0.0 } else { 0.2 };
        self.audio.load = (ratio * 0.55 + lateral_load * 0.35 + offroad_load).min(1.0);

        events
    }
}
