//! Run state and world entity types
//!
//! `RunState` is the single damage/score/status record for a session. It is
//! owned by the simulation and mutated only through its setter methods, all
//! of which are no-ops once the run is lost (except `restart_run`).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_DAMAGE;

/// Whether the run is still going
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Running,
    Lost,
}

/// One-shot feedback event surfaced to the HUD/audio collaborators.
/// `token` increments on every trigger so listeners can detect repeats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitFx {
    pub token: u32,
    pub strength: f32,
    pub label: String,
}

/// Speed/steering readout for the HUD
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    pub speed_kph: f32,
    pub steer_deg: f32,
}

/// Damage, score, and status for the current run
#[derive(Debug, Clone, Default)]
pub struct RunState {
    damage: u32,
    score: u64,
    best_score: u64,
    status: RunStatus,
    restart_token: u32,
    hit_fx: HitFx,
    telemetry: Telemetry,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn damage(&self) -> u32 {
        self.damage
    }

    /// Damage as a 0..=1 fraction of the losing threshold
    pub fn damage_ratio(&self) -> f32 {
        (self.damage as f32 / MAX_DAMAGE as f32).min(1.0)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_lost(&self) -> bool {
        self.status == RunStatus::Lost
    }

    /// Monotonically increments on every restart; collaborators compare it
    /// against a last-seen value to reset their transient state.
    pub fn restart_token(&self) -> u32 {
        self.restart_token
    }

    pub fn hit_fx(&self) -> &HitFx {
        &self.hit_fx
    }

    pub fn telemetry(&self) -> Telemetry {
        self.telemetry
    }

    /// Apply a damage delta, clamped at [`MAX_DAMAGE`]. Flips the status to
    /// Lost exactly when the clamp is reached. No-op while lost.
    pub fn add_damage(&mut self, amount: u32) {
        if self.status == RunStatus::Lost {
            return;
        }
        self.damage = (self.damage + amount).min(MAX_DAMAGE);
        if self.damage >= MAX_DAMAGE {
            self.status = RunStatus::Lost;
            log::info!("run lost at score {}", self.score);
        }
    }

    /// No-op while lost
    pub fn add_score(&mut self, amount: u64) {
        if self.status == RunStatus::Lost {
            return;
        }
        self.score += amount;
        self.best_score = self.best_score.max(self.score);
    }

    /// Reduce damage, clamped at zero. No-op while lost.
    pub fn repair(&mut self, amount: u32) {
        if self.status == RunStatus::Lost {
            return;
        }
        self.damage = self.damage.saturating_sub(amount);
    }

    /// Surface a hit/feedback effect to HUD and audio
    pub fn trigger_hit_fx(&mut self, strength: f32, label: &str) {
        self.hit_fx = HitFx {
            token: self.hit_fx.token.wrapping_add(1),
            strength: strength.clamp(0.15, 1.0),
            label: label.to_string(),
        };
    }

    pub fn set_telemetry(&mut self, speed_kph: f32, steer_deg: f32) {
        self.telemetry = Telemetry { speed_kph, steer_deg };
    }

    /// Reset damage/score/status and increment the restart token.
    /// Best score survives the reset.
    pub fn restart_run(&mut self) {
        self.damage = 0;
        self.score = 0;
        self.status = RunStatus::Running;
        self.restart_token = self.restart_token.wrapping_add(1);
        self.hit_fx.strength = 0.0;
        self.telemetry = Telemetry::default();
        log::info!("run restarted (token {})", self.restart_token);
    }
}

/// Collision material tier of world geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionMaterial {
    Soft,
    Medium,
    Hard,
}

impl CollisionMaterial {
    /// Damage scale for this tier
    pub fn damage_scale(self) -> f32 {
        match self {
            CollisionMaterial::Hard => 1.4,
            CollisionMaterial::Medium => 0.95,
            CollisionMaterial::Soft => 0.35,
        }
    }

    /// Classify a rigid body by its name prefix ("hard-wall-north" etc.).
    /// Unknown names are treated as soft.
    pub fn from_body_name(name: &str) -> CollisionMaterial {
        if name.starts_with("hard-") {
            CollisionMaterial::Hard
        } else if name.starts_with("medium-") {
            CollisionMaterial::Medium
        } else {
            CollisionMaterial::Soft
        }
    }
}

/// A world-fixed or movable collidable box
#[derive(Debug, Clone, Serialize)]
pub struct Obstacle {
    pub id: &'static str,
    pub position: Vec3,
    /// Full extents on each axis
    pub size: Vec3,
    pub material: CollisionMaterial,
    pub movable: bool,
    pub color: &'static str,
}

impl Obstacle {
    /// Rigid-body name carrying the material tier prefix
    pub fn body_name(&self) -> String {
        let prefix = match self.material {
            CollisionMaterial::Hard => "hard",
            CollisionMaterial::Medium => "medium",
            CollisionMaterial::Soft => "soft",
        };
        format!("{prefix}-{}", self.id)
    }

    /// XZ footprint test with a safety margin, for spawn placement
    pub fn footprint_contains(&self, x: f32, z: f32, margin: f32) -> bool {
        (x - self.position.x).abs() <= self.size.x * 0.5 + margin
            && (z - self.position.z).abs() <= self.size.z * 0.5 + margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupKind {
    Star,
    Repair,
    Part,
}

/// A collectible. Collected pickups are removed from the active set;
/// replacements come from the spawn policy, never mutation-in-place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub position: Vec3,
}

/// Destructible prop lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropPhase {
    /// Collidable as a single solid body
    Intact,
    /// Only transient fragment bodies exist until `respawn_at`
    Broken {
        /// Simulated-time deadline for respawning
        respawn_at: f64,
        /// Reproduces the fragment burst trajectories
        burst_seed: u32,
    },
}

/// A crate-style prop that bursts apart when hit fast enough
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestructibleProp {
    pub id: u32,
    pub position: Vec3,
    pub color: String,
    pub phase: PropPhase,
}

impl DestructibleProp {
    pub fn is_intact(&self) -> bool {
        matches!(self.phase, PropPhase::Intact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_damage_clamps_and_loses() {
        let mut run = RunState::new();
        run.add_damage(60);
        assert_eq!(run.damage(), 60);
        assert_eq!(run.status(), RunStatus::Running);
        run.add_damage(999);
        assert_eq!(run.damage(), MAX_DAMAGE);
        assert_eq!(run.status(), RunStatus::Lost);
    }

    #[test]
    fn test_lost_is_terminal_until_restart() {
        let mut run = RunState::new();
        run.add_score(25);
        run.add_damage(MAX_DAMAGE);
        assert!(run.is_lost());

        // every mutation except restart is a no-op now
        run.add_damage(5);
        run.add_score(10);
        run.repair(50);
        assert_eq!(run.damage(), MAX_DAMAGE);
        assert_eq!(run.score(), 25);

        run.restart_run();
        assert_eq!(run.damage(), 0);
        assert_eq!(run.score(), 0);
        assert_eq!(run.status(), RunStatus::Running);
    }

    #[test]
    fn test_restart_increments_token_and_keeps_best() {
        let mut run = RunState::new();
        run.add_score(40);
        let token = run.restart_token();
        run.restart_run();
        assert_eq!(run.restart_token(), token + 1);
        assert_eq!(run.best_score(), 40);
        assert_eq!(run.score(), 0);
    }

    #[test]
    fn test_repair_clamps_at_zero() {
        let mut run = RunState::new();
        run.add_damage(10);
        run.repair(28);
        assert_eq!(run.damage(), 0);
    }

    #[test]
    fn test_hit_fx_token_increments() {
        let mut run = RunState::new();
        run.trigger_hit_fx(0.5, "Crate hit");
        let first = run.hit_fx().token;
        run.trigger_hit_fx(0.02, "Soft bump");
        assert_eq!(run.hit_fx().token, first + 1);
        // strength is clamped to the visible range
        assert!(run.hit_fx().strength >= 0.15);
    }

    #[test]
    fn test_material_from_body_name() {
        assert_eq!(CollisionMaterial::from_body_name("hard-wall-north"), CollisionMaterial::Hard);
        assert_eq!(CollisionMaterial::from_body_name("medium-crate-1"), CollisionMaterial::Medium);
        assert_eq!(CollisionMaterial::from_body_name("soft-cone-1"), CollisionMaterial::Soft);
        assert_eq!(CollisionMaterial::from_body_name("player-car"), CollisionMaterial::Soft);
    }

    proptest! {
        #[test]
        fn prop_damage_monotonic_until_lost(deltas in prop::collection::vec(1u32..40, 1..50)) {
            let mut run = RunState::new();
            let mut prev = run.damage();
            for d in deltas {
                let was_lost = run.is_lost();
                run.add_damage(d);
                if was_lost {
                    prop_assert_eq!(run.damage(), prev);
                } else {
                    prop_assert!(run.damage() > prev || run.damage() == MAX_DAMAGE);
                }
                prop_assert!(run.damage() <= MAX_DAMAGE);
                prop_assert_eq!(run.is_lost(), run.damage() == MAX_DAMAGE);
                prev = run.damage();
            }
        }

        #[test]
        fn prop_restart_always_resets(damage in 0u32..200, score in 0u64..1000) {
            let mut run = RunState::new();
            run.add_score(score);
            run.add_damage(damage);
            let token = run.restart_token();
            run.restart_run();
            prop_assert_eq!(run.damage(), 0);
            prop_assert_eq!(run.score(), 0);
            prop_assert_eq!(run.status(), RunStatus::Running);
            prop_assert_eq!(run.restart_token(), token.wrapping_add(1));
        }
    }
}
