//! World entities: obstacles, pickups, and destructible props
//!
//! The world owns everything collidable or collectible that is not the car.
//! Pickups are collected by proximity and replenished by a timed spawn
//! policy; crate-style props burst into seeded fragments when struck fast
//! enough and respawn elsewhere after a cooldown. All randomness flows
//! through one seeded generator so a given seed replays the same world.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::PICKUP_RADIUS;
use crate::sim::state::{
    CollisionMaterial, DestructibleProp, Obstacle, Pickup, PickupKind, PropPhase,
};
use crate::tuning::AssistTuning;

/// Score awarded per star
pub const STAR_SCORE: u64 = 10;
/// Score awarded for smashing a prop
pub const SMASH_SCORE: u64 = 5;
/// Score awarded for a parts pickup
pub const PART_SCORE: u64 = 4;
/// Damage removed by a repair wrench
pub const REPAIR_AMOUNT: u32 = 28;
/// Smaller patch-up that comes with a parts pickup
pub const PART_REPAIR_AMOUNT: u32 = 12;

/// Seconds between spawn attempts
const SPAWN_INTERVAL: f32 = 1.2;
/// Placement candidates tried per spawn attempt
const SPAWN_TRIALS: u32 = 12;
/// Pickups never appear this close to the car
const SPAWN_VEHICLE_CLEARANCE: f32 = 9.0;
/// Minimum spacing between pickups
const SPAWN_PICKUP_CLEARANCE: f32 = 3.0;
/// Extra margin kept from obstacle footprints
const SPAWN_OBSTACLE_MARGIN: f32 = 1.2;
/// Pickups keep this far from the edge of the playable area
const SPAWN_EDGE_MARGIN: f32 = 2.0;
/// Active pickups are capped at this count
const MAX_ACTIVE_PICKUPS: usize = 7;
/// The spawn policy keeps at least this many stars in play
const MIN_STARS: usize = 3;
/// And at least this many repairs
const MIN_REPAIRS: usize = 1;
/// Chance per cycle of a bonus parts pickup once minimums are met
const PART_CHANCE: f32 = 0.16;

/// Impact speed that breaks a prop
const PROP_BREAK_SPEED: f32 = 6.0;
/// Seconds a broken prop stays gone
const PROP_RESPAWN_SEC: f64 = 9.0;
/// Fragment bodies per burst
const FRAGMENT_COUNT: usize = 6;

const PROP_COLORS: [&str; 4] = ["#f97316", "#38bdf8", "#a3e635", "#f472b6"];

/// Fixed respawn points for destructible props, spread over road and grass.
/// Pickups do not use these; they land at randomized positions.
const DESTRUCTIBLE_SPAWN_POINTS: [Vec3; 10] = [
    Vec3::new(17.0, 0.6, 0.0),
    Vec3::new(-17.0, 0.6, 0.0),
    Vec3::new(0.0, 0.6, 17.0),
    Vec3::new(0.0, 0.6, -17.0),
    Vec3::new(12.0, 0.6, 12.0),
    Vec3::new(-12.0, 0.6, 12.0),
    Vec3::new(12.0, 0.6, -12.0),
    Vec3::new(-12.0, 0.6, -12.0),
    Vec3::new(5.0, 0.6, 20.0),
    Vec3::new(-5.0, 0.6, -20.0),
];

/// Something happened in the world this tick
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    PickupCollected { pickup: Pickup },
    PickupSpawned { id: u32, kind: PickupKind },
    PropBroken { id: u32, burst_seed: u32 },
    PropRespawned { id: u32 },
}

/// All non-car world state
#[derive(Debug, Clone)]
pub struct World {
    pickups: Vec<Pickup>,
    destructibles: Vec<DestructibleProp>,
    static_obstacles: Vec<Obstacle>,
    movable_obstacles: Vec<Obstacle>,
    spawn_timer: f32,
    next_id: u32,
    world_half: f32,
    rng: Pcg32,
}

impl World {
    pub fn new(seed: u64, world_half: f32) -> Self {
        let mut world = Self {
            pickups: Vec::new(),
            destructibles: Vec::new(),
            static_obstacles: static_obstacles(),
            movable_obstacles: movable_obstacles(),
            spawn_timer: 0.0,
            next_id: 0,
            world_half,
            rng: Pcg32::seed_from_u64(seed.wrapping_mul(31).wrapping_add(11)),
        };
        world.populate();
        world
    }

    /// Reset entity state for a fresh run, keeping the RNG stream
    pub fn reset(&mut self) {
        self.pickups.clear();
        self.destructibles.clear();
        self.movable_obstacles = movable_obstacles();
        self.spawn_timer = 0.0;
        self.populate();
    }

    fn populate(&mut self) {
        let initial = [
            (Vec3::new(17.0, 0.8, 0.0), PickupKind::Star),
            (Vec3::new(-17.0, 0.8, 0.0), PickupKind::Star),
            (Vec3::new(0.0, 0.8, 17.0), PickupKind::Star),
            (Vec3::new(0.0, 0.8, -17.0), PickupKind::Repair),
            (Vec3::new(12.0, 0.8, 12.0), PickupKind::Star),
            (Vec3::new(20.0, 0.8, 5.0), PickupKind::Repair),
        ];
        for (position, kind) in initial {
            let id = self.alloc_id();
            self.pickups.push(Pickup { id, kind, position });
        }

        for (i, pos) in [
            Vec3::new(8.0, 0.6, 8.0),
            Vec3::new(-8.0, 0.6, 8.0),
            Vec3::new(8.0, 0.6, -8.0),
            Vec3::new(-8.0, 0.6, -8.0),
            Vec3::new(0.0, 0.6, 22.0),
        ]
        .into_iter()
        .enumerate()
        {
            let id = self.alloc_id();
            self.destructibles.push(DestructibleProp {
                id,
                position: pos,
                color: PROP_COLORS[i % PROP_COLORS.len()].to_string(),
                phase: PropPhase::Intact,
            });
        }
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn destructibles(&self) -> &[DestructibleProp] {
        &self.destructibles
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.static_obstacles.iter().chain(self.movable_obstacles.iter())
    }

    /// Replace the synced entity lists wholesale (remote authority)
    pub fn apply_sync(&mut self, pickups: Vec<Pickup>, destructibles: Vec<DestructibleProp>) {
        let max_seen = pickups
            .iter()
            .map(|p| p.id)
            .chain(destructibles.iter().map(|d| d.id))
            .max()
            .map_or(0, |m| m + 1);
        self.next_id = self.next_id.max(max_seen);
        self.pickups = pickups;
        self.destructibles = destructibles;
    }

    /// Advance pickups and prop respawns one tick.
    ///
    /// `now` is the simulation clock; `damage` feeds the repair-assist bias.
    pub fn step(
        &mut self,
        dt: f32,
        now: f64,
        vehicle_pos: Vec3,
        damage: u32,
        assist: &AssistTuning,
    ) -> Vec<WorldEvent> {
        let mut events = Vec::new();

        // proximity collection, XZ distance only
        let mut collected = Vec::new();
        self.pickups.retain(|pickup| {
            let dx = pickup.position.x - vehicle_pos.x;
            let dz = pickup.position.z - vehicle_pos.z;
            if (dx * dx + dz * dz).sqrt() <= PICKUP_RADIUS {
                collected.push(pickup.clone());
                false
            } else {
                true
            }
        });
        for pickup in collected {
            log::debug!("collected {:?} #{}", pickup.kind, pickup.id);
            events.push(WorldEvent::PickupCollected { pickup });
        }

        // prop respawns
        let mut respawned = Vec::new();
        for prop in &mut self.destructibles {
            if let PropPhase::Broken { respawn_at, .. } = prop.phase
                && now >= respawn_at
            {
                respawned.push(prop.id);
            }
        }
        for id in respawned {
            if let Some(event) = self.respawn_prop(id, vehicle_pos) {
                events.push(event);
            }
        }

        // timed spawn policy
        self.spawn_timer += dt;
        if self.spawn_timer >= SPAWN_INTERVAL {
            self.spawn_timer = 0.0;
            if self.pickups.len() < MAX_ACTIVE_PICKUPS
                && let Some(event) = self.try_spawn_pickup(vehicle_pos, damage, assist)
            {
                events.push(event);
            }
        }

        events
    }

    /// Pick what to spawn this cycle, or None if the world is topped up
    fn next_spawn_kind(&mut self, damage: u32, assist: &AssistTuning) -> Option<PickupKind> {
        // hurt players get offered repairs more often
        if damage >= assist.repair_assist_threshold
            && self.rng.random::<f32>() < assist.repair_assist_chance
        {
            return Some(PickupKind::Repair);
        }
        let stars = self.pickups.iter().filter(|p| p.kind == PickupKind::Star).count();
        if stars < MIN_STARS {
            return Some(PickupKind::Star);
        }
        let repairs = self.pickups.iter().filter(|p| p.kind == PickupKind::Repair).count();
        if repairs < MIN_REPAIRS {
            return Some(PickupKind::Repair);
        }
        if self.rng.random::<f32>() < PART_CHANCE {
            return Some(PickupKind::Part);
        }
        None
    }

    fn try_spawn_pickup(
        &mut self,
        vehicle_pos: Vec3,
        damage: u32,
        assist: &AssistTuning,
    ) -> Option<WorldEvent> {
        let kind = self.next_spawn_kind(damage, assist)?;
        let range = (self.world_half - SPAWN_EDGE_MARGIN).max(1.0);
        for _ in 0..SPAWN_TRIALS {
            let point = Vec3::new(
                self.rng.random_range(-range..range),
                0.8,
                self.rng.random_range(-range..range),
            );
            if !self.placement_clear(point, vehicle_pos) {
                continue;
            }
            let id = self.alloc_id();
            self.pickups.push(Pickup { id, kind, position: point });
            log::debug!("spawned {kind:?} #{id} at ({:.1}, {:.1})", point.x, point.z);
            return Some(WorldEvent::PickupSpawned { id, kind });
        }
        // placement budget exhausted; try again next cycle
        None
    }

    fn placement_clear(&self, point: Vec3, vehicle_pos: Vec3) -> bool {
        let dx = point.x - vehicle_pos.x;
        let dz = point.z - vehicle_pos.z;
        if (dx * dx + dz * dz).sqrt() < SPAWN_VEHICLE_CLEARANCE {
            return false;
        }
        if self.pickups.iter().any(|p| {
            let dx = p.position.x - point.x;
            let dz = p.position.z - point.z;
            (dx * dx + dz * dz).sqrt() < SPAWN_PICKUP_CLEARANCE
        }) {
            return false;
        }
        if self
            .obstacles()
            .any(|o| o.footprint_contains(point.x, point.z, SPAWN_OBSTACLE_MARGIN))
        {
            return false;
        }
        true
    }

    /// Report a collision with a prop. Breaks it when hit fast enough and
    /// returns the break event; slow nudges do nothing.
    pub fn strike_destructible(&mut self, id: u32, speed: f32, now: f64) -> Option<WorldEvent> {
        if speed.abs() < PROP_BREAK_SPEED {
            return None;
        }
        let idx = self.destructibles.iter().position(|p| p.id == id && p.is_intact())?;
        let burst_seed = self.rng.random::<u32>();
        self.destructibles[idx].phase =
            PropPhase::Broken { respawn_at: now + PROP_RESPAWN_SEC, burst_seed };
        log::debug!("prop #{id} broken (burst seed {burst_seed})");
        Some(WorldEvent::PropBroken { id, burst_seed })
    }

    /// Mark a prop broken from a remote event, reusing the sender's seed
    pub fn break_remote(&mut self, id: u32, burst_seed: u32, now: f64) {
        if let Some(prop) = self.destructibles.iter_mut().find(|p| p.id == id && p.is_intact()) {
            prop.phase = PropPhase::Broken { respawn_at: now + PROP_RESPAWN_SEC, burst_seed };
        }
    }

    fn respawn_prop(&mut self, id: u32, vehicle_pos: Vec3) -> Option<WorldEvent> {
        // pick a spawn point clear of the car and other intact props
        let mut point = None;
        for _ in 0..SPAWN_TRIALS {
            let candidate =
                DESTRUCTIBLE_SPAWN_POINTS[self.rng.random_range(0..DESTRUCTIBLE_SPAWN_POINTS.len())];
            let dx = candidate.x - vehicle_pos.x;
            let dz = candidate.z - vehicle_pos.z;
            if (dx * dx + dz * dz).sqrt() < SPAWN_VEHICLE_CLEARANCE {
                continue;
            }
            let occupied = self.destructibles.iter().any(|p| {
                p.is_intact() && (p.position - candidate).length() < SPAWN_PICKUP_CLEARANCE
            });
            if !occupied {
                point = Some(candidate);
                break;
            }
        }
        let point = point?;
        let color = PROP_COLORS[self.rng.random_range(0..PROP_COLORS.len())].to_string();
        let prop = self.destructibles.iter_mut().find(|p| p.id == id)?;
        prop.position = Vec3::new(point.x, 0.6, point.z);
        prop.color = color;
        prop.phase = PropPhase::Intact;
        Some(WorldEvent::PropRespawned { id })
    }
}

/// Deterministic fragment launch velocities for a burst seed.
///
/// Remote peers replay the same seed and see the same debris.
pub fn fragment_impulses(burst_seed: u32) -> Vec<Vec3> {
    let mut rng = Pcg32::seed_from_u64(burst_seed as u64);
    (0..FRAGMENT_COUNT)
        .map(|_| {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let radial = 2.0 + rng.random::<f32>() * 3.0;
            let up = 3.0 + rng.random::<f32>() * 2.5;
            Vec3::new(angle.cos() * radial, up, angle.sin() * radial)
        })
        .collect()
}

fn static_obstacles() -> Vec<Obstacle> {
    use crate::consts::TRACK_SIZE;
    let half = TRACK_SIZE * 0.5;
    vec![
        Obstacle {
            id: "wall-north",
            position: Vec3::new(0.0, 1.0, half),
            size: Vec3::new(TRACK_SIZE, 2.0, 1.0),
            material: CollisionMaterial::Hard,
            movable: false,
            color: "#64748b",
        },
        Obstacle {
            id: "wall-south",
            position: Vec3::new(0.0, 1.0, -half),
            size: Vec3::new(TRACK_SIZE, 2.0, 1.0),
            material: CollisionMaterial::Hard,
            movable: false,
            color: "#64748b",
        },
        Obstacle {
            id: "wall-east",
            position: Vec3::new(half, 1.0, 0.0),
            size: Vec3::new(1.0, 2.0, TRACK_SIZE),
            material: CollisionMaterial::Hard,
            movable: false,
            color: "#64748b",
        },
        Obstacle {
            id: "wall-west",
            position: Vec3::new(-half, 1.0, 0.0),
            size: Vec3::new(1.0, 2.0, TRACK_SIZE),
            material: CollisionMaterial::Hard,
            movable: false,
            color: "#64748b",
        },
        Obstacle {
            id: "truck-1",
            position: Vec3::new(-14.0, 1.2, 18.0),
            size: Vec3::new(2.4, 2.4, 5.2),
            material: CollisionMaterial::Hard,
            movable: false,
            color: "#ef4444",
        },
        Obstacle {
            id: "truck-2",
            position: Vec3::new(16.0, 1.2, -15.0),
            size: Vec3::new(2.4, 2.4, 5.2),
            material: CollisionMaterial::Hard,
            movable: false,
            color: "#3b82f6",
        },
    ]
}

fn movable_obstacles() -> Vec<Obstacle> {
    vec![
        Obstacle {
            id: "cone-1",
            position: Vec3::new(18.0, 0.5, 4.0),
            size: Vec3::new(0.7, 1.0, 0.7),
            material: CollisionMaterial::Soft,
            movable: true,
            color: "#fb923c",
        },
        Obstacle {
            id: "cone-2",
            position: Vec3::new(-18.0, 0.5, -4.0),
            size: Vec3::new(0.7, 1.0, 0.7),
            material: CollisionMaterial::Soft,
            movable: true,
            color: "#fb923c",
        },
        Obstacle {
            id: "cone-3",
            position: Vec3::new(4.0, 0.5, -18.0),
            size: Vec3::new(0.7, 1.0, 0.7),
            material: CollisionMaterial::Soft,
            movable: true,
            color: "#fb923c",
        },
        Obstacle {
            id: "crate-1",
            position: Vec3::new(-4.0, 0.6, 18.5),
            size: Vec3::new(1.2, 1.2, 1.2),
            material: CollisionMaterial::Medium,
            movable: true,
            color: "#d6a662",
        },
        Obstacle {
            id: "crate-2",
            position: Vec3::new(10.0, 0.6, 16.0),
            size: Vec3::new(1.2, 1.2, 1.2),
            material: CollisionMaterial::Medium,
            movable: true,
            color: "#d6a662",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn far_away() -> Vec3 {
        Vec3::new(500.0, 0.0, 500.0)
    }

    #[test]
    fn test_initial_population() {
        let world = World::new(3, 30.0);
        assert_eq!(world.pickups().len(), 6);
        assert_eq!(world.destructibles().len(), 5);
        assert!(world.destructibles().iter().all(|p| p.is_intact()));
        assert!(world.obstacles().count() >= 10);
    }

    #[test]
    fn test_proximity_collection() {
        let mut world = World::new(3, 30.0);
        let target = world.pickups()[0].clone();
        let events =
            world.step(1.0 / 60.0, 0.0, target.position, 0, &AssistTuning::default());
        assert!(events
            .iter()
            .any(|e| matches!(e, WorldEvent::PickupCollected { pickup } if pickup.id == target.id)));
        assert!(world.pickups().iter().all(|p| p.id != target.id));
    }

    #[test]
    fn test_spawn_respects_cap_and_clearances() {
        let mut world = World::new(3, 30.0);
        let assist = AssistTuning::default();
        let mut now = 0.0;
        for _ in 0..3000 {
            world.step(1.0 / 60.0, now, far_away(), 0, &assist);
            now += 1.0 / 60.0;
        }
        assert!(world.pickups().len() <= MAX_ACTIVE_PICKUPS);
        // pairwise spacing holds
        for (i, a) in world.pickups().iter().enumerate() {
            for b in world.pickups().iter().skip(i + 1) {
                let dx = a.position.x - b.position.x;
                let dz = a.position.z - b.position.z;
                assert!((dx * dx + dz * dz).sqrt() >= SPAWN_PICKUP_CLEARANCE - 1e-3);
            }
        }
    }

    #[test]
    fn test_no_spawn_near_vehicle() {
        let mut world = World::new(3, 30.0);
        let assist = AssistTuning::default();
        // park mid-field and run the policy for a while
        let parked = Vec3::new(10.0, 0.8, 0.0);
        let mut now = 0.0;
        for _ in 0..600 {
            world.step(1.0 / 60.0, now, parked, 0, &assist);
            now += 1.0 / 60.0;
        }
        for p in world.pickups() {
            let dx = p.position.x - parked.x;
            let dz = p.position.z - parked.z;
            // initial population ignores the rule; spawned pickups honor it
            if p.id >= 11 {
                assert!((dx * dx + dz * dz).sqrt() >= SPAWN_VEHICLE_CLEARANCE);
            }
        }
    }

    #[test]
    fn test_pickups_spawn_at_random_positions_in_bounds() {
        let assist = AssistTuning::default();
        let positions: Vec<Vec<(f32, f32)>> = [21u64, 22]
            .iter()
            .map(|&seed| {
                let mut world = World::new(seed, 30.0);
                world.pickups.clear();
                let mut now = 0.0;
                for _ in 0..1200 {
                    world.step(1.0 / 60.0, now, far_away(), 0, &assist);
                    now += 1.0 / 60.0;
                }
                world.pickups().iter().map(|p| (p.position.x, p.position.z)).collect()
            })
            .collect();

        // everything lands inside the playable area, clear of the edges
        for run in &positions {
            assert!(!run.is_empty());
            for &(x, z) in run {
                assert!(x.abs() <= 30.0 - SPAWN_EDGE_MARGIN);
                assert!(z.abs() <= 30.0 - SPAWN_EDGE_MARGIN);
            }
        }
        // placement is sampled per world, not drawn from a shared fixed menu
        assert_ne!(positions[0], positions[1]);
    }

    #[test]
    fn test_prop_break_threshold_and_respawn() {
        let mut world = World::new(3, 30.0);
        let id = world.destructibles()[0].id;

        assert!(world.strike_destructible(id, 2.0, 1.0).is_none());
        assert!(world.destructibles()[0].is_intact());

        let event = world.strike_destructible(id, 8.0, 1.0);
        assert!(matches!(event, Some(WorldEvent::PropBroken { id: got, .. }) if got == id));
        assert!(!world.destructibles()[0].is_intact());

        // a second strike on a broken prop does nothing
        assert!(world.strike_destructible(id, 8.0, 1.5).is_none());

        // before the cooldown: still broken
        world.step(1.0 / 60.0, 5.0, far_away(), 0, &AssistTuning::default());
        assert!(!world.destructibles().iter().find(|p| p.id == id).unwrap().is_intact());

        // after the cooldown: respawned intact
        let events = world.step(1.0 / 60.0, 11.0, far_away(), 0, &AssistTuning::default());
        assert!(events.iter().any(|e| matches!(e, WorldEvent::PropRespawned { id: got } if *got == id)));
        let prop = world.destructibles().iter().find(|p| p.id == id).unwrap().clone();
        assert!(prop.is_intact());

        // conservation: the break/respawn cycle never changes the prop count,
        // and no other intact prop shares the new spawn point
        assert_eq!(world.destructibles().len(), 5);
        for other in world.destructibles().iter().filter(|p| p.id != id && p.is_intact()) {
            assert!((other.position - prop.position).length() > 0.1);
        }
    }

    #[test]
    fn test_fragment_impulses_deterministic() {
        let a = fragment_impulses(77);
        let b = fragment_impulses(77);
        let c = fragment_impulses(78);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), FRAGMENT_COUNT);
        // debris always launches upward
        assert!(a.iter().all(|v| v.y > 0.0));
    }

    #[test]
    fn test_type_minimums_recover_after_collecting_everything() {
        let assist = AssistTuning::default();
        let mut world = World::new(6, 30.0);
        world.pickups.clear();
        let mut now = 0.0;
        for _ in 0..3600 {
            world.step(1.0 / 60.0, now, far_away(), 0, &assist);
            now += 1.0 / 60.0;
        }
        let stars = world.pickups().iter().filter(|p| p.kind == PickupKind::Star).count();
        let repairs = world.pickups().iter().filter(|p| p.kind == PickupKind::Repair).count();
        assert!(stars >= MIN_STARS, "only {stars} stars in play");
        assert!(repairs >= MIN_REPAIRS);
    }

    #[test]
    fn test_repair_assist_bias() {
        // with max assist chance forced to 1.0, a hurt player only sees repairs
        let assist = AssistTuning { repair_assist_chance: 1.0, ..Default::default() };
        let mut world = World::new(9, 30.0);
        world.pickups.clear();
        let mut now = 0.0;
        for _ in 0..1200 {
            world.step(1.0 / 60.0, now, far_away(), 80, &assist);
            now += 1.0 / 60.0;
        }
        assert!(!world.pickups().is_empty());
        assert!(world.pickups().iter().all(|p| p.kind == PickupKind::Repair));
    }

    #[test]
    fn test_same_seed_same_world() {
        let assist = AssistTuning::default();
        let mut a = World::new(123, 30.0);
        let mut b = World::new(123, 30.0);
        let mut now = 0.0;
        for _ in 0..1200 {
            let ea = a.step(1.0 / 60.0, now, far_away(), 30, &assist);
            let eb = b.step(1.0 / 60.0, now, far_away(), 30, &assist);
            assert_eq!(ea, eb);
            now += 1.0 / 60.0;
        }
    }
}
