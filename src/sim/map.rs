//! Surface & terrain queries
//!
//! Tracks come in two shapes: a ring (square outer boundary minus a square
//! infield) and a closed path (polyline centerline with a road width). The
//! vehicle integrator only asks two questions each tick - "is this point on
//! the road?" and "how high is the ground here?" - and both must answer
//! bit-identically for the same map and seed.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{SPAWN_CLEARANCE, TRACK_SIZE};

/// Selectable track identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapId {
    #[default]
    Classic,
    City,
    Meadow,
    Procedural,
}

impl MapId {
    pub const ALL: [MapId; 4] = [MapId::Classic, MapId::City, MapId::Meadow, MapId::Procedural];

    pub fn label(self) -> &'static str {
        match self {
            MapId::Classic => "Classic",
            MapId::City => "City",
            MapId::Meadow => "Meadow",
            MapId::Procedural => "Forest Loop",
        }
    }
}

/// Road geometry strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrackShape {
    /// Road is the band between two concentric squares
    Ring { outer_half: f32, inner_half: f32 },
    /// Road follows a closed centerline polyline
    Path { points: Vec<Vec2> },
}

/// Checkpoint arch placed on the road (cosmetic + HUD)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub position: Vec3,
    pub yaw: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeVariant {
    Round,
    Cone,
}

/// Decorative scenery, exposed to the renderer and used by the spawner to
/// avoid blocked placements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub position: Vec2,
    pub scale: f32,
    pub variant: TreeVariant,
}

/// Full static description of one track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMap {
    pub id: MapId,
    pub seed: u64,
    pub shape: TrackShape,
    pub world_half: f32,
    pub road_width: f32,
    /// Start point on the road surface (y is nominal, see [`TrackMap::spawn_position`])
    pub start_position: Vec3,
    pub start_yaw: f32,
    pub terrain_amplitude: f32,
    pub terrain_frequency: f32,
    pub gates: Vec<Gate>,
    pub trees: Vec<Tree>,
}

#[inline]
fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

#[inline]
fn smooth_step(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp01((x - edge0) / (edge1 - edge0).max(0.0001));
    t * t * (3.0 - 2.0 * t)
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let denom = ab.length_squared();
    if denom <= 0.0001 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / denom).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Distance to the road centerline, plus which side of it the point lies on
struct RoadProximity {
    distance: f32,
    signed_distance: f32,
}

fn path_road_proximity(p: Vec2, points: &[Vec2]) -> RoadProximity {
    let mut min_dist = f32::INFINITY;
    let mut signed_distance = 0.0;
    if points.len() < 2 {
        return RoadProximity { distance: min_dist, signed_distance };
    }
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let ab = b - a;
        let denom = ab.length_squared();
        if denom <= 0.0001 {
            continue;
        }
        let t = ((p - a).dot(ab) / denom).clamp(0.0, 1.0);
        let closest = a + ab * t;
        let d = p - closest;
        let dist = d.length();
        if dist < min_dist {
            min_dist = dist;
            let cross = ab.x * d.y - ab.y * d.x;
            signed_distance = if cross >= 0.0 { dist } else { -dist };
        }
    }
    RoadProximity { distance: min_dist, signed_distance }
}

impl TrackMap {
    /// Look up a track. The seed only matters for [`MapId::Procedural`].
    pub fn get(id: MapId, seed: u64) -> TrackMap {
        match id {
            MapId::Classic => fixed_ring_map(id, 23.0, 11.0, 12.0, 20.0, 17.0, classic_trees()),
            MapId::City => fixed_ring_map(id, 24.0, 10.0, 14.0, 21.0, 17.5, city_trees()),
            MapId::Meadow => fixed_ring_map(id, 21.0, 12.0, 9.0, 18.0, 16.0, meadow_trees()),
            MapId::Procedural => procedural_map(seed),
        }
    }

    /// Whether the point (x, z) lies on the drivable road surface
    pub fn is_on_road(&self, x: f32, z: f32) -> bool {
        match &self.shape {
            TrackShape::Ring { outer_half, inner_half } => {
                (x.abs() <= *outer_half && z.abs() <= *outer_half)
                    && !(x.abs() < *inner_half && z.abs() < *inner_half)
            }
            TrackShape::Path { points } => {
                let half_width = self.road_width * 0.5;
                let p = Vec2::new(x, z);
                points.len() >= 2
                    && (0..points.len()).any(|i| {
                        distance_to_segment(p, points[i], points[(i + 1) % points.len()])
                            <= half_width
                    })
            }
        }
    }

    /// Deterministic ground height at (x, z).
    ///
    /// Flat maps return 0. Path maps layer ridged noise on a sinusoidal base,
    /// then blend toward a flattened, gently cross-sloped profile near the
    /// road so the driving line stays fair.
    pub fn terrain_height(&self, x: f32, z: f32) -> f32 {
        if self.terrain_amplitude <= 0.0 {
            return 0.0;
        }
        let f = self.terrain_frequency;
        let base = (x * f).sin() * 0.6 + (z * f * 1.08).cos() * 0.55;
        let cross = ((x + z) * f * 0.6).sin() * 0.42;
        let mut height = (base + cross) * self.terrain_amplitude;

        if let TrackShape::Path { points } = &self.shape {
            let ridge_a = ((x * f * 1.6).sin() * (z * f * 1.2).cos()).abs();
            let ridge_b = (((x - z) * f * 0.86).sin()).abs();
            height += (ridge_a * 0.9 + ridge_b * 0.7) * self.terrain_amplitude * 1.05;

            let road = path_road_proximity(Vec2::new(x, z), points);
            let side_slope_range = self.road_width * 2.2;
            let side_slope_fade =
                1.0 - smooth_step(self.road_width * 0.45, side_slope_range, road.distance);
            let side_slope_norm = (road.signed_distance
                / (self.road_width * 0.9).max(0.001))
            .clamp(-1.0, 1.0);
            let side_slope = side_slope_norm * self.terrain_amplitude * 0.06 * side_slope_fade;
            let road_base = ((x * f * 0.19).sin() * 0.55
                + (z * f * 0.17).cos() * 0.45
                + ((x + z) * f * 0.12).sin() * 0.35)
                * self.terrain_amplitude
                * 0.1
                + side_slope;
            let flatten_start = self.road_width * 0.68;
            let flatten_end = self.road_width * 4.6;
            let blend = smooth_step(flatten_start, flatten_end, road.distance);
            height = road_base + (height - road_base) * blend;
        }
        height
    }

    /// World position where the chassis is (re)spawned
    pub fn spawn_position(&self) -> Vec3 {
        let x = self.start_position.x;
        let z = self.start_position.z;
        Vec3::new(x, self.terrain_height(x, z) + SPAWN_CLEARANCE, z)
    }
}

fn fixed_ring_map(
    id: MapId,
    outer_half: f32,
    inner_half: f32,
    road_width: f32,
    start_z: f32,
    gate_offset: f32,
    trees: Vec<Tree>,
) -> TrackMap {
    TrackMap {
        id,
        seed: 0,
        shape: TrackShape::Ring { outer_half, inner_half },
        world_half: TRACK_SIZE / 2.0,
        road_width,
        start_position: Vec3::new(0.0, 0.38, start_z),
        start_yaw: std::f32::consts::FRAC_PI_2,
        terrain_amplitude: 0.0,
        terrain_frequency: 0.0,
        gates: ring_gates(gate_offset),
        trees,
    }
}

fn ring_gates(offset: f32) -> Vec<Gate> {
    vec![
        Gate { position: Vec3::new(0.0, 0.0, -offset), yaw: std::f32::consts::FRAC_PI_2 },
        Gate { position: Vec3::new(0.0, 0.0, offset), yaw: std::f32::consts::FRAC_PI_2 },
        Gate { position: Vec3::new(-offset, 0.0, 0.0), yaw: 0.0 },
        Gate { position: Vec3::new(offset, 0.0, 0.0), yaw: 0.0 },
    ]
}

fn tree(x: f32, z: f32, scale: f32, variant: TreeVariant) -> Tree {
    Tree { position: Vec2::new(x, z), scale, variant }
}

fn classic_trees() -> Vec<Tree> {
    use TreeVariant::*;
    vec![
        tree(-26.0, -25.0, 1.15, Round),
        tree(-23.0, 24.0, 1.05, Cone),
        tree(24.0, -24.0, 1.2, Round),
        tree(26.0, 23.0, 1.1, Cone),
        tree(-7.0, -3.0, 0.95, Round),
        tree(8.0, 5.0, 1.0, Round),
        tree(-3.0, 8.0, 0.9, Cone),
        tree(6.0, -7.0, 0.95, Cone),
    ]
}

fn city_trees() -> Vec<Tree> {
    use TreeVariant::*;
    vec![
        tree(-27.0, -22.0, 1.1, Cone),
        tree(-27.0, 22.0, 1.05, Cone),
        tree(27.0, -22.0, 1.1, Cone),
        tree(27.0, 22.0, 1.05, Cone),
        tree(-5.0, -2.0, 0.85, Round),
        tree(5.0, 2.0, 0.9, Round),
        tree(-2.0, 5.0, 0.85, Round),
        tree(2.0, -5.0, 0.85, Round),
    ]
}

fn meadow_trees() -> Vec<Tree> {
    use TreeVariant::*;
    vec![
        tree(-25.0, -24.0, 1.25, Round),
        tree(-24.0, 25.0, 1.15, Round),
        tree(25.0, -24.0, 1.2, Round),
        tree(24.0, 25.0, 1.15, Round),
        tree(-9.0, 3.0, 1.0, Cone),
        tree(9.0, -3.0, 1.0, Cone),
        tree(-4.0, -8.0, 0.92, Round),
        tree(4.0, 8.0, 0.92, Round),
        tree(-11.0, -10.0, 0.95, Cone),
        tree(11.0, 10.0, 0.95, Cone),
    ]
}

const PROCEDURAL_WORLD_HALF: f32 = 125.0;
const PROCEDURAL_ROAD_WIDTH: f32 = 7.2;
const PROCEDURAL_POINT_COUNT: usize = 20;

fn procedural_path(seed: u64) -> Vec<Vec2> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let min_radius = PROCEDURAL_WORLD_HALF * 0.44;
    let max_radius = PROCEDURAL_WORLD_HALF * 0.78;
    (0..PROCEDURAL_POINT_COUNT)
        .map(|i| {
            let t = i as f32 / PROCEDURAL_POINT_COUNT as f32;
            let jitter = (rng.random::<f32>() - 0.5) * 0.34;
            let angle = t * std::f32::consts::TAU + jitter;
            let radius = min_radius + rng.random::<f32>() * (max_radius - min_radius);
            Vec2::new(angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}

fn gate_from_segment(points: &[Vec2], idx: usize) -> Gate {
    let a = points[idx % points.len()];
    let b = points[(idx + 1) % points.len()];
    let mid = (a + b) * 0.5;
    Gate {
        position: Vec3::new(mid.x, 0.0, mid.y),
        yaw: (b.x - a.x).atan2(b.y - a.y),
    }
}

fn procedural_map(seed: u64) -> TrackMap {
    let points = procedural_path(seed);
    let start = points[0];
    let next = points[1];
    let start_yaw = (next.x - start.x).atan2(next.y - start.y);
    let gates = [2, 6, 10, 14, 18]
        .iter()
        .map(|&idx| gate_from_segment(&points, idx))
        .collect();

    let mut map = TrackMap {
        id: MapId::Procedural,
        seed,
        shape: TrackShape::Path { points },
        world_half: PROCEDURAL_WORLD_HALF,
        road_width: PROCEDURAL_ROAD_WIDTH,
        start_position: Vec3::new(start.x, 0.38, start.y),
        start_yaw,
        terrain_amplitude: 7.8,
        terrain_frequency: 0.012,
        gates,
        trees: Vec::new(),
    };
    map.trees = procedural_trees(seed, &map);
    map
}

/// Scatter forest trees off the road and away from the start line
fn procedural_trees(seed: u64, map: &TrackMap) -> Vec<Tree> {
    let mut rng = Pcg32::seed_from_u64(seed.wrapping_mul(23).wrapping_add(7));
    let mut trees = Vec::new();
    let half = map.world_half - 3.0;
    let target_count = 180;
    let start = Vec2::new(map.start_position.x, map.start_position.z);
    let TrackShape::Path { points } = &map.shape else {
        return trees;
    };
    // keep a wider margin clear than the road itself
    let clear_half_width = (map.road_width + 4.2) * 0.5;

    // bounded trials: give up rather than loop forever on a crowded seed
    for _ in 0..1000 {
        if trees.len() >= target_count {
            break;
        }
        let x = (rng.random::<f32>() * 2.0 - 1.0) * half;
        let z = (rng.random::<f32>() * 2.0 - 1.0) * half;
        let p = Vec2::new(x, z);
        if path_road_proximity(p, points).distance <= clear_half_width {
            continue;
        }
        if p.distance(start) < 12.0 {
            continue;
        }
        let scale = 0.82 + rng.random::<f32>() * 0.6;
        let variant = if rng.random::<f32>() > 0.46 { TreeVariant::Round } else { TreeVariant::Cone };
        trees.push(tree(x, z, scale, variant));
    }
    trees
}
