//! Impact scoring and contact bookkeeping
//!
//! Converts collision contacts into integer damage deltas. Severity scales
//! with impact speed, how squarely the hit lands on the nose, and the
//! material tier of the other body. A debounce window keeps one physical
//! crash from registering as a burst of separate hits, and sustained grinding
//! against hard geometry drips low damage on a slower cadence.

use crate::consts::DAMAGE_DEBOUNCE_SEC;
use crate::sim::state::CollisionMaterial;
use crate::tuning::{AssistTuning, CarProfile};

/// Light contact, cosmetic feedback territory
pub const DAMAGE_TIER_LOW: u32 = 5;
/// Noticeable hit
pub const DAMAGE_TIER_MEDIUM: u32 = 15;
/// Major crash
pub const DAMAGE_TIER_HIGH: u32 = 30;

/// Seconds between scrape damage ticks while grinding on hard geometry
const SCRAPE_INTERVAL_SEC: f64 = 0.72;
/// Minimum speed for scraping to count
const SCRAPE_MIN_SPEED: f32 = 2.0;
/// Base damage per scrape tick before car/assist scaling
const SCRAPE_BASE: f32 = 0.8;

/// Raw severity of one impact, before per-car and assist scaling.
///
/// `alignment` is the forward-axis component of the contact direction,
/// 0 for a pure side scrape and 1 for a head-on hit.
pub fn impact_base_damage(material: CollisionMaterial, speed: f32, alignment: f32) -> f32 {
    let speed_factor = (speed.abs() / 11.0).min(1.25);
    let alignment_factor = 0.55 + alignment.clamp(0.0, 1.0) * 0.75;
    let base = 15.0 * speed_factor * alignment_factor * material.damage_scale();
    base.max(1.0)
}

/// HUD label for an impact's severity tier
pub fn impact_label(material: CollisionMaterial, damage: u32, alignment: f32) -> &'static str {
    if alignment < 0.25 {
        return "Side scrape";
    }
    match material {
        CollisionMaterial::Soft => "Soft bump",
        CollisionMaterial::Medium => {
            if damage < DAMAGE_TIER_MEDIUM {
                "Light hit"
            } else {
                "Crate hit"
            }
        }
        CollisionMaterial::Hard => {
            if damage < DAMAGE_TIER_HIGH {
                "Hard hit"
            } else {
                "Big crash"
            }
        }
    }
}

/// Feedback strength for shake/rumble, clamped to the visible range
pub fn hit_strength(material: CollisionMaterial, speed: f32) -> f32 {
    let bonus = match material {
        CollisionMaterial::Hard => 0.25,
        CollisionMaterial::Medium => 0.1,
        CollisionMaterial::Soft => 0.0,
    };
    (speed.abs() / 10.0 + bonus).clamp(0.16, 1.0)
}

/// Outcome of one accepted impact
#[derive(Debug, Clone, PartialEq)]
pub struct HitReport {
    pub damage: u32,
    pub strength: f32,
    pub label: &'static str,
}

/// Debounces impacts and meters scrape damage.
///
/// Time is the simulation clock in seconds, not wall time, so replaying the
/// same input stream reproduces the same damage sequence.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    last_damage_at: f64,
    hard_contacts: u32,
    scrape_timer: f64,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self {
            last_damage_at: f64::NEG_INFINITY,
            hard_contacts: 0,
            scrape_timer: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Track an ongoing contact with hard geometry for scrape metering
    pub fn contact_started(&mut self, material: CollisionMaterial) {
        if material == CollisionMaterial::Hard {
            self.hard_contacts += 1;
        }
    }

    pub fn contact_ended(&mut self, material: CollisionMaterial) {
        if material == CollisionMaterial::Hard {
            self.hard_contacts = self.hard_contacts.saturating_sub(1);
            if self.hard_contacts == 0 {
                self.scrape_timer = 0.0;
            }
        }
    }

    /// Score an impact, or return None while the debounce window is open.
    ///
    /// `shield_active` swaps in the assist shield damage scale.
    pub fn on_impact(
        &mut self,
        now: f64,
        material: CollisionMaterial,
        speed: f32,
        alignment: f32,
        profile: &CarProfile,
        assist: &AssistTuning,
        shield_active: bool,
    ) -> Option<HitReport> {
        if now - self.last_damage_at < DAMAGE_DEBOUNCE_SEC {
            return None;
        }
        self.last_damage_at = now;

        let shield_scale = if shield_active { assist.shield_damage_scale } else { 1.0 };
        let scaled = impact_base_damage(material, speed, alignment)
            * profile.damage_taken_mult
            * assist.damage_taken_scale
            * shield_scale;
        let damage = (scaled.round() as u32).max(1);

        let label = impact_label(material, damage, alignment);
        log::debug!(
            "impact: {:?} speed {:.1} alignment {:.2} -> {} damage ({})",
            material,
            speed,
            alignment,
            damage,
            label
        );
        Some(HitReport {
            damage,
            strength: hit_strength(material, speed),
            label,
        })
    }

    /// Meter scrape damage while grinding along hard geometry.
    ///
    /// Returns the damage to apply this tick, usually zero.
    pub fn tick_scrape(
        &mut self,
        dt: f64,
        speed: f32,
        profile: &CarProfile,
        assist: &AssistTuning,
        shield_active: bool,
    ) -> u32 {
        if self.hard_contacts == 0 || speed.abs() <= SCRAPE_MIN_SPEED {
            self.scrape_timer = 0.0;
            return 0;
        }
        self.scrape_timer += dt;
        if self.scrape_timer < SCRAPE_INTERVAL_SEC {
            return 0;
        }
        self.scrape_timer = 0.0;

        let shield_scale = if shield_active { assist.shield_damage_scale } else { 1.0 };
        let scaled =
            SCRAPE_BASE * profile.damage_taken_mult * assist.damage_taken_scale * shield_scale;
        scaled.round() as u32
    }

    pub fn scraping(&self) -> bool {
        self.hard_contacts > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::CarProfileId;

    fn steady() -> &'static CarProfile {
        CarProfileId::Steady.profile()
    }

    #[test]
    fn test_base_damage_head_on_hard() {
        // 15 * (10/11) * 1.3 * 1.4 rounds to 25
        let base = impact_base_damage(CollisionMaterial::Hard, 10.0, 1.0);
        assert_eq!(base.round() as u32, 25);
    }

    #[test]
    fn test_base_damage_floor() {
        let base = impact_base_damage(CollisionMaterial::Soft, 0.1, 0.0);
        assert_eq!(base, 1.0);
    }

    #[test]
    fn test_speed_factor_caps() {
        let fast = impact_base_damage(CollisionMaterial::Hard, 50.0, 1.0);
        let capped = impact_base_damage(CollisionMaterial::Hard, 11.0 * 1.25, 1.0);
        assert!((fast - capped).abs() < 1e-4);
    }

    #[test]
    fn test_debounce_window() {
        let assist = AssistTuning::default();
        let mut resolver = CollisionResolver::new();

        let first = resolver.on_impact(1.0, CollisionMaterial::Hard, 10.0, 1.0, steady(), &assist, false);
        assert!(first.is_some());
        // inside the window: swallowed
        let second = resolver.on_impact(1.2, CollisionMaterial::Hard, 10.0, 1.0, steady(), &assist, false);
        assert!(second.is_none());
        // window elapsed
        let third = resolver.on_impact(1.4, CollisionMaterial::Hard, 10.0, 1.0, steady(), &assist, false);
        assert!(third.is_some());
    }

    #[test]
    fn test_shield_reduces_damage() {
        let assist = AssistTuning::default();
        let mut a = CollisionResolver::new();
        let mut b = CollisionResolver::new();
        let plain = a
            .on_impact(1.0, CollisionMaterial::Hard, 10.0, 1.0, steady(), &assist, false)
            .unwrap();
        let shielded = b
            .on_impact(1.0, CollisionMaterial::Hard, 10.0, 1.0, steady(), &assist, true)
            .unwrap();
        assert!(shielded.damage < plain.damage);
        assert!(shielded.damage >= 1);
    }

    #[test]
    fn test_side_scrape_label() {
        assert_eq!(impact_label(CollisionMaterial::Hard, 20, 0.1), "Side scrape");
        assert_eq!(impact_label(CollisionMaterial::Hard, 35, 0.9), "Big crash");
        assert_eq!(impact_label(CollisionMaterial::Soft, 3, 0.9), "Soft bump");
    }

    #[test]
    fn test_scrape_metering() {
        let assist = AssistTuning::default();
        let mut resolver = CollisionResolver::new();
        resolver.contact_started(CollisionMaterial::Hard);

        // not enough accumulated time yet
        assert_eq!(resolver.tick_scrape(0.5, 6.0, steady(), &assist, false), 0);
        // crosses the interval
        let tick = resolver.tick_scrape(0.3, 6.0, steady(), &assist, false);
        assert!(tick >= 1);

        // too slow: timer resets, no damage
        assert_eq!(resolver.tick_scrape(2.0, 1.0, steady(), &assist, false), 0);

        resolver.contact_ended(CollisionMaterial::Hard);
        assert!(!resolver.scraping());
        assert_eq!(resolver.tick_scrape(2.0, 6.0, steady(), &assist, false), 0);
    }

    #[test]
    fn test_soft_contacts_do_not_scrape() {
        let assist = AssistTuning::default();
        let mut resolver = CollisionResolver::new();
        resolver.contact_started(CollisionMaterial::Soft);
        assert!(!resolver.scraping());
        assert_eq!(resolver.tick_scrape(5.0, 8.0, steady(), &assist, false), 0);
    }
}
