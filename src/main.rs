//! Headless demo drive
//!
//! Runs the simulation at 60 Hz with a scripted control track and a couple
//! of injected collisions, logging telemetry once a second. Useful for
//! eyeballing tuning changes without a renderer attached.

use mini_motors::input::DriveInput;
use mini_motors::sim::{MapId, Simulation, WorldEvent};
use mini_motors::tuning::CarProfileId;

const DT: f32 = 1.0 / 60.0;
const DEMO_SECONDS: f32 = 30.0;

fn scripted_input(t: f32) -> DriveInput {
    let mut input = DriveInput { forward: true, ..Default::default() };
    // weave along the ring, with a braking stretch near the end
    if (4.0..9.0).contains(&t) || (16.0..20.0).contains(&t) {
        input.right = true;
    } else if (10.0..14.0).contains(&t) {
        input.left = true;
    }
    if t > 26.0 {
        input.forward = false;
        input.backward = true;
    }
    input
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut sim = Simulation::new(MapId::Classic, 42, CarProfileId::Steady);
    log::info!("demo drive on {} for {DEMO_SECONDS}s", sim.map().id.label());

    let ticks = (DEMO_SECONDS / DT) as u32;
    for tick in 0..ticks {
        let t = tick as f32 * DT;
        let events = sim.tick(scripted_input(t), DT);

        // stage a head-on wall hit partway through
        if tick == 700 {
            sim.impact("hard-wall-east", 9.0);
            let run = sim.run();
            log::info!(
                "crash: \"{}\" damage now {}/{}",
                run.hit_fx().label,
                run.damage(),
                mini_motors::consts::MAX_DAMAGE
            );
        }

        for event in &events.world {
            match event {
                WorldEvent::PickupCollected { pickup } => {
                    log::info!("collected {:?} #{}", pickup.kind, pickup.id)
                }
                WorldEvent::PropBroken { id, burst_seed } => {
                    log::info!("smashed prop #{id} (burst {burst_seed})")
                }
                _ => {}
            }
        }
        if events.returned_to_spawn {
            log::info!("went out of bounds, returned to spawn");
        }

        if tick % 60 == 0 {
            let telemetry = sim.run().telemetry();
            let pos = sim.kinematics().position;
            log::info!(
                "t={t:>5.1}s speed {:>6.1} km/h steer {:>5.1} deg pos ({:>6.1}, {:>6.1}) score {}",
                telemetry.speed_kph,
                telemetry.steer_deg,
                pos.x,
                pos.z,
                sim.run().score()
            );
        }
    }

    let run = sim.run();
    log::info!(
        "demo done: score {} best {} damage {}/{}",
        run.score(),
        run.best_score(),
        run.damage(),
        mini_motors::consts::MAX_DAMAGE
    );
}
