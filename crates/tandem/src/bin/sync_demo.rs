//! # Sync Demo
//!
//! Drops a few balls onto a kinematic paddle and prints what the control
//! thread sees each tick.
//!
//! Usage: `sync_demo [world.toml]`

use std::thread;
use std::time::Duration;

use tandem::{
    BallisticEngine, BodyOptions, DebugDrawMode, PhysicsWorld, SceneNode, SceneObject,
    ShapeOptions, Vec3, WorldConfig,
};

const TICKS: u32 = 120;
const FRAME: Duration = Duration::from_millis(16);

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match WorldConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load {path}: {err}");
                std::process::exit(1);
            }
        },
        None => WorldConfig::default()
            .with_max_bodies(64)
            .with_debug_draw_mode(DebugDrawMode::DRAW_AABB | DebugDrawMode::DRAW_CONTACT_POINTS),
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TANDEM - SYNC DEMO                                       ║");
    println!("║         Simulation thread ⇄ control thread, one buffer           ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!("  slots: {}  step: {}s  gravity: {:?}", config.max_bodies, config.fixed_time_step, config.gravity);

    let (mut world, worker) = match PhysicsWorld::launch(config, BallisticEngine::new()) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("failed to start: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&mut world) {
        eprintln!("session failed: {err}");
        std::process::exit(1);
    }

    drop(world);
    if let Some(stats) = worker.join() {
        println!();
        println!("  worker: {} round trips, {} steps, {} commands", stats.round_trips, stats.steps, stats.commands);
    }
}

fn run(world: &mut PhysicsWorld) -> tandem::TandemResult<()> {
    let paddle = SceneNode::new().shared();
    let paddle_body = world.add_body(paddle.clone(), BodyOptions::kinematic())?;
    world.add_shapes(paddle_body, ShapeOptions::cuboid(Vec3::new(2.0, 0.2, 2.0)))?;

    let mut balls = Vec::new();
    for i in 0..3u8 {
        let x = f32::from(i) - 1.0;
        let node = SceneNode::new().with_position(Vec3::new(x, 4.0 + f32::from(i), 0.0)).shared();
        let body = world.add_body(node.clone(), BodyOptions::dynamic(1.0).with_collision_events())?;
        world.add_shapes(body, ShapeOptions::sphere(0.5))?;
        balls.push((body, node));
    }

    for tick in 0..TICKS {
        // Sway the paddle from the scene side
        let sway = (tick as f32 * 0.05).sin();
        paddle.write().set_position(Vec3::new(sway, 0.0, 0.0));

        let Some(stats) = world.tick()? else {
            thread::sleep(FRAME);
            continue;
        };

        for event in world.drain_collision_events() {
            println!("  [tick {tick:3}] {event:?}");
        }

        if tick % 20 == 0 {
            let heights: Vec<String> = balls
                .iter()
                .map(|(_, node)| format!("{:6.2}", node.read().position().y))
                .collect();
            let debug_vertices = world.debug_view().map_or(0, |v| v.draw_range().len());
            println!(
                "  [tick {tick:3}] synced {:2}  heights [{}]  debug vertices {:4}  step {:?}",
                stats.bodies_synced,
                heights.join(", "),
                debug_vertices,
                stats.last_step_duration
            );
            world.mark_debug_uploaded();
        }

        thread::sleep(FRAME);
    }

    for (body, _) in &balls {
        world.remove_body(*body)?;
    }
    world.tick()?;
    println!("  bodies left: {}", world.body_count());
    Ok(())
}
