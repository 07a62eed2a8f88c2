//! Starsunder headless battle demo.
//!
//! Runs a scripted two-ship skirmish inside an asteroid field, entirely in
//! memory: the simple physics backend drives contacts and the recording
//! renderer stands in for a screen. Useful for watching the split pipeline
//! work from a terminal.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --ticks 600 --seed 7
//! ```

use clap::Parser;
use glam::Vec2;
use log::{info, warn};

use starsunder::components::design::ShipDesign;
use starsunder::game::GameContext;
use starsunder::physics::simple::SimplePhysics;
use starsunder::render::headless::HeadlessRenderer;
use starsunder::resources::combatconfig::CombatConfig;

const INTERCEPTOR: &str = include_str!("../assets/ships/interceptor.json");
const FREIGHTER: &str = include_str!("../assets/ships/freighter.json");

/// Starsunder combat core demo
#[derive(Parser)]
#[command(version, about = "Headless modular-ship battle demo")]
struct Cli {
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Seed for asteroid placement.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Combat configuration file (INI).
    #[arg(long, default_value = "assets/config.ini")]
    config: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    fastrand::seed(cli.seed);

    let mut config = CombatConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("using default combat config: {}", e);
    }

    let mut ctx = GameContext::new(
        Box::new(SimplePhysics::new()),
        Box::new(HeadlessRenderer::new()),
        config,
    );

    let interceptor = ShipDesign::from_json(INTERCEPTOR).expect("bundled design is valid");
    let freighter = ShipDesign::from_json(FREIGHTER).expect("bundled design is valid");

    let left = ctx
        .spawn_ship(&interceptor, Vec2::new(-200.0, 0.0), 0.0, true)
        .expect("spawn left ship");
    let right = ctx
        .spawn_ship(&freighter, Vec2::new(200.0, 0.0), std::f32::consts::PI, false)
        .expect("spawn right ship");

    for _ in 0..12 {
        let position = Vec2::new(
            fastrand::f32() * 600.0 - 300.0,
            fastrand::f32() * 400.0 - 200.0,
        );
        // Keep the spawn lanes clear.
        if position.x.abs() > 160.0 {
            continue;
        }
        let velocity = Vec2::new(fastrand::f32() * 20.0 - 10.0, fastrand::f32() * 20.0 - 10.0);
        let radius = 8.0 + fastrand::f32() * 16.0;
        if let Err(e) = ctx.spawn_asteroid(position, radius, velocity) {
            warn!("failed to spawn asteroid: {}", e);
        }
    }

    let dt = 1.0 / 60.0;
    for tick in 0..cli.ticks {
        // Every half second each surviving duelist fires at the other.
        if tick % 30 == 0 {
            exchange_fire(&mut ctx, &left, &right);
            exchange_fire(&mut ctx, &right, &left);
        }
        ctx.tick(dt);
    }

    info!(
        "battle over after {} ticks: {} ships, {} debris groups, {} asteroids, {} lasers in flight",
        cli.ticks,
        ctx.ship_count(),
        ctx.debris_count(),
        ctx.asteroid_count(),
        ctx.laser_count()
    );
    for id in ctx.ship_ids() {
        if let Some(ship) = ctx.ship(&id) {
            let ship = ship.borrow();
            info!(
                "  {} at {} with {} blocks",
                id,
                ship.position(),
                ship.active_block_count()
            );
        }
    }
    ctx.teardown();
}

/// Fire a laser from `shooter` toward `target`, if both still exist.
fn exchange_fire(ctx: &mut GameContext, shooter: &str, target: &str) {
    let Some(from) = ctx.ship(shooter).map(|s| s.borrow().position()) else {
        return;
    };
    let Some(to) = ctx.ship(target).map(|s| s.borrow().position()) else {
        return;
    };
    let direction = (to - from).normalize_or_zero();
    if direction == Vec2::ZERO {
        return;
    }
    // Muzzle offset keeps the bolt from spawning inside the shooter.
    let muzzle = from + direction * 48.0;
    if let Err(e) = ctx.spawn_laser(shooter, muzzle, direction * 300.0) {
        warn!("{} failed to fire: {}", shooter, e);
    }
}
