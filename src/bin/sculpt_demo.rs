//! Sculpting demo: carves and paints a block, walks the undo history, and
//! reports chunk and mesh statistics.
//!
//! Usage: cargo run --release --bin sculpt_demo -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Load a WorldConfig JSON file
//!   --save-config <PATH>  Write the effective config and exit
//!   --strokes <N>         Number of carving strokes (default: 8)
//!   --radius <R>          Carving brush radius in voxels (default: 4.0)

use std::path::PathBuf;
use std::time::Instant;

use glam::{Quat, Vec3};

use sculptr::voxel::{
    Axis, BrushPrimitive, CsgOp, CustomBrush, FaceMesher, VoxelEditManager, VoxelWorld, WorldConfig,
};

fn main() {
    sculptr::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let strokes = parse_u32_arg(&args, "--strokes").unwrap_or(8);
    let radius = parse_f32_arg(&args, "--radius").unwrap_or(4.0);

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => WorldConfig::load(&PathBuf::from(path)).expect("Failed to load config"),
        None => WorldConfig::default(),
    };

    if let Some(path) = parse_str_arg(&args, "--save-config") {
        config.save(&PathBuf::from(&path)).expect("Failed to save config");
        println!("Wrote config to {}", path);
        return;
    }

    println!("=== Sculptr Demo ===");
    println!("Chunk size: {}", config.chunk_size);
    println!("Undo queue: {}", config.undo_queue_size);
    println!("Strokes:    {} (radius {})", strokes, radius);
    println!();

    let mut world = VoxelWorld::new(config, FaceMesher::default()).expect("Invalid config");
    let mut history = VoxelEditManager::from_config(&config);

    let start = Instant::now();
    let block = BrushPrimitive::Box { half_extents: Vec3::splat(12.0) };
    world
        .apply_sdf(Vec3::splat(16.0), Quat::IDENTITY, &block, 1, false, Some(history.consumer()))
        .expect("Block stroke failed");

    // Carving strokes along a diagonal are merged into a single undo step
    history.set_merge(true);
    let carve = BrushPrimitive::Sphere { radius };
    for i in 0..strokes {
        let t = i as f32 / strokes.max(1) as f32;
        let at = Vec3::splat(6.0) + Vec3::splat(20.0) * t;
        world
            .apply_sdf(at, Quat::IDENTITY, &carve, 0, false, Some(history.consumer()))
            .expect("Carve stroke failed");
    }
    history.set_merge(false);

    let stamp = CustomBrush::new()
        .with(BrushPrimitive::Capsule { radius: 2.0, half_height: 6.0, axis: Axis::Y }, Vec3::ZERO, CsgOp::Union, 1.5)
        .with(BrushPrimitive::Sphere { radius: 2.5 }, Vec3::new(0.0, 6.0, 0.0), CsgOp::Difference, 1.0);
    world
        .apply_sdf(Vec3::new(16.0, 16.0, 28.0), Quat::IDENTITY, &stamp, 2, true, Some(history.consumer()))
        .expect("Stamp stroke failed");

    let rebuilt = world.update();
    report(&world, "sculpted", rebuilt);
    println!("  {} sculpt steps in {:.1}ms", history.undo_len(), start.elapsed().as_secs_f64() * 1000.0);

    let mut undone = 0;
    while history.undo(&mut world).expect("Undo failed") {
        undone += 1;
    }
    let rebuilt = world.update();
    report(&world, &format!("after {} undos", undone), rebuilt);

    while history.redo(&mut world).expect("Redo failed") {}
    let rebuilt = world.update();
    report(&world, "after redo", rebuilt);

    if let Some(hit) = world.ray_cast(Vec3::new(16.2, 40.0, 16.2), -Vec3::Y, 64.0) {
        println!(
            "Ray hit cell {} in chunk {:?} at distance {:.1}",
            hit.cell, hit.chunk, hit.distance
        );
    } else {
        println!("Ray missed");
    }
}

fn report(world: &VoxelWorld, label: &str, rebuilt: usize) {
    let voxels: usize = world.chunks().map(|c| c.voxel_count()).sum();
    let triangles: usize = world
        .chunks()
        .filter_map(|c| c.mesh())
        .map(|m| m.triangle_count())
        .sum();
    println!(
        "[{}] {} chunks, {} voxels, {} triangles ({} meshes rebuilt)",
        label,
        world.chunk_count(),
        voxels,
        triangles,
        rebuilt
    );
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
