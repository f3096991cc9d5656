//! Benchmarks for world ticks, daily hooks and route finding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tile_ecology::pathfinding::{solve_path, PathGraph};
use tile_ecology::terrain::GenerationMode;
use tile_ecology::World;

fn seeded_world(size: u32, prey: u32, predators: u32) -> World {
    let mut world = World::new(size, size).expect("valid world size");
    world
        .generate_terrain(207, 0.32, 0.0, GenerationMode::Default)
        .expect("terrain generates");
    world.sprout_initial_food();
    world.spawn_animals(prey, predators).expect("spawn tile exists");
    world
}

fn benchmark_world_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_update");

    for population in [20u32, 100, 400].iter() {
        let mut world = seeded_world(100, *population, population / 10);

        // Warm up so animals have spread out
        for _ in 0..50 {
            world.step(0.1);
        }
        world.drain_notifications();

        group.bench_with_input(BenchmarkId::new("prey", population), population, |b, _| {
            b.iter(|| {
                world.update(black_box(0.1));
                world.drain_notifications();
            });
        });
    }

    group.finish();
}

fn benchmark_new_day(c: &mut Criterion) {
    let mut world = seeded_world(100, 100, 10);
    let spd = world.config().simulation.seconds_per_day;

    c.bench_function("world_step_full_day", |b| {
        b.iter(|| {
            world.step(black_box(spd));
            world.drain_notifications();
        });
    });
}

fn benchmark_pathfinding(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar");

    for size in [50u32, 100, 200].iter() {
        let mut world = World::new(*size, *size).expect("valid world size");
        world
            .generate_terrain(207, 0.32, 0.0, GenerationMode::Default)
            .expect("terrain generates");
        let graph = PathGraph::build(world.grid());
        let land = world.grass_tiles();
        let (Some(&from), Some(&to)) = (land.first(), land.last()) else {
            continue;
        };

        group.bench_with_input(BenchmarkId::new("corner_to_corner", size), size, |b, _| {
            b.iter(|| solve_path(black_box(&graph), black_box(from), black_box(to)));
        });
    }

    group.finish();
}

fn benchmark_terrain(c: &mut Criterion) {
    let mut world = World::new(100, 100).expect("valid world size");

    c.bench_function("generate_terrain_100", |b| {
        b.iter(|| {
            world
                .generate_terrain(black_box(207), 0.32, 0.0, GenerationMode::Default)
                .expect("terrain generates");
            world.drain_notifications();
        });
    });
}

criterion_group!(
    benches,
    benchmark_world_update,
    benchmark_new_day,
    benchmark_pathfinding,
    benchmark_terrain,
);
criterion_main!(benches);
