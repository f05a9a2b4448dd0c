use criterion::{black_box, criterion_group, criterion_main, Criterion};

use common::shapes::{Position, Region};
use gridtree::{Config, Grid};
use rand::prelude::*;

fn world() -> Region {
    Region::new(0.0, 0.0, 128.0, 128.0)
}

fn populated_grid(rng: &mut StdRng, count: u32) -> (Grid<u32>, Vec<(u32, Position)>) {
    let mut grid = Grid::new_with_config(
        Position::new(0.0, 0.0),
        16.0,
        16.0,
        8,
        8,
        Config {
            leaf_capacity: 8,
            cell_depth: 4,
        },
    )
    .unwrap();
    let mut residents = Vec::with_capacity(count as usize);
    for handle in 0..count {
        let position = world().random_position_inside(rng);
        grid.insert(handle, position).unwrap();
        residents.push((handle, position));
    }
    (grid, residents)
}

fn insert_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("grid_insert", |b| {
        b.iter_batched(
            || {
                let (grid, _) = populated_grid(&mut rng, 1_000);
                let position = world().random_position_inside(&mut rng);
                (grid, position)
            },
            |(mut grid, position)| {
                grid.insert(black_box(1_000_000), position).unwrap();
                grid
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn remove_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("grid_remove", |b| {
        b.iter_batched(
            || {
                let (grid, residents) = populated_grid(&mut rng, 1_000);
                let (handle, position) = residents[rng.gen_range(0..residents.len())];
                (grid, handle, position)
            },
            |(mut grid, handle, position)| {
                grid.remove(black_box(handle), position).unwrap();
                grid
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn relocate_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let (mut grid, mut residents) = populated_grid(&mut rng, 1_000);
    c.bench_function("grid_relocate", |b| {
        b.iter(|| {
            let index = rng.gen_range(0..residents.len());
            let (handle, old) = residents[index];
            let new = world().random_position_inside(&mut rng);
            grid.relocate(black_box(handle), old, new).unwrap();
            residents[index].1 = new;
        })
    });
}

fn leaf_objects_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let (grid, _) = populated_grid(&mut rng, 1_000);
    c.bench_function("grid_leaf_objects", |b| {
        b.iter(|| {
            let position = world().random_position_inside(&mut rng);
            let count = grid.leaf_objects(black_box(position)).unwrap().count();
            black_box(count)
        })
    });
}

criterion_group!(
    grid_benchmarks,
    insert_benchmark,
    remove_benchmark,
    relocate_benchmark,
    leaf_objects_benchmark
);
criterion_main!(grid_benchmarks);
