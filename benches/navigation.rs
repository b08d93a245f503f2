use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, black_box};
use glam::Vec3;

use svonav::math::Aabb;
use svonav::nav::{NavQuery, PathFinder, PathOptions, PathRequest, SearchAlgorithm};
use svonav::svo::{BuildConfig, Connectivity, NeighborResolver, ObstacleOracle, OctreeBuilder, OctreeData};

/// 64m cube at 1m voxels with a wall pierced by a single opening and a few
/// floating spheres
fn test_scene() -> (BuildConfig, ObstacleOracle) {
    let config = BuildConfig::for_volume(Vec3::ZERO, 32.0, 1.0).unwrap();
    let mut oracle = ObstacleOracle::new();
    oracle.add_box(Aabb::new(Vec3::new(-2.0, -32.0, -32.0), Vec3::new(2.0, 32.0, -4.0)));
    oracle.add_box(Aabb::new(Vec3::new(-2.0, -32.0, 4.0), Vec3::new(2.0, 32.0, 32.0)));
    oracle.add_box(Aabb::new(Vec3::new(-2.0, -32.0, -4.0), Vec3::new(2.0, -4.0, 4.0)));
    oracle.add_box(Aabb::new(Vec3::new(-2.0, 4.0, -4.0), Vec3::new(2.0, 32.0, 4.0)));
    for i in 0..6 {
        let t = i as f32;
        oracle.add_sphere(Vec3::new(-16.0 + t, t * 4.0 - 12.0, 12.0 - t * 3.0), 3.0);
        oracle.add_sphere(Vec3::new(16.0 - t, 12.0 - t * 4.0, t * 3.0 - 12.0), 2.5);
    }
    (config, oracle)
}

fn built_scene() -> (OctreeData, ObstacleOracle) {
    let (config, oracle) = test_scene();
    let data = OctreeBuilder::new(config).unwrap().build(&oracle).unwrap();
    (data, oracle)
}

fn bench_build_64(c: &mut Criterion) {
    let (config, oracle) = test_scene();
    let builder = OctreeBuilder::new(config).unwrap();

    c.bench_function("navdata_build_64", |b| {
        b.iter(|| builder.build(black_box(&oracle)).unwrap());
    });
}

fn bench_locate(c: &mut Criterion) {
    let (data, _) = built_scene();

    c.bench_function("navdata_locate", |b| {
        let mut i = 0u32;
        b.iter(|| {
            i = i.wrapping_add(1);
            let t = (i % 1000) as f32 * 0.063;
            black_box(data.locate(Vec3::new(t - 31.5, 31.5 - t, t * 0.5 - 15.0)).ok())
        });
    });
}

fn bench_neighbors(c: &mut Criterion) {
    let (data, _) = built_scene();
    let address = data.locate(Vec3::new(-4.5, 0.5, 0.5)).unwrap();

    let faces = NeighborResolver::new(&data, Connectivity::Faces6);
    c.bench_function("neighbors_faces6", |b| {
        b.iter(|| black_box(faces.neighbors(black_box(address))));
    });

    let full = NeighborResolver::new(&data, Connectivity::Full26);
    c.bench_function("neighbors_full26", |b| {
        b.iter(|| black_box(full.neighbors(black_box(address))));
    });
}

fn bench_search(c: &mut Criterion) {
    let (data, _) = built_scene();
    let start = Vec3::new(-28.0, -20.0, -20.0);
    let goal = Vec3::new(28.0, 20.0, 20.0);

    let astar = PathOptions::default();
    c.bench_function("search_astar_through_opening", |b| {
        b.iter(|| PathFinder::new(&data, &astar).find_path(black_box(start), black_box(goal)).unwrap());
    });

    let theta = PathOptions {
        algorithm: SearchAlgorithm::ThetaStar,
        ..PathOptions::default()
    };
    c.bench_function("search_theta_through_opening", |b| {
        b.iter(|| PathFinder::new(&data, &theta).find_path(black_box(start), black_box(goal)).unwrap());
    });

    let lazy = PathOptions {
        algorithm: SearchAlgorithm::LazyThetaStar,
        ..PathOptions::default()
    };
    c.bench_function("search_lazy_theta_through_opening", |b| {
        b.iter(|| PathFinder::new(&data, &lazy).find_path(black_box(start), black_box(goal)).unwrap());
    });
}

fn bench_query_batch(c: &mut Criterion) {
    let (data, oracle) = built_scene();
    let query = NavQuery::new(Arc::new(data), Arc::new(oracle));
    let requests: Vec<PathRequest> = (0..16)
        .map(|i| {
            let t = i as f32 * 3.0;
            PathRequest::new(Vec3::new(-28.0, t - 24.0, -20.0), Vec3::new(28.0, 20.0 - t, 20.0))
        })
        .collect();

    c.bench_function("query_batch_16", |b| {
        b.iter(|| black_box(query.find_paths(&requests)));
    });
}

criterion_group!(
    benches,
    bench_build_64,
    bench_locate,
    bench_neighbors,
    bench_search,
    bench_query_batch,
);
criterion_main!(benches);
