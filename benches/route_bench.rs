use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use roadnav::{
    graph::{MemoryGraph, Node, NodeId, Way},
    metric::DistanceMetric,
    route::{DepthLimits, ModeConfig},
    vehicle::VehicleProfile,
};

/// `size` x `size` street grid, one way per block, every tenth block oneway
fn grid(size: i64) -> MemoryGraph {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut graph = MemoryGraph::new();
    let id = |r: i64, c: i64| r * size + c + 1;
    for r in 0..size {
        for c in 0..size {
            graph.add_node(Node::new(
                id(r, c),
                r as f64 * 0.001,
                c as f64 * 0.001,
            ));
        }
    }
    let mut way_id = 1;
    for r in 0..size {
        for c in 0..size {
            let right = (c + 1 < size).then(|| id(r, c + 1));
            let down = (r + 1 < size).then(|| id(r + 1, c));
            for other in right.into_iter().chain(down) {
                let mut way = Way::new(way_id, &[id(r, c), other])
                    .with_tag("highway", "residential");
                if rng.gen_ratio(1, 10) {
                    way = way.with_tag("oneway", "yes");
                }
                graph.add_way(way);
                way_id += 1;
            }
        }
    }
    graph
}

fn bench_routers(c: &mut Criterion) {
    let size = 40;
    let graph = grid(size);
    let car = VehicleProfile::car();
    let start = NodeId(1);
    let goal = NodeId(size * size);
    let mut group = c.benchmark_group("route");
    group.sample_size(20);
    for mode in [
        ModeConfig::DirectedDepthFirst {
            limits: DepthLimits { max_iterations: 100_000, ..Default::default() },
        },
        ModeConfig::Dijkstra,
        ModeConfig::MultiDijkstra,
        ModeConfig::AStar,
    ] {
        let router = mode.build(Box::new(DistanceMetric));
        group.bench_with_input(
            BenchmarkId::from_parameter(router.name()),
            &graph,
            |b, graph| {
                b.iter(|| router.route_to_node(graph, goal, start, &car));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_routers);
criterion_main!(benches);
