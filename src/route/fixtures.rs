//! Small road networks shared by the router tests
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::graph::{Member, MemoryGraph, Node, Relation, Way};

/// Square `N1 - N2 - N3 - N4 - N1`, one way per edge (`w12`, `w23`, `w34`,
/// `w41`). Going through `N2` is the shorter way from `N1` to `N3`.
pub(crate) fn cycle() -> MemoryGraph {
    square(Way::new(12, &[1, 2]))
}

fn square(w12: Way) -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    graph
        .add_node(Node::new(1, 0.0, 0.0))
        .add_node(Node::new(2, 0.0, 0.01))
        .add_node(Node::new(3, 0.01, 0.01))
        .add_node(Node::new(4, 0.01, -0.005))
        .add_way(w12)
        .add_way(Way::new(23, &[2, 3]))
        .add_way(Way::new(34, &[3, 4]))
        .add_way(Way::new(41, &[4, 1]));
    graph
}

/// [`cycle`] with `w12` only drivable from `N2` to `N1`
pub(crate) fn cycle_with_oneway() -> MemoryGraph {
    square(Way::new(12, &[1, 2]).with_tag("oneway", "-1"))
}

fn restriction(id: i64, kind: &str, from: i64, via: i64, to: i64) -> Relation {
    Relation::new(id, vec![
        Member::way(from, "from"),
        Member::node(via, "via"),
        Member::way(to, "to"),
    ])
    .with_tag("type", "restriction")
    .with_tag("restriction", kind)
}

/// [`cycle`] where turning from `w12` onto `w23` at `N2` is forbidden
pub(crate) fn cycle_no_right_turn() -> MemoryGraph {
    let mut graph = cycle();
    graph.add_relation(restriction(1, "no_right_turn", 12, 2, 23));
    graph
}

/// Crossing at `N5`: `w1` comes in from the west (`N1`), `w2` leaves east
/// (`N2`), `w3` north (`N3`), `w4` south (`N4`). `w23` links `N2` and `N3`.
/// Coming in on `w1`, only `w2` may be taken.
pub(crate) fn only_straight() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    graph
        .add_node(Node::new(1, 0.0, -0.01))
        .add_node(Node::new(2, 0.0, 0.01))
        .add_node(Node::new(3, 0.01, 0.0))
        .add_node(Node::new(4, -0.01, 0.0))
        .add_node(Node::new(5, 0.0, 0.0))
        .add_way(Way::new(1, &[1, 5]))
        .add_way(Way::new(2, &[5, 2]))
        .add_way(Way::new(3, &[5, 3]))
        .add_way(Way::new(4, &[5, 4]))
        .add_way(Way::new(23, &[2, 3]))
        .add_relation(restriction(1, "only_straight_on", 1, 5, 2));
    graph
}

/// `S(N1) -w10- V(N2) -w11- X(N3)` with a block `X -w12- N4 -w13- N5 -w14- X`
/// and `w15` from `V` to `T(N6)`. Coming in on `w10`, only `w11` may be
/// taken at `V`, so reaching `T` means going round the block and back.
pub(crate) fn forced_loop() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    graph
        .add_node(Node::new(1, 0.0, 0.0))
        .add_node(Node::new(2, 0.0, 0.01))
        .add_node(Node::new(3, 0.0, 0.02))
        .add_node(Node::new(4, 0.005, 0.025))
        .add_node(Node::new(5, -0.005, 0.025))
        .add_node(Node::new(6, 0.01, 0.01))
        .add_way(Way::new(10, &[1, 2]))
        .add_way(Way::new(11, &[2, 3]))
        .add_way(Way::new(12, &[3, 4]))
        .add_way(Way::new(13, &[4, 5]))
        .add_way(Way::new(14, &[5, 3]))
        .add_way(Way::new(15, &[2, 6]))
        .add_relation(restriction(1, "only_straight_on", 10, 2, 11));
    graph
}

/// Oneway roundabout `N1 -> N2 -> N3 -> N1` (`w100`), entered from `N10`
/// at `N2` (`w101`) and left towards `N30` at `N3` (`w102`)
pub(crate) fn roundabout() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    graph
        .add_node(Node::new(1, 0.0, 0.0))
        .add_node(Node::new(2, 0.001, 0.001))
        .add_node(Node::new(3, 0.0, 0.002))
        .add_node(Node::new(10, 0.003, 0.001))
        .add_node(Node::new(30, -0.002, 0.002))
        .add_way(
            Way::new(100, &[1, 2, 3, 1])
                .with_tag("highway", "primary")
                .with_tag("junction", "roundabout"),
        )
        .add_way(Way::new(101, &[10, 2]).with_tag("highway", "residential"))
        .add_way(Way::new(102, &[3, 30]).with_tag("highway", "residential"));
    graph
}

/// `size` x `size` lattice, node `r * size + c + 1` at row `r`, column `c`.
/// Every edge is its own way and gets a random `oneway` tag.
pub(crate) fn random_grid(size: i64, seed: u64) -> MemoryGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = MemoryGraph::new();
    let id = |r: i64, c: i64| r * size + c + 1;
    for r in 0..size {
        for c in 0..size {
            graph.add_node(Node::new(
                id(r, c),
                r as f64 * 0.001,
                c as f64 * 0.001 + rng.gen_range(0.0..0.0002),
            ));
        }
    }
    let mut way_id = 1;
    for r in 0..size {
        for c in 0..size {
            let mut edges = Vec::new();
            if c + 1 < size {
                edges.push(id(r, c + 1));
            }
            if r + 1 < size {
                edges.push(id(r + 1, c));
            }
            for other in edges {
                let mut way = Way::new(way_id, &[id(r, c), other]);
                match rng.gen_range(0..6) {
                    0 => way = way.with_tag("oneway", "yes"),
                    1 => way = way.with_tag("oneway", "-1"),
                    _ => {}
                }
                graph.add_way(way);
                way_id += 1;
            }
        }
    }
    graph
}
