use super::instrumentation;
use crate::geometry::{Coord, Rect};
use crate::quadtree::types::Point;
use crate::quadtree::QuadtreeBuilder;

fn region(sw: (f64, f64), ne: (f64, f64)) -> Rect {
    Rect::new(Coord::new(sw.0, sw.1), Coord::new(ne.0, ne.1))
}

#[test]
fn empty_tree_yields_nothing() {
    let builder = QuadtreeBuilder::new(region((0.0, 0.0), (100.0, 100.0)), 4).unwrap();
    let tree = builder.finalise();
    let hits = tree.query_vec(tree.region(), 0);
    assert!(hits.is_empty());
}

#[test]
fn full_region_query_returns_every_point() {
    let mut builder = QuadtreeBuilder::new(region((0.0, 0.0), (100.0, 100.0)), 4).unwrap();
    let mut expected = Vec::new();
    for i in 0..500u64 {
        let x = (i as f64 * 37.0) % 100.0;
        let y = (i as f64 * 53.0) % 100.0;
        builder.insert(Point::new(i, x, y)).unwrap();
        expected.push((i, x, y));
    }
    let tree = builder.finalise();
    let hits = tree.query_vec(tree.region(), 0);
    assert_eq!(hits.len(), expected.len());
    for (payload, x, y) in expected {
        assert!(hits
            .iter()
            .any(|p| p.payload == payload && p.x == x && p.y == y));
    }
}

#[test]
fn full_region_query_never_filters_per_point() {
    let mut builder = QuadtreeBuilder::new(region((0.0, 0.0), (100.0, 100.0)), 4).unwrap();
    for i in 0..500u64 {
        let x = (i as f64 * 37.0) % 100.0;
        let y = (i as f64 * 53.0) % 100.0;
        builder.insert(Point::new(i, x, y)).unwrap();
    }
    let tree = builder.finalise();

    instrumentation::reset();
    let hits = tree.query_vec(tree.region(), 0);
    assert_eq!(hits.len() as u64, tree.len());
    assert_eq!(
        instrumentation::filter_call_count(),
        0,
        "a query over the whole region is enclosed everywhere, so pointInRect-style \
         filtering should never run"
    );
}

#[test]
fn subregion_query_does_filter() {
    let mut builder = QuadtreeBuilder::new(region((0.0, 0.0), (100.0, 100.0)), 4).unwrap();
    for i in 0..200u64 {
        let x = (i as f64 * 17.0) % 100.0;
        let y = (i as f64 * 29.0) % 100.0;
        builder.insert(Point::new(i, x, y)).unwrap();
    }
    let tree = builder.finalise();

    let sub = region((10.0, 10.0), (30.0, 30.0));
    let hits = tree.query_vec(sub, 0);
    for p in &hits {
        assert!(sub.contains_point(p.x, p.y));
    }

    instrumentation::reset();
    let _ = tree.query_vec(sub, 0);
    assert!(
        instrumentation::filter_call_count() > 0,
        "a partial-region query crosses at least one non-enclosed leaf"
    );
}

#[test]
fn query_vec_fast_matches_query_vec() {
    let mut builder = QuadtreeBuilder::new(region((0.0, 0.0), (50.0, 50.0)), 3).unwrap();
    for i in 0..300u64 {
        let x = (i as f64 * 11.0) % 50.0;
        let y = (i as f64 * 19.0) % 50.0;
        builder.insert(Point::new(i, x, y)).unwrap();
    }
    let tree = builder.finalise();
    let sub = region((5.0, 5.0), (40.0, 40.0));

    let mut slow = tree.query_vec(sub, 0);
    let mut fast = tree.query_vec_fast(sub, 0);
    slow.sort_by_key(|p| p.payload);
    fast.sort_by_key(|p| p.payload);
    assert_eq!(slow, fast);
}

#[test]
fn maxn_caps_results() {
    let mut builder = QuadtreeBuilder::new(region((0.0, 0.0), (50.0, 50.0)), 2).unwrap();
    for i in 0..100u64 {
        let x = (i as f64 * 7.0) % 50.0;
        let y = (i as f64 * 13.0) % 50.0;
        builder.insert(Point::new(i, x, y)).unwrap();
    }
    let tree = builder.finalise();
    let hits = tree.query_vec(tree.region(), 10);
    assert_eq!(hits.len(), 10);
    let hits_fast = tree.query_vec_fast(tree.region(), 10);
    assert_eq!(hits_fast.len(), 10);
}

#[test]
fn boundary_point_is_found_by_query_touching_the_midline() {
    let mut builder = QuadtreeBuilder::new(region((0.0, 0.0), (10.0, 10.0)), 1).unwrap();
    // forces a split, putting the midpoint at (5.0, 5.0)
    builder.insert(Point::new(1, 1.0, 1.0)).unwrap();
    builder.insert(Point::new(2, 5.0, 5.0)).unwrap();
    let tree = builder.finalise();

    let ne_quadrant = region((5.0, 5.0), (10.0, 10.0));
    let hits = tree.query_vec(ne_quadrant, 0);
    assert!(
        hits.iter().any(|p| p.payload == 2),
        "a point exactly on the midpoint must be found via its NE quadrant"
    );
}
