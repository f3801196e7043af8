#[cfg(test)]
mod rect_tests {
    use crate::geometry::{Coord, Quadrant, Rect};

    fn rect(sw: (f64, f64), ne: (f64, f64)) -> Rect {
        Rect::new(Coord::new(sw.0, sw.1), Coord::new(ne.0, ne.1))
    }

    #[test]
    fn test_validity() {
        assert!(rect((0., 0.), (10., 10.)).is_valid());
        assert!(!rect((0., 0.), (0., 10.)).is_valid());
        assert!(!rect((0., 0.), (10., 0.)).is_valid());
        assert!(!rect((5., 5.), (1., 1.)).is_valid());
    }

    #[test]
    fn test_midpoint() {
        let r = rect((0., 0.), (10., 20.));
        let mid = r.midpoint();
        assert_eq!(mid.x, 5.);
        assert_eq!(mid.y, 10.);
    }

    #[test]
    fn test_overlap() {
        let a = rect((0., 0.), (10., 10.));
        let b = rect((5., 5.), (15., 15.));
        let c = rect((20., 20.), (30., 30.));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));

        // touching edges count as overlapping (closed rectangles)
        let d = rect((10., 10.), (20., 20.));
        assert!(a.overlaps(&d));
    }

    #[test]
    fn test_contained_in() {
        let outer = rect((0., 0.), (10., 10.));
        let inner = rect((2., 2.), (8., 8.));
        let touching = rect((0., 0.), (10., 10.));
        let partial = rect((5., 5.), (15., 15.));
        assert!(inner.contained_in(&outer));
        assert!(touching.contained_in(&outer));
        assert!(!partial.contained_in(&outer));
    }

    #[test]
    fn test_contains_point_closed() {
        let r = rect((0., 0.), (10., 10.));
        assert!(r.contains_point(0., 0.));
        assert!(r.contains_point(10., 10.));
        assert!(r.contains_point(5., 5.));
        assert!(!r.contains_point(-0.1, 5.));
        assert!(!r.contains_point(5., 10.1));
    }

    #[test]
    fn test_quadrant_boundary_goes_north_east() {
        let r = rect((0., 0.), (10., 10.));
        let mid = r.midpoint();
        // exactly on the midpoint in both axes -> boundary rule assigns north+east -> NE
        assert_eq!(r.quadrant_for(&mid, mid.x, mid.y), Quadrant::Ne);
        assert_eq!(r.quadrant_for(&mid, 1.0, 9.0), Quadrant::Nw);
        assert_eq!(r.quadrant_for(&mid, 9.0, 9.0), Quadrant::Ne);
        assert_eq!(r.quadrant_for(&mid, 1.0, 1.0), Quadrant::Sw);
        assert_eq!(r.quadrant_for(&mid, 9.0, 1.0), Quadrant::Se);
    }

    #[test]
    fn test_child_rects_partition_parent() {
        let r = rect((0., 0.), (10., 10.));
        let children = r.child_rects();
        for c in children.iter() {
            assert!(c.contained_in(&r));
        }
        // every point in the parent is claimed by exactly one child quadrant
        let mid = r.midpoint();
        for &(x, y) in &[(0.0, 0.0), (9.9, 0.1), (5.0, 5.0), (10.0, 10.0)] {
            let q = r.quadrant_for(&mid, x, y);
            assert!(children[q.index()].contains_point(x, y));
        }
    }
}
