//! Axis-aligned rectangle primitives shared by the build and query paths.
//!
//! Quadrant numbering is fixed and used both by the insertion engine and by
//! the on-disk inner record: bit 1 is the north/south axis, bit 0 is the
//! east/west axis, so `NW=0, NE=1, SW=2, SE=3`.

mod tests;

/// A single 2-D coordinate.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One of the four quadrants a rectangle splits into, in the fixed numeric
/// order the finalised inner record stores them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    Nw = 0,
    Ne = 1,
    Sw = 2,
    Se = 3,
}

pub const QUADRANTS: [Quadrant; 4] = [Quadrant::Nw, Quadrant::Ne, Quadrant::Sw, Quadrant::Se];

impl Quadrant {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// An axis-aligned rectangle, `sw` (south-west / min corner) and `ne`
/// (north-east / max corner). `ne.x > sw.x` and `ne.y > sw.y` must hold for
/// any rectangle that is not a degenerate empty-leaf placeholder.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    pub sw: Coord,
    pub ne: Coord,
}

impl Rect {
    pub fn new(sw: Coord, ne: Coord) -> Self {
        Self { sw, ne }
    }

    /// True if `sw`/`ne` form a valid, non-degenerate rectangle.
    pub fn is_valid(&self) -> bool {
        self.ne.x > self.sw.x && self.ne.y > self.sw.y
    }

    /// Midpoint of the rectangle, computed once per level and carried down
    /// the descent so repeated halving never re-derives it from the root
    /// (which would let floating-point error drift between insertion and
    /// query classification of the same boundary point).
    pub fn midpoint(&self) -> Coord {
        Coord::new(
            self.sw.x + (self.ne.x - self.sw.x) / 2.0,
            self.sw.y + (self.ne.y - self.sw.y) / 2.0,
        )
    }

    /// Rectangle–rectangle overlap test.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.sw.x <= other.ne.x
            && self.sw.y <= other.ne.y
            && self.ne.x >= other.sw.x
            && self.ne.y >= other.sw.y
    }

    /// True if `self` lies entirely within `outer` (all four corners).
    pub fn contained_in(&self, outer: &Rect) -> bool {
        self.sw.x >= outer.sw.x
            && self.sw.y >= outer.sw.y
            && self.ne.x <= outer.ne.x
            && self.ne.y <= outer.ne.y
    }

    /// Closed point-in-rectangle test, inclusive on both sides of both axes.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.sw.x && x <= self.ne.x && y >= self.sw.y && y <= self.ne.y
    }

    /// Which quadrant a point belongs to, using the mid-point already
    /// computed for this rectangle. Boundary points (`>= mid`) are assigned
    /// to the north/east child so placement is deterministic; this rule
    /// must match exactly between insertion and query traversal.
    pub fn quadrant_for(&self, mid: &Coord, x: f64, y: f64) -> Quadrant {
        match (y >= mid.y, x >= mid.x) {
            (true, false) => Quadrant::Nw,
            (true, true) => Quadrant::Ne,
            (false, false) => Quadrant::Sw,
            (false, true) => Quadrant::Se,
        }
    }

    /// The child rectangle for a given quadrant, given this rectangle's
    /// already-computed midpoint.
    pub fn child_rect(&self, mid: &Coord, quadrant: Quadrant) -> Rect {
        match quadrant {
            Quadrant::Nw => Rect::new(Coord::new(self.sw.x, mid.y), Coord::new(mid.x, self.ne.y)),
            Quadrant::Ne => Rect::new(Coord::new(mid.x, mid.y), Coord::new(self.ne.x, self.ne.y)),
            Quadrant::Sw => Rect::new(Coord::new(self.sw.x, self.sw.y), Coord::new(mid.x, mid.y)),
            Quadrant::Se => Rect::new(Coord::new(mid.x, self.sw.y), Coord::new(self.ne.x, mid.y)),
        }
    }

    /// All four child rectangles at once, in `QUADRANTS` order, precomputed
    /// so the query iterator never has to recompute or re-derive them from
    /// the root.
    pub fn child_rects(&self) -> [Rect; 4] {
        let mid = self.midpoint();
        QUADRANTS.map(|q| self.child_rect(&mid, q))
    }
}
