//! The transient (build-time) tree: a tagged node store plus the insertion
//! engine that descends it, picking child quadrants and splitting buckets.

use crate::geometry::Rect;
use crate::quadtree::types::{Point, QuadtreeError};

type Children = [Option<Box<TransientNode>>; 4];

/// A tagged transient node: either an inner node with four optional
/// children, or a leaf holding a growable bucket of points.
pub(crate) enum TransientNode {
    Inner(Box<Children>),
    Leaf(LeafBucket),
}

impl TransientNode {
    fn new_inner() -> Self {
        TransientNode::Inner(Box::new([None, None, None, None]))
    }

    fn new_leaf(maxfill: usize) -> Self {
        TransientNode::Leaf(LeafBucket {
            points: Vec::new(),
            capacity: maxfill.max(1),
        })
    }
}

/// A leaf's point bucket. Points are individually boxed so their addresses
/// are stable across reallocations of the index vector; capacity starts at
/// `maxfill` and only ever doubles, never shrinks.
pub(crate) struct LeafBucket {
    pub(crate) points: Vec<Box<Point>>,
    pub(crate) capacity: usize,
}

impl LeafBucket {
    /// True if every point currently in the bucket shares the same
    /// coordinates — the only condition under which a full bucket cannot be
    /// usefully split.
    fn all_coincident(&self) -> bool {
        match self.points.split_first() {
            None | Some((_, [])) => true,
            Some((first, rest)) => rest.iter().all(|p| p.x == first.x && p.y == first.y),
        }
    }
}

#[derive(Default)]
pub(crate) struct BuildStats {
    pub(crate) ninners: u64,
    pub(crate) nleafs: u64,
    pub(crate) maxdepth: u32,
    pub(crate) size: u64,
}

impl BuildStats {
    fn note_depth(&mut self, depth: u32) {
        if depth > self.maxdepth {
            self.maxdepth = depth;
        }
    }
}

/// The mutable, build-time quadtree. Accepts points one at a time via
/// [`insert`](QuadtreeBuilder::insert); consumed exactly once by
/// [`finalise`](crate::quadtree::finalize) into an immutable [`FinalTree`](crate::quadtree::FinalTree).
pub struct QuadtreeBuilder {
    pub(crate) region: Rect,
    pub(crate) maxfill: usize,
    pub(crate) root: TransientNode,
    pub(crate) stats: BuildStats,
}

impl QuadtreeBuilder {
    /// Creates a builder over `region` with bucket capacity `maxfill`.
    /// Rejects a degenerate region (`ne` not strictly greater than `sw` on
    /// some axis) or a zero `maxfill`.
    pub fn new(region: Rect, maxfill: usize) -> Result<Self, QuadtreeError> {
        if !region.is_valid() || maxfill == 0 {
            return Err(QuadtreeError::InvalidRegion {
                sw_x: region.sw.x,
                sw_y: region.sw.y,
                ne_x: region.ne.x,
                ne_y: region.ne.y,
            });
        }
        log::debug!(
            "quadtree builder created: region=({}, {})-({}, {}) maxfill={}",
            region.sw.x,
            region.sw.y,
            region.ne.x,
            region.ne.y,
            maxfill
        );
        let mut stats = BuildStats::default();
        // the root is always a leaf record, even before any insert, and is
        // never created through the "new child leaf under an inner parent"
        // path below that otherwise increments `nleafs`.
        stats.nleafs = 1;
        Ok(Self {
            region,
            maxfill,
            root: TransientNode::new_leaf(maxfill),
            stats,
        })
    }

    /// Number of points inserted so far.
    pub fn len(&self) -> u64 {
        self.stats.size
    }

    pub fn is_empty(&self) -> bool {
        self.stats.size == 0
    }

    /// Copies `point` into the tree, descending from the root and growing
    /// or splitting buckets as needed. Rejects points outside the tree's
    /// bounding region.
    pub fn insert(&mut self, point: Point) -> Result<(), QuadtreeError> {
        if !self.region.contains_point(point.x, point.y) {
            log::warn!(
                "rejected out-of-region insert at ({}, {})",
                point.x,
                point.y
            );
            return Err(QuadtreeError::OutOfRegionInsert {
                x: point.x,
                y: point.y,
            });
        }
        let region = self.region;
        insert_point(&mut self.root, &region, 0, self.maxfill, point, &mut self.stats);
        self.stats.size += 1;
        Ok(())
    }
}

/// Descends from `node` (covering `rect` at `depth`) and places `point`,
/// splitting buckets as necessary. `stats` is updated in place for every
/// structural change (new leaf, leaf->inner conversion, deepest descent).
fn insert_point(
    node: &mut TransientNode,
    rect: &Rect,
    depth: u32,
    maxfill: usize,
    point: Point,
    stats: &mut BuildStats,
) {
    debug_assert!(
        rect.contains_point(point.x, point.y),
        "insertion routed a point outside the rectangle owning this subtree"
    );

    if let TransientNode::Inner(children) = node {
        let mid = rect.midpoint();
        let quadrant = rect.quadrant_for(&mid, point.x, point.y);
        let child_rect = rect.child_rect(&mid, quadrant);
        let slot = &mut children[quadrant.index()];
        if slot.is_none() {
            *slot = Some(Box::new(TransientNode::new_leaf(maxfill)));
            stats.nleafs += 1;
        }
        insert_point(
            slot.as_mut().unwrap(),
            &child_rect,
            depth + 1,
            maxfill,
            point,
            stats,
        );
        return;
    }

    let bucket = match node {
        TransientNode::Leaf(bucket) => bucket,
        TransientNode::Inner(_) => unreachable!(),
    };

    if bucket.points.len() < bucket.capacity {
        bucket.points.push(Box::new(point));
        stats.note_depth(depth);
        return;
    }

    if bucket.all_coincident() {
        log::debug!(
            "leaf at depth {depth} has {} coincident points, doubling capacity to {}",
            bucket.points.len(),
            bucket.capacity * 2
        );
        bucket.capacity *= 2;
        bucket.points.push(Box::new(point));
        stats.note_depth(depth);
        return;
    }

    log::debug!(
        "splitting leaf at depth {depth} with {} points",
        bucket.points.len()
    );
    let old_points = std::mem::take(&mut bucket.points);
    *node = TransientNode::new_inner();
    stats.ninners += 1;
    stats.nleafs -= 1;
    for boxed in old_points {
        insert_point(node, rect, depth, maxfill, *boxed, stats);
    }
    insert_point(node, rect, depth, maxfill, point, stats);
}
