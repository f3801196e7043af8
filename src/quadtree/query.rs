//! The range-query traversal: a hand-managed descent stack over the
//! finalised tree, with the "enclosed subtree" fast path that skips
//! per-point filtering once a whole subtree is known to lie inside the
//! query rectangle.

use crate::geometry::Rect;
use crate::quadtree::accessor::FinalTree;
use crate::quadtree::types::{Point, POINT_RECORD_SIZE};

/// One frame of the query's hand-managed descent stack. For an inner node,
/// `child_rects` are the four child rectangles of *this* node, precomputed
/// on entry so they are never recomputed or subjected to compounding
/// floating-point error; `quadrant` is the next child index to visit. For a
/// leaf frame, only `addr` and `within_parent` are meaningful.
struct Frame {
    addr: usize,
    is_leaf: bool,
    child_rects: [Rect; 4],
    quadrant: usize,
    /// True if the *parent's* rectangle for this child was already fully
    /// contained in the query rectangle — meaning every point under this
    /// node matches `Q` and per-point filtering can be skipped. Monotonic
    /// downward: once true, stays true for every descendant.
    within_parent: bool,
}

/// Depth-first iterator over the points of a [`FinalTree`] matching a query
/// rectangle. Yields each matching point exactly once, in DFS order of the
/// containing leaves and in insertion order within each leaf.
pub struct QueryIter<'a> {
    tree: &'a FinalTree,
    query: Rect,
    stack: Vec<Frame>,
    lp: Option<usize>,
    lp_within_parent: bool,
    cur_item: u64,
}

impl<'a> QueryIter<'a> {
    pub(crate) fn new(tree: &'a FinalTree, query: Rect) -> Self {
        let root_addr = tree.root_addr();
        let root_is_leaf = tree.is_leaf_addr(root_addr);
        let root_frame = if root_is_leaf {
            Frame {
                addr: root_addr,
                is_leaf: true,
                child_rects: Default::default(),
                quadrant: 0,
                within_parent: false,
            }
        } else {
            Frame {
                addr: root_addr,
                is_leaf: false,
                child_rects: tree.region().child_rects(),
                quadrant: 0,
                within_parent: false,
            }
        };
        // maxdepth bounds the deepest inner-frame chain; +1 leaves room for
        // the leaf frame itself, so the stack never needs to reallocate.
        let mut stack = Vec::with_capacity(tree.max_depth() as usize + 1);
        stack.push(root_frame);
        let mut iter = Self {
            tree,
            query,
            stack,
            lp: None,
            lp_within_parent: false,
            cur_item: 0,
        };
        iter.advance_to_next_leaf();
        iter
    }

    /// Descends (and backtracks) the stack until the top frame is a leaf,
    /// at which point `lp`/`cur_item` are set and traversal can yield
    /// points. Sets `lp = None` once the whole tree has been visited.
    fn advance_to_next_leaf(&mut self) {
        loop {
            let Some(top_is_leaf) = self.stack.last().map(|f| f.is_leaf) else {
                self.lp = None;
                return;
            };
            if top_is_leaf {
                let top = self.stack.last().unwrap();
                self.lp = Some(top.addr);
                self.lp_within_parent = top.within_parent;
                self.cur_item = 0;
                return;
            }

            let (addr, child_rects, within_parent, start_quadrant) = {
                let top = self.stack.last().unwrap();
                (top.addr, top.child_rects, top.within_parent, top.quadrant)
            };
            let offsets = self.tree.read_inner(addr);

            let mut pushed = false;
            let mut quadrant = start_quadrant;
            while quadrant < 4 {
                let offset = offsets[quadrant];
                if offset != 0 {
                    let child_rect = child_rects[quadrant];
                    if child_rect.overlaps(&self.query) {
                        let child_within = within_parent || child_rect.contained_in(&self.query);
                        let child_addr = self.tree.resolve(offset);
                        let child_is_leaf = self.tree.is_leaf_addr(child_addr);
                        let child_frame = if child_is_leaf {
                            Frame {
                                addr: child_addr,
                                is_leaf: true,
                                child_rects: Default::default(),
                                quadrant: 0,
                                within_parent: child_within,
                            }
                        } else {
                            Frame {
                                addr: child_addr,
                                is_leaf: false,
                                child_rects: child_rect.child_rects(),
                                quadrant: 0,
                                within_parent: child_within,
                            }
                        };
                        self.stack.last_mut().unwrap().quadrant = quadrant;
                        self.stack.push(child_frame);
                        pushed = true;
                        break;
                    }
                }
                quadrant += 1;
            }
            if pushed {
                continue;
            }

            // All four quadrants exhausted: pop and resume the parent one
            // quadrant further on.
            self.stack.pop();
            if let Some(parent) = self.stack.last_mut() {
                parent.quadrant += 1;
            }
        }
    }

    /// Leaf-granular advance used by the "fast" bulk collector: returns the
    /// address, point count and `within_parent` flag of the next leaf
    /// reached by the traversal without visiting its individual points.
    fn next_leaf(&mut self) -> Option<(usize, u64, bool)> {
        let addr = self.lp?;
        let n = self.tree.read_leaf_count(addr);
        let within_parent = self.lp_within_parent;
        self.stack.pop();
        if let Some(parent) = self.stack.last_mut() {
            parent.quadrant += 1;
        }
        self.advance_to_next_leaf();
        Some((addr, n, within_parent))
    }
}

impl<'a> Iterator for QueryIter<'a> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        loop {
            let lp = self.lp?;
            let n = self.tree.read_leaf_count(lp);
            while self.cur_item < n {
                let item_addr = lp + 8 + self.cur_item as usize * POINT_RECORD_SIZE;
                let point = self.tree.read_point(item_addr);
                self.cur_item += 1;
                if self.lp_within_parent {
                    return Some(point);
                }
                #[cfg(test)]
                instrumentation::record_filter_call();
                if self.query.contains_point(point.x, point.y) {
                    return Some(point);
                }
            }
            // This leaf is exhausted: pop it and resume the parent one
            // quadrant further on.
            self.stack.pop();
            if let Some(parent) = self.stack.last_mut() {
                parent.quadrant += 1;
            }
            self.advance_to_next_leaf();
        }
    }
}

impl FinalTree {
    /// Starts a range query over `rect`, yielding matching points one at a
    /// time in DFS order.
    pub fn query(&self, rect: Rect) -> QueryIter<'_> {
        QueryIter::new(self, rect)
    }

    /// Point-by-point bulk collector: drains [`query`](Self::query) into a
    /// vector. `maxn`, when non-zero, caps the number of results.
    pub fn query_vec(&self, rect: Rect, maxn: usize) -> Vec<Point> {
        let mut out = Vec::new();
        for point in self.query(rect) {
            out.push(point);
            if maxn != 0 && out.len() >= maxn {
                break;
            }
        }
        out
    }

    /// Leaf-granular bulk collector: for every leaf the traversal reaches,
    /// appends its whole point array verbatim when `within_parent`, or
    /// filters with [`Rect::contains_point`] otherwise — avoiding
    /// per-point iterator overhead for fully enclosed subtrees. `maxn`,
    /// when non-zero, caps the number of results.
    pub fn query_vec_fast(&self, rect: Rect, maxn: usize) -> Vec<Point> {
        let mut out = Vec::new();
        let mut iter = self.query(rect);
        while let Some((addr, n, within_parent)) = iter.next_leaf() {
            for i in 0..n {
                let item_addr = addr + 8 + i as usize * POINT_RECORD_SIZE;
                let point = self.read_point(item_addr);
                let matches = if within_parent {
                    true
                } else {
                    #[cfg(test)]
                    instrumentation::record_filter_call();
                    rect.contains_point(point.x, point.y)
                };
                if matches {
                    out.push(point);
                    if maxn != 0 && out.len() >= maxn {
                        return out;
                    }
                }
            }
        }
        out
    }
}


#[cfg(test)]
mod tests;
