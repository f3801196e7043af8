//! Converts a transient [`QuadtreeBuilder`] into an immutable, packed
//! [`FinalTree`] buffer in a single depth-first, pre-order pass. Writes are
//! monotone (every child address is reserved before it is visited), so the
//! finaliser never needs a fix-up pass.

use crate::quadtree::accessor::{Buffer, FinalTree};
use crate::quadtree::build::{LeafBucket, QuadtreeBuilder, TransientNode};
use crate::quadtree::types::{HEADER_SIZE, INNER_RECORD_SIZE, POINT_RECORD_SIZE};

const LEAF_COUNT_FIELD_SIZE: usize = std::mem::size_of::<u64>();

impl QuadtreeBuilder {
    /// Consumes the builder and packs it into a finalised, in-memory tree.
    pub fn finalise(self) -> FinalTree {
        let region = self.region;
        let ninners = self.stats.ninners;
        let nleafs = self.stats.nleafs;
        let size = self.stats.size;
        let maxdepth = self.stats.maxdepth;

        let inner_base = HEADER_SIZE;
        let leaf_base = inner_base + ninners as usize * INNER_RECORD_SIZE;
        let total_bytes = leaf_base
            + nleafs as usize * LEAF_COUNT_FIELD_SIZE
            + size as usize * POINT_RECORD_SIZE;

        let mut buf = vec![0u8; total_bytes];
        write_header(
            &mut buf, region.sw.x, region.sw.y, region.ne.x, region.ne.y, size, maxdepth, ninners,
            nleafs,
        );

        let mut next_inner = inner_base;
        let mut next_leaf = leaf_base;
        let root_dest = reserve(&self.root, &mut next_inner, &mut next_leaf);
        debug_assert_eq!(root_dest, inner_base, "root must land at offset 0 of the inner region");
        emit(&self.root, root_dest, &mut buf, &mut next_inner, &mut next_leaf, inner_base);

        debug_assert_eq!(next_inner, leaf_base, "inner region must be exactly filled");
        debug_assert_eq!(next_leaf, total_bytes, "leaf region must be exactly filled");

        log::info!(
            "finalised quadtree: {size} points, {ninners} inner nodes, {nleafs} leaves, maxdepth {maxdepth}, {total_bytes} bytes"
        );

        FinalTree::from_buffer(Buffer::Heap(buf.into_boxed_slice()))
            .expect("a just-finalised buffer always matches its own header")
    }
}

/// Reserves and returns the destination byte offset for `node`, advancing
/// the appropriate cursor by the node's exact on-disk size.
fn reserve(node: &TransientNode, next_inner: &mut usize, next_leaf: &mut usize) -> usize {
    match node {
        TransientNode::Inner(_) => {
            let dest = *next_inner;
            *next_inner += INNER_RECORD_SIZE;
            dest
        }
        TransientNode::Leaf(bucket) => {
            let dest = *next_leaf;
            *next_leaf += LEAF_COUNT_FIELD_SIZE + bucket.points.len() * POINT_RECORD_SIZE;
            dest
        }
    }
}

fn emit(
    node: &TransientNode,
    dest: usize,
    buf: &mut [u8],
    next_inner: &mut usize,
    next_leaf: &mut usize,
    inner_base: usize,
) {
    match node {
        TransientNode::Leaf(bucket) => emit_leaf(bucket, dest, buf),
        TransientNode::Inner(children) => {
            let mut offsets = [0u64; 4];
            for (i, child) in children.iter().enumerate() {
                if let Some(child_node) = child {
                    let child_dest = reserve(child_node, next_inner, next_leaf);
                    offsets[i] = (child_dest - inner_base) as u64;
                    emit(child_node, child_dest, buf, next_inner, next_leaf, inner_base);
                }
            }
            write_inner(buf, dest, offsets);
        }
    }
}

fn emit_leaf(bucket: &LeafBucket, dest: usize, buf: &mut [u8]) {
    let n = bucket.points.len() as u64;
    buf[dest..dest + LEAF_COUNT_FIELD_SIZE].copy_from_slice(&n.to_ne_bytes());
    let mut off = dest + LEAF_COUNT_FIELD_SIZE;
    for point in &bucket.points {
        write_point(buf, off, point.payload, point.x, point.y);
        off += POINT_RECORD_SIZE;
    }
}

fn write_point(buf: &mut [u8], offset: usize, payload: u64, x: f64, y: f64) {
    let mut o = offset;
    buf[o..o + 8].copy_from_slice(&payload.to_ne_bytes());
    o += 8;
    buf[o..o + 8].copy_from_slice(&x.to_ne_bytes());
    o += 8;
    buf[o..o + 8].copy_from_slice(&y.to_ne_bytes());
}

fn write_inner(buf: &mut [u8], offset: usize, children: [u64; 4]) {
    let mut o = offset;
    for child in children {
        buf[o..o + 8].copy_from_slice(&child.to_ne_bytes());
        o += 8;
    }
}

#[allow(clippy::too_many_arguments)]
fn write_header(
    buf: &mut [u8],
    sw_x: f64,
    sw_y: f64,
    ne_x: f64,
    ne_y: f64,
    size: u64,
    maxdepth: u32,
    ninners: u64,
    nleafs: u64,
) {
    let mut o = 0usize;
    for v in [sw_x, sw_y, ne_x, ne_y] {
        buf[o..o + 8].copy_from_slice(&v.to_ne_bytes());
        o += 8;
    }
    buf[o..o + 8].copy_from_slice(&size.to_ne_bytes());
    o += 8;
    buf[o..o + 4].copy_from_slice(&maxdepth.to_ne_bytes());
    o += 4;
    buf[o..o + 4].copy_from_slice(&0u32.to_ne_bytes()); // padding
    o += 4;
    buf[o..o + 8].copy_from_slice(&ninners.to_ne_bytes());
    o += 8;
    buf[o..o + 8].copy_from_slice(&nleafs.to_ne_bytes());
}
