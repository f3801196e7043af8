//! The finalised, immutable tree: a single contiguous buffer plus the
//! handful of primitives the query layer needs — header fields, offset
//! resolution, and the leaf/inner classifier. There is no per-record tag in
//! the finalised form; a child offset is classified purely by comparing its
//! resolved address against the leaf-region base.

use crate::geometry::{Coord, Rect};
use crate::quadtree::types::{
    Point, QuadtreeError, HEADER_SIZE, INNER_RECORD_SIZE, POINT_RECORD_SIZE,
};

/// The backing allocation of a [`FinalTree`]. `Heap` is produced by
/// [`finalise`](crate::quadtree::build::QuadtreeBuilder::finalise); `Aligned`
/// is produced by [`FinalTree::load`](crate::quadtree::persist), which reads
/// into a page-aligned allocation so the read can be done in page-sized
/// chunks. Whichever allocator produced the buffer is the one that frees it.
pub(crate) enum Buffer {
    Heap(Box<[u8]>),
    Aligned {
        ptr: std::ptr::NonNull<u8>,
        layout: std::alloc::Layout,
    },
}

impl Buffer {
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Heap(b) => b,
            Buffer::Aligned { ptr, layout } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), layout.size())
            },
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Buffer::Aligned { ptr, layout } = self {
            unsafe { std::alloc::dealloc(ptr.as_ptr(), *layout) }
        }
    }
}

// `Buffer` owns plain bytes; nothing about a raw allocation makes it unsafe
// to read from multiple threads at once, which is exactly what query
// iterators over a shared `FinalTree` do.
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

/// An immutable, packed quadtree: bounding region, item/node counts, and the
/// depth-first-packed buffer itself. Released as a whole when dropped.
pub struct FinalTree {
    pub(crate) buf: Buffer,
    pub(crate) region: Rect,
    pub(crate) size: u64,
    pub(crate) maxdepth: u32,
    pub(crate) ninners: u64,
    pub(crate) nleafs: u64,
}

impl FinalTree {
    pub(crate) fn from_buffer(buf: Buffer) -> Result<Self, QuadtreeError> {
        let bytes = buf.as_slice();
        if bytes.len() < HEADER_SIZE {
            return Err(QuadtreeError::CorruptBuffer {
                reason: "buffer shorter than the fixed header size",
            });
        }
        let sw_x = read_f64(bytes, 0);
        let sw_y = read_f64(bytes, 8);
        let ne_x = read_f64(bytes, 16);
        let ne_y = read_f64(bytes, 24);
        let size = read_u64(bytes, 32);
        let maxdepth = read_u32(bytes, 40);
        let ninners = read_u64(bytes, 48);
        let nleafs = read_u64(bytes, 56);

        let region = Rect::new(Coord::new(sw_x, sw_y), Coord::new(ne_x, ne_y));
        let expected_len = HEADER_SIZE
            + ninners as usize * INNER_RECORD_SIZE
            + nleafs as usize * 8
            + size as usize * POINT_RECORD_SIZE;
        if bytes.len() != expected_len {
            return Err(QuadtreeError::CorruptBuffer {
                reason: "buffer length does not match header-declared region sizes",
            });
        }

        Ok(Self {
            buf,
            region,
            size,
            maxdepth,
            ninners,
            nleafs,
        })
    }

    /// The bounding rectangle supplied when the tree was built.
    pub fn region(&self) -> Rect {
        self.region
    }

    /// Total number of points held by the tree.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Maximum depth reached by any insertion — the exact descent-stack
    /// depth a query iterator needs to preallocate.
    pub fn max_depth(&self) -> u32 {
        self.maxdepth
    }

    pub fn inner_count(&self) -> u64 {
        self.ninners
    }

    pub fn leaf_count(&self) -> u64 {
        self.nleafs
    }

    pub(crate) fn inner_base(&self) -> usize {
        HEADER_SIZE
    }

    pub(crate) fn leaf_base(&self) -> usize {
        HEADER_SIZE + self.ninners as usize * INNER_RECORD_SIZE
    }

    /// The root is always at relative offset 0 of the inner region — which,
    /// when the tree never split, is also where the leaf region begins.
    pub(crate) fn root_addr(&self) -> usize {
        self.inner_base()
    }

    /// Resolves a child offset (relative to the inner-region base, as
    /// stored in an inner record) to an absolute byte address.
    pub(crate) fn resolve(&self, child_offset: u64) -> usize {
        self.inner_base() + child_offset as usize
    }

    /// An address is a leaf iff it falls at or past the leaf-region base.
    pub(crate) fn is_leaf_addr(&self, addr: usize) -> bool {
        addr >= self.leaf_base()
    }

    pub(crate) fn read_inner(&self, addr: usize) -> [u64; 4] {
        let bytes = self.buf.as_slice();
        [
            read_u64(bytes, addr),
            read_u64(bytes, addr + 8),
            read_u64(bytes, addr + 16),
            read_u64(bytes, addr + 24),
        ]
    }

    pub(crate) fn read_leaf_count(&self, addr: usize) -> u64 {
        read_u64(self.buf.as_slice(), addr)
    }

    pub(crate) fn read_point(&self, addr: usize) -> Point {
        let bytes = self.buf.as_slice();
        Point::new(
            read_u64(bytes, addr),
            read_f64(bytes, addr + 8),
            read_f64(bytes, addr + 16),
        )
    }
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_ne_bytes(bytes[at..at + 8].try_into().unwrap())
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap())
}

fn read_f64(bytes: &[u8], at: usize) -> f64 {
    f64::from_ne_bytes(bytes[at..at + 8].try_into().unwrap())
}
