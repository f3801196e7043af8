//! Shared types for the quadtree: the public `Point`, the typed error enum,
//! and the packed on-disk record layouts used by the finaliser, accessor
//! and persistence modules.

/// A 2-D point carrying an opaque 64-bit payload. Serialised form is
/// tightly packed: 8 bytes payload, then 8+8 bytes for X and Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub payload: u64,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(payload: u64, x: f64, y: f64) -> Self {
        Self { payload, x, y }
    }
}

/// Errors surfaced at the fallible boundaries of the quadtree: builder
/// construction, insertion, finalisation/persistence.
#[derive(Debug, thiserror::Error)]
pub enum QuadtreeError {
    #[error("invalid region: sw=({sw_x}, {sw_y}) ne=({ne_x}, {ne_y}) does not satisfy ne > sw")]
    InvalidRegion {
        sw_x: f64,
        sw_y: f64,
        ne_x: f64,
        ne_y: f64,
    },

    #[error("point ({x}, {y}) lies outside the tree's bounding region")]
    OutOfRegionInsert { x: f64, y: f64 },

    #[error("I/O failure accessing a quadtree file")]
    Io(#[from] std::io::Error),

    #[error("corrupt buffer: {reason}")]
    CorruptBuffer { reason: &'static str },
}

/// Packed on-disk header size in bytes: four `f64` region corners, one
/// `u64` item count, one `u32` max-depth, 4 bytes of padding to keep the
/// trailing `u64` fields 8-byte aligned, then `ninners` and `nleafs` as
/// `u64`. Kept as a named constant so the writer (`finalize.rs`) and the
/// reader (`accessor.rs`) can never disagree about it.
pub(crate) const HEADER_SIZE: usize = 8 * 4 + 8 + 4 + 4 + 8 + 8;

/// Packed inner record size: one `u64` byte offset per quadrant (NW, NE,
/// SW, SE), relative to the inner-region base. `0` is the "no child"
/// sentinel.
pub(crate) const INNER_RECORD_SIZE: usize = 8 * 4;

/// Packed point record size: 8-byte payload, then 8+8 bytes for X and Y.
pub(crate) const POINT_RECORD_SIZE: usize = 8 + 8 + 8;
