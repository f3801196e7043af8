//! Saves and loads a finalised tree as a single raw, host-endian byte
//! blob. The format is deliberately non-portable: no endianness tag, no
//! versioning, no cross-architecture normalisation. A loaded tree is only
//! ever meant to be read back on the machine (and build) that wrote it.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::quadtree::accessor::{Buffer, FinalTree};
use crate::quadtree::build::QuadtreeBuilder;
use crate::quadtree::types::QuadtreeError;

/// Chunk size used for the read loop in [`FinalTree::load`]. Matches the
/// common page size; reading in page-sized chunks keeps a single short
/// read from stalling the whole load on a slow device.
const READ_CHUNK: usize = 4096;

impl QuadtreeBuilder {
    /// Finalises the builder and writes the result to `path` in one shot,
    /// returning the in-memory [`FinalTree`] so callers don't have to
    /// reload what they just wrote.
    pub fn finalise_to(self, path: impl AsRef<Path>) -> Result<FinalTree, QuadtreeError> {
        let tree = self.finalise();
        tree.save(path)?;
        Ok(tree)
    }
}

impl FinalTree {
    /// Writes the packed buffer to `path` as a single contiguous write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), QuadtreeError> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        file.write_all(self.buf.as_slice())?;
        log::info!("saved quadtree to {} ({} bytes)", path.display(), self.buf.as_slice().len());
        Ok(())
    }

    /// Loads a tree previously written by [`save`](Self::save). The buffer
    /// is allocated page-aligned so the read can proceed in page-sized
    /// chunks; once the whole file has been read, the kernel's readahead
    /// hint for the file is dropped, since a loaded tree is typically read
    /// randomly afterwards rather than sequentially.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuadtreeError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let len = file.metadata()?.len() as usize;

        let buf = alloc_page_aligned(len);
        let dest = unsafe { std::slice::from_raw_parts_mut(buf_ptr(&buf), len) };

        let mut read_total = 0;
        while read_total < len {
            let end = (read_total + READ_CHUNK).min(len);
            let n = file.read(&mut dest[read_total..end])?;
            if n == 0 {
                return Err(QuadtreeError::CorruptBuffer {
                    reason: "file truncated before the declared length was read",
                });
            }
            read_total += n;
        }

        drop_readahead_hint(&file, len);
        log::info!("loaded quadtree from {} ({len} bytes)", path.display());

        FinalTree::from_buffer(buf)
    }
}

/// Allocates `len` bytes with page alignment, returning a [`Buffer::Aligned`]
/// ready to be filled in place.
fn alloc_page_aligned(len: usize) -> Buffer {
    const PAGE: usize = 4096;
    let layout = std::alloc::Layout::from_size_align(len.max(1), PAGE)
        .expect("file length never exceeds isize::MAX, so the layout is always valid");
    let raw = unsafe { std::alloc::alloc(layout) };
    let ptr = std::ptr::NonNull::new(raw).unwrap_or_else(|| std::alloc::handle_alloc_error(layout));
    Buffer::Aligned { ptr, layout }
}

fn buf_ptr(buf: &Buffer) -> *mut u8 {
    match buf {
        Buffer::Aligned { ptr, .. } => ptr.as_ptr(),
        Buffer::Heap(_) => unreachable!("load always allocates an Aligned buffer"),
    }
}

/// Best-effort hint that the kernel can drop its readahead window for this
/// file now that the whole thing has been read into our own buffer. Not
/// load-bearing for correctness; a failure here is logged and ignored.
#[cfg(unix)]
fn drop_readahead_hint(file: &File, len: usize) {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe {
        libc::posix_fadvise(
            file.as_raw_fd(),
            0,
            len as libc::off_t,
            libc::POSIX_FADV_DONTNEED,
        )
    };
    if rc != 0 {
        log::debug!("posix_fadvise(DONTNEED) failed with errno {rc}, ignoring");
    }
}

#[cfg(not(unix))]
fn drop_readahead_hint(_file: &File, _len: usize) {}
