// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod errors;
mod macros;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::VolIO;
    pub use super::VolIOExt;
    pub use super::VolIOStructExt;
    pub use super::errors::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemVolIO;

    #[cfg(feature = "std")]
    pub use super::std::StdVolIO;
}

// Internal use
use errors::*;

// Constants

/// Maximum size of internal scratch buffer (used for chunked ops).
/// 4 KiB = typical page size and common disk sector/cluster size.
/// Safe for no_std stack usage, overridable in high-level code.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Read-only block IO abstraction trait.
///
/// Allows reads at arbitrary offsets. Implementations may target RAM,
/// files, block devices, etc. The audit core never writes, so there is
/// no write half: a volume under audit is strictly read-only.
pub trait VolIO {
    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    ///
    /// Repeated reads of the same address must return the same bytes for
    /// the lifetime of one audit pass.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolIOResult;

    fn set_offset(&mut self, partition_offset: u64) -> u64;
    fn partition_offset(&self) -> u64;
}

/// Extension helpers for VolIO.
///
/// Provides optimized or convenient helpers:
/// - chunked reads
/// - block-aligned best-effort reads
/// - low-level read helpers (read_u16/32/64)
pub trait VolIOExt: VolIO {
    /// Reads `buf.len()` bytes from `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn read_in_chunks(&mut self, offset: u64, buf: &mut [u8], chunk_size: usize) -> VolIOResult {
        let mut remaining = buf.len();
        let mut off = offset;
        let mut pos = 0;

        while remaining > 0 {
            let to_read = remaining.min(chunk_size);
            self.read_at(off, &mut buf[pos..pos + to_read])?;
            off += to_read as u64;
            pos += to_read;
            remaining -= to_read;
        }

        Ok(())
    }

    /// Reads a block or range of blocks of `block_size` starting at `offset`.
    ///
    /// If offset and length are aligned to `block_size`, performs a single fast read.
    /// Otherwise, falls back to reading block by block.
    ///
    /// Useful for cluster-granular reads.
    #[inline(always)]
    fn read_block_best_effort(
        &mut self,
        offset: u64,
        buf: &mut [u8],
        block_size: usize,
    ) -> VolIOResult {
        if offset.is_multiple_of(block_size as u64) && buf.len().is_multiple_of(block_size) {
            self.read_at(offset, buf)
        } else {
            self.read_in_chunks(offset, buf, BLOCK_BUF_SIZE)
        }
    }

    // Implements read helpers for primitive types (u16, u32, u64)
    volio_impl_primitive_reads!(u16, u32, u64);
}

impl<T: VolIO + ?Sized> VolIOExt for T {}

/// Extension trait for reading structs using zerocopy.
///
/// Provides a helper to read a struct from a given offset. Requires the
/// struct to implement zerocopy traits for safe conversion.
pub trait VolIOStructExt: VolIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> VolIOResult<T> {
        let size = core::mem::size_of::<T>();
        assert!(size <= BLOCK_BUF_SIZE, "read_struct: type too large");
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| VolIOError::Other("read_struct failed"))
    }
}

impl<T: VolIO + ?Sized> VolIOStructExt for T {}
