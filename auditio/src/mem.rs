// SPDX-License-Identifier: MIT

use crate::{VolIO, VolIOError, VolIOResult};

/// In-memory implementation of `VolIO`.
///
/// Useful for tests, RAM-backed images, virtual disks. Borrows the image
/// immutably since the audit path never writes.
#[derive(Debug)]
pub struct MemVolIO<'a> {
    buffer: &'a [u8],
    partition_offset: u64,
}

impl<'a> MemVolIO<'a> {
    #[inline]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(buffer: &'a [u8], partition_offset: u64) -> Self {
        Self {
            buffer,
            partition_offset,
        }
    }

    #[inline]
    fn check_bounds(&self, abs_off: u64, len: usize) -> VolIOResult {
        let end = abs_off
            .checked_add(len as u64)
            .ok_or(VolIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(VolIOError::OutOfBounds);
        }
        Ok(())
    }
}

impl<'a> VolIO for MemVolIO<'a> {
    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolIOResult {
        let abs_offset = self.partition_offset + offset;
        self.check_bounds(abs_offset, buf.len())?;
        let src = &self.buffer[abs_offset as usize..abs_offset as usize + buf.len()];
        buf.copy_from_slice(src);
        Ok(())
    }

    #[inline]
    fn set_offset(&mut self, partition_offset: u64) -> u64 {
        self.partition_offset = partition_offset;
        partition_offset
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }
}
