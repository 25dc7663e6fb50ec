// SPDX-License-Identifier: MIT

#[cfg(feature = "std")]
use std::io::{Error, Read, Seek, SeekFrom};

use crate::{VolIO, VolIOError, VolIOResult};

#[cfg(feature = "std")]
#[derive(Debug)]
pub struct StdVolIO<'a, T: Read + Seek> {
    io: &'a mut T,
    partition_offset: u64,
}

#[cfg(feature = "std")]
impl<'a, T: Read + Seek> StdVolIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(io: &'a mut T, partition_offset: u64) -> Self {
        Self {
            io,
            partition_offset,
        }
    }
}

#[cfg(feature = "std")]
impl<'a, T: Read + Seek> VolIO for StdVolIO<'a, T> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> VolIOResult {
        let abs_offset = self.partition_offset + offset;
        self.io.seek(SeekFrom::Start(abs_offset))?;
        self.io.read_exact(buf)?;
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

#[cfg(feature = "std")]
impl From<Error> for VolIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        // Leak the string to produce a 'static str. Acceptable for error mapping.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        VolIOError::Other(leaked_str)
    }
}

#[cfg(all(test, feature = "std"))]
mod test {
    use super::*;
    use crate::prelude::*;
    use std::io::Write;
    use tempfile::tempfile;

    #[test]
    fn test_read() {
        let mut file = tempfile().unwrap();
        file.write_all(&[0u8; 10]).unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();

        let mut io = StdVolIO::new(&mut file);
        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_read_past_end() {
        let mut file = tempfile().unwrap();
        file.write_all(&[0u8; 16]).unwrap();

        let mut io = StdVolIO::new(&mut file);
        let mut output = [0u8; 8];
        assert!(io.read_at(12, &mut output).is_err());
    }

    #[test]
    fn test_best_effort_read_unaligned() {
        let mut file = tempfile().unwrap();
        file.write_all(&[0u8; 5]).unwrap();
        file.write_all(&[0xAB; 17]).unwrap();
        file.write_all(&[0u8; 42]).unwrap();

        let mut io = StdVolIO::new(&mut file);
        let mut output = [0u8; 17];
        io.read_block_best_effort(5, &mut output, 8).unwrap();
        assert_eq!(output, [0xAB; 17]);
    }
}
