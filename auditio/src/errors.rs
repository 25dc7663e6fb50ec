// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for VolIO operations.
pub type VolIOResult<T = ()> = core::result::Result<T, VolIOError>;

/// Error type for VolIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolIOError {
    Other(&'static str),
    OutOfBounds,
    Unsupported,
}

impl VolIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            VolIOError::Other(msg) => msg,
            VolIOError::OutOfBounds => "Out of bounds",
            VolIOError::Unsupported => "Unsupported operation",
        }
    }
}

impl From<&'static str> for VolIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        VolIOError::Other(msg)
    }
}

impl fmt::Display for VolIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        Ok(())
    }
}
