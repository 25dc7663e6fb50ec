// SPDX-License-Identifier: MIT

use core::fmt;

pub use auditio::errors::*;

/// Pass-level failure of an audit.
///
/// Validation anomalies are findings, not errors: only an unreadable
/// record source or an unlocatable structure aborts a pass. An aborted
/// pass leaves the findings collected so far with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditError {
    IO(VolIOError),
    Invalid(&'static str),
    Other(&'static str),
}

impl AuditError {
    pub fn msg(&self) -> &'static str {
        match self {
            AuditError::IO(_) => "IO error",
            AuditError::Invalid(msg) => msg,
            AuditError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<VolIOError> {
        match self {
            AuditError::IO(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let Some(src) = self.source() {
            write!(f, "\n  caused by: {}", src.msg())?;
        }
        Ok(())
    }
}

impl From<VolIOError> for AuditError {
    #[inline]
    fn from(e: VolIOError) -> Self {
        AuditError::IO(e)
    }
}

impl From<&'static str> for AuditError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        AuditError::Other(msg)
    }
}

pub type AuditResult<T = ()> = Result<T, AuditError>;

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_display() {
        let low = VolIOError::Unsupported;
        let top = AuditError::IO(low);

        let rendered = format!("{top}");
        assert!(rendered.contains("caused by: Unsupported operation"));
    }
}
