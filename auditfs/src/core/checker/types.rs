// SPDX-License-Identifier: MIT
// core/checker/types.rs

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{string::String, vec::Vec};
use core::cmp::Ordering;
use core::fmt;

use bitflags::bitflags;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        use Severity::*;
        fn rank(s: Severity) -> u8 {
            match s {
                Info => 0,
                Warn => 1,
                Error => 2,
            }
        }
        rank(*self).cmp(&rank(*other))
    }
}

/// What an audit pass observed. One variant per anomaly class, so callers
/// can match on the kind instead of parsing messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FindingKind {
    /// A complete, consistent unit (entry set, table) was verified.
    Ok,
    /// Stored 16/32-bit checksum differs from the computed one.
    ChecksumMismatch,
    /// Stored name hash differs from the computed one.
    HashMismatch,
    /// An entry set violated the primary/secondary sequence rules.
    MalformedSet,
    /// The upcase table's encoding is inconsistent (odd length, cursor
    /// overflow, truncated escape).
    MalformedTable,
    /// A table mapping disagrees with the reference case fold.
    FoldMismatch,
    /// A record with an unrecognized or cleared type tag.
    UnknownType,
    /// Informational location note (bitmap, label, upcase record seen).
    Note,
}

impl FindingKind {
    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::Ok => "OK",
            FindingKind::ChecksumMismatch => "CHK.MISMATCH",
            FindingKind::HashMismatch => "HASH.MISMATCH",
            FindingKind::MalformedSet => "SET.MALFORMED",
            FindingKind::MalformedTable => "TBL.MALFORMED",
            FindingKind::FoldMismatch => "TBL.FOLD",
            FindingKind::UnknownType => "DIR.UNKNOWN",
            FindingKind::Note => "NOTE",
        }
    }
}

/// Address of a 32-byte directory record: cluster plus record index
/// within that cluster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecordAddr {
    pub cluster: u32,
    pub record: u32,
}

impl RecordAddr {
    pub const fn new(cluster: u32, record: u32) -> Self {
        Self { cluster, record }
    }
}

impl fmt::Display for RecordAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.record)
    }
}

#[derive(Clone, Debug)]
pub struct Finding {
    pub sev: Severity,
    pub kind: FindingKind,
    pub addr: Option<RecordAddr>,
    pub expected: Option<u32>,
    pub actual: Option<u32>,
    pub msg: String,
}

impl Finding {
    fn new(sev: Severity, kind: FindingKind, msg: impl Into<String>) -> Self {
        Self {
            sev,
            kind,
            addr: None,
            expected: None,
            actual: None,
            msg: msg.into(),
        }
    }
    pub fn info(kind: FindingKind, msg: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, msg)
    }
    pub fn warn(kind: FindingKind, msg: impl Into<String>) -> Self {
        Self::new(Severity::Warn, kind, msg)
    }
    pub fn err(kind: FindingKind, msg: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, msg)
    }

    pub fn at(mut self, addr: RecordAddr) -> Self {
        self.addr = Some(addr);
        self
    }
    /// Attach the stored vs computed pair the finding is about.
    pub fn values(mut self, expected: u32, actual: u32) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn has_error(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f.sev, Severity::Error))
    }

    pub fn first_error(&self) -> Option<&Finding> {
        self.findings
            .iter()
            .find(|f| matches!(f.sev, Severity::Error))
    }

    pub fn ok(&self) -> bool {
        !self.has_error()
    }

    pub fn push(&mut self, f: Finding) {
        self.findings.push(f)
    }
    pub fn count(&self, s: Severity) -> usize {
        self.findings.iter().filter(|f| f.sev == s).count()
    }
    pub fn count_kind(&self, k: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == k).count()
    }

    /// Display with options (filtering, prefix, summary...)
    pub fn display_with<'a>(&'a self, opts: ReportDisplayOpts) -> ReportDisplay<'a> {
        ReportDisplay::new(self, opts)
    }

    /// Display "only errors", default prefix, no summary
    pub fn errors_only<'a>(&'a self) -> ReportDisplay<'a> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Error,
            ..ReportDisplayOpts::default()
        })
    }

    /// Display "warn + error"
    pub fn warn_and_errors<'a>(&'a self) -> ReportDisplay<'a> {
        self.display_with(ReportDisplayOpts {
            min_level: Severity::Warn,
            ..ReportDisplayOpts::default()
        })
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ReportDisplayOpts {
    pub min_level: Severity,
    pub prefix: &'static str,
    pub show_summary: bool,
    pub pad_code: usize,
}

impl ReportDisplayOpts {
    fn new(min_level: Severity, prefix: &'static str, show_summary: bool, pad_code: usize) -> Self {
        Self {
            min_level,
            prefix,
            show_summary,
            pad_code,
        }
    }
}

impl Default for ReportDisplayOpts {
    fn default() -> Self {
        Self::new(Severity::Info, "", false, 14)
    }
}

pub struct ReportDisplay<'a> {
    rep: &'a AuditReport,
    opts: ReportDisplayOpts,
}

impl<'a> ReportDisplay<'a> {
    pub fn new(rep: &'a AuditReport, opts: ReportDisplayOpts) -> Self {
        Self { rep, opts }
    }
}

impl<'a> fmt::Display for ReportDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n_info = 0usize;
        let mut n_warn = 0usize;
        let mut n_err = 0usize;

        for it in &self.rep.findings {
            if it.sev < self.opts.min_level {
                continue;
            }
            let tag = match it.sev {
                Severity::Info => "INFO",
                Severity::Warn => "WARN",
                Severity::Error => "ERR ",
            };
            match it.sev {
                Severity::Info => n_info += 1,
                Severity::Warn => n_warn += 1,
                Severity::Error => n_err += 1,
            }

            write!(
                f,
                "{}{tag}: {:<width$} {}",
                self.opts.prefix,
                it.kind.code(),
                it.msg,
                width = self.opts.pad_code
            )?;
            if let Some(addr) = it.addr {
                write!(f, " @{addr}")?;
            }
            if let (Some(exp), Some(act)) = (it.expected, it.actual) {
                write!(f, " (stored {exp:#X}, computed {act:#X})")?;
            }
            writeln!(f)?;
        }

        if self.opts.show_summary {
            writeln!(
                f,
                "{}Summary: errors={}  warns={}  infos={}",
                self.opts.prefix, n_err, n_warn, n_info
            )?;
        }

        Ok(())
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ReportDisplay {
            rep: self,
            opts: ReportDisplayOpts::default(),
        }
        .fmt(f)
    }
}

bitflags! {
    #[derive(Clone, Debug)]
    pub struct AuditPhases: u32 {
        const DIRECTORY = 1 << 0;
        const UPCASE    = 1 << 1;
        const CUSTOM    = 1 << 2; // free for FS
        const ALL       = u32::MAX;
    }
}

/// Generic options that the FS can encapsulate/extend.
pub trait AuditOptionsLike {
    fn phases(&self) -> AuditPhases {
        AuditPhases::ALL
    }
    fn fail_fast(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub struct AuditOptions {
    pub phases: AuditPhases,
    pub fail_fast: bool,
}

impl AuditOptionsLike for AuditOptions {
    fn phases(&self) -> AuditPhases {
        self.phases.clone()
    }
    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            phases: AuditPhases::ALL,
            fail_fast: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_report_counts_and_errors() {
        let mut rep = AuditReport::default();
        rep.push(Finding::info(FindingKind::Ok, "set verified"));
        rep.push(
            Finding::err(FindingKind::ChecksumMismatch, "set checksum")
                .at(RecordAddr::new(5, 2))
                .values(0x1234, 0x4321),
        );
        assert!(rep.has_error());
        assert_eq!(rep.count(Severity::Error), 1);
        assert_eq!(rep.count_kind(FindingKind::Ok), 1);
        assert_eq!(
            rep.first_error().map(|f| f.kind),
            Some(FindingKind::ChecksumMismatch)
        );
    }

    #[test]
    fn test_display_filters_and_annotates() {
        let mut rep = AuditReport::default();
        rep.push(Finding::info(FindingKind::Note, "bitmap record"));
        rep.push(
            Finding::err(FindingKind::HashMismatch, "name hash")
                .at(RecordAddr::new(4, 1))
                .values(0xBEEF, 0xFEED),
        );

        let all = format!("{rep}");
        assert!(all.contains("NOTE"));
        assert!(all.contains("@4/1"));
        assert!(all.contains("stored 0xBEEF"));

        let errs = format!("{}", rep.errors_only());
        assert!(!errs.contains("NOTE"));
        assert!(errs.contains("HASH.MISMATCH"));
    }

    #[test]
    fn test_phase_flags() {
        let opts = AuditOptions::default();
        assert!(opts.phases().contains(AuditPhases::DIRECTORY));
        assert!(opts.phases().contains(AuditPhases::UPCASE));
        assert!(!opts.fail_fast());
    }
}
