// SPDX-License-Identifier: MIT

mod types;

pub use types::{
    AuditOptions, AuditOptionsLike, AuditPhases, AuditReport, Finding, FindingKind, RecordAddr,
    ReportDisplay, ReportDisplayOpts, Severity,
};

pub use crate::core::errors::{AuditError, AuditResult};

/// Trait for auditing the on-disk structures of a filesystem.
///
/// Implemented per filesystem to run its consistency passes (directory
/// entry sets, special tables...). Anomalies in the volume become
/// findings in the report; only infrastructure failures (unreadable
/// source, unlocatable structure) surface as `Err`.
pub trait FsAudit {
    type Options: AuditOptionsLike + Default;

    fn check_with(&mut self, opt: &Self::Options) -> AuditResult<AuditReport> {
        let mut rep = AuditReport::default();
        if !self.run_phase(opt, &mut rep, AuditPhases::DIRECTORY, Self::check_directory)? {
            return Ok(rep);
        }
        if !self.run_phase(opt, &mut rep, AuditPhases::UPCASE, Self::check_upcase)? {
            return Ok(rep);
        }
        self.run_phase(opt, &mut rep, AuditPhases::CUSTOM, Self::check_custom)?;
        Ok(rep)
    }

    fn check_all(&mut self) -> AuditResult<AuditReport> {
        self.check_with(&Self::Options::default())
    }

    fn check_directory(&mut self, _opt: &Self::Options, _rep: &mut AuditReport) -> AuditResult<()> {
        Ok(())
    }
    fn check_upcase(&mut self, _opt: &Self::Options, _rep: &mut AuditReport) -> AuditResult<()> {
        Ok(())
    }
    fn check_custom(&mut self, _opt: &Self::Options, _rep: &mut AuditReport) -> AuditResult<()> {
        Ok(())
    }

    /// Runs one phase if enabled. Returns `Ok(false)` when `fail_fast`
    /// is set and the phase left an error-severity finding, so the
    /// driver stops before the next phase.
    fn run_phase<F>(
        &mut self,
        opt: &Self::Options,
        rep: &mut AuditReport,
        phase: AuditPhases,
        f: F,
    ) -> AuditResult<bool>
    where
        F: Fn(&mut Self, &Self::Options, &mut AuditReport) -> AuditResult<()>,
    {
        if opt.phases().contains(phase) {
            f(self, opt, rep)?;
            if opt.fail_fast() && rep.has_error() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
