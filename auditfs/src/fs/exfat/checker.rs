// SPDX-License-Identifier: MIT

use auditio::prelude::*;
use zerocopy::FromBytes;

pub use crate::core::checker::*;

use crate::fs::exfat::chain;
use crate::fs::exfat::constant::*;
use crate::fs::exfat::dirset::{ScanStep, SetValidator};
use crate::fs::exfat::meta::ExFatMeta;
use crate::fs::exfat::source::{ClusterRecordSource, RawRecord, RecordSource};
use crate::fs::exfat::types::*;
use crate::fs::exfat::upcase::{self, UpcaseFold};

#[derive(Clone, Debug)]
pub struct ExFatAuditOptions {
    pub phases: AuditPhases,
    pub fail_fast: bool,
}

impl Default for ExFatAuditOptions {
    fn default() -> Self {
        Self {
            phases: AuditPhases::ALL,
            fail_fast: false,
        }
    }
}
impl AuditOptionsLike for ExFatAuditOptions {
    fn phases(&self) -> AuditPhases {
        self.phases.clone()
    }
    fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

/// Locations of the critical records captured while walking the root
/// directory. The up-case phase reads its table parameters from here.
#[derive(Default, Clone, Debug)]
pub struct RootCritical {
    pub bitmap_fc: Option<u32>,
    pub bitmap_len: Option<u64>,
    pub upcase_fc: Option<u32>,
    pub upcase_len: Option<u64>,
    pub upcase_table_checksum: Option<u32>,
    pub label_seen: bool,
}

pub struct ExFatAuditor<'a, IO: VolIO + ?Sized, F: UpcaseFold> {
    io: &'a mut IO,
    meta: &'a ExFatMeta,
    fold: F,
    root_crit: Option<RootCritical>,
}

impl<'a, IO: VolIO + ?Sized, F: UpcaseFold> ExFatAuditor<'a, IO, F> {
    pub fn new(io: &'a mut IO, meta: &'a ExFatMeta, fold: F) -> Self {
        Self {
            io,
            meta,
            fold,
            root_crit: None,
        }
    }

    /// Walks the root directory without emitting findings. Used when the
    /// up-case phase runs with the directory phase disabled.
    fn scan_root_critical(&mut self) -> AuditResult<RootCritical> {
        let clusters = chain::read(self.io, self.meta, self.meta.root_cluster)?;
        let records_per_cluster = self.meta.records_per_cluster();
        let mut crit = RootCritical::default();

        let mut src = ClusterRecordSource::new(&mut *self.io, self.meta);
        'outer: for &cluster in &clusters {
            for record in 0..records_per_cluster {
                let raw = src.read_record(RecordAddr::new(cluster, record))?;
                if raw[0] == EXFAT_EOD {
                    break 'outer;
                }
                capture_critical(&raw, &mut crit);
            }
        }
        Ok(crit)
    }
}

impl<'a, IO: VolIO + ?Sized, F: UpcaseFold> FsAudit for ExFatAuditor<'a, IO, F> {
    type Options = ExFatAuditOptions;

    fn check_directory(&mut self, _opt: &Self::Options, rep: &mut AuditReport) -> AuditResult<()> {
        let clusters = chain::read(self.io, self.meta, self.meta.root_cluster)?;
        let records_per_cluster = self.meta.records_per_cluster();
        let mut crit = RootCritical::default();

        let mut validator = SetValidator::new(&self.fold);
        let mut src = ClusterRecordSource::new(&mut *self.io, self.meta);
        'outer: for &cluster in &clusters {
            for record in 0..records_per_cluster {
                let addr = RecordAddr::new(cluster, record);
                let raw = src.read_record(addr)?;
                capture_critical(&raw, &mut crit);
                if validator.feed(addr, &raw, rep) == ScanStep::Stop {
                    break 'outer;
                }
            }
        }
        validator.finish(rep);

        self.root_crit = Some(crit);
        Ok(())
    }

    fn check_upcase(&mut self, _opt: &Self::Options, rep: &mut AuditReport) -> AuditResult<()> {
        let crit = match &self.root_crit {
            Some(c) => c.clone(),
            None => self.scan_root_critical()?,
        };

        let (fc, len, stored) = match (
            crit.upcase_fc,
            crit.upcase_len,
            crit.upcase_table_checksum,
        ) {
            (Some(fc), Some(len), Some(chk)) => (fc, len, chk),
            _ => crate::bail!(AuditError::Invalid("up-case table location not found")),
        };

        upcase::audit_table(
            &mut *self.io,
            self.meta,
            &self.fold,
            fc,
            len,
            Some(stored),
            rep,
        )
    }
}

fn capture_critical(raw: &RawRecord, crit: &mut RootCritical) {
    match EntryKind::from_tag(raw[0]) {
        EntryKind::Bitmap => {
            if let Ok(e) = BitmapEntry::read_from_bytes(&raw[..]) {
                crit.bitmap_fc = Some(e.first_cluster);
                crit.bitmap_len = Some(e.data_length);
            }
        }
        EntryKind::UpcaseTable => {
            if let Ok(e) = UpcaseEntry::read_from_bytes(&raw[..]) {
                crit.upcase_fc = Some(e.first_cluster);
                crit.upcase_len = Some(e.data_length);
                crit.upcase_table_checksum = Some(e.table_checksum);
            }
        }
        EntryKind::VolumeLabel => crit.label_seen = true,
        _ => {}
    }
}
