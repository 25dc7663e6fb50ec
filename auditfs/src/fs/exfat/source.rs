// SPDX-License-Identifier: MIT

use auditio::prelude::*;

use crate::core::checker::RecordAddr;
use crate::core::{AuditError, AuditResult};
use crate::fs::exfat::constant::*;
use crate::fs::exfat::meta::ExFatMeta;

pub type RawRecord = [u8; EXFAT_RECORD_SIZE];

/// Capability to fetch one 32-byte directory record by address.
///
/// Within one pass, repeated reads of the same address must return the
/// same bytes. A read failure is an infrastructure failure and aborts
/// the pass; no retry happens here.
pub trait RecordSource {
    fn read_record(&mut self, addr: RecordAddr) -> AuditResult<RawRecord>;
}

/// Record source over a `VolIO` volume and its geometry.
pub struct ClusterRecordSource<'a, IO: VolIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a ExFatMeta,
}

impl<'a, IO: VolIO + ?Sized> ClusterRecordSource<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a ExFatMeta) -> Self {
        Self { io, meta }
    }

    fn record_offset(&self, addr: RecordAddr) -> AuditResult<u64> {
        crate::ensure!(
            self.meta.contains_cluster(addr.cluster),
            AuditError::Invalid("record cluster out of heap range")
        );
        crate::ensure!(
            addr.record < self.meta.records_per_cluster(),
            AuditError::Invalid("record index out of cluster range")
        );
        Ok(self.meta.unit_offset(addr.cluster) + addr.record as u64 * EXFAT_RECORD_SIZE as u64)
    }
}

impl<'a, IO: VolIO + ?Sized> RecordSource for ClusterRecordSource<'a, IO> {
    fn read_record(&mut self, addr: RecordAddr) -> AuditResult<RawRecord> {
        let off = self.record_offset(addr)?;
        let mut raw = [0u8; EXFAT_RECORD_SIZE];
        self.io.read_at(off, &mut raw)?;
        Ok(raw)
    }
}
