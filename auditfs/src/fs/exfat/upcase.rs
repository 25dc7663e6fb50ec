// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{format, vec};

use auditio::prelude::*;

use crate::core::checker::{AuditReport, Finding, FindingKind};
use crate::core::utils::checksum::accumulate_checksum;
use crate::core::{AuditError, AuditResult};
use crate::fs::exfat::chain;
use crate::fs::exfat::constant::*;
use crate::fs::exfat::meta::ExFatMeta;

/// Case-fold capability. The reference mapping is supplied by the
/// caller; this crate never ships its own fold table.
pub trait UpcaseFold {
    fn fold(&self, cu: u16) -> u16;
}

impl<F: Fn(u16) -> u16> UpcaseFold for F {
    #[inline(always)]
    fn fold(&self, cu: u16) -> u16 {
        self(cu)
    }
}

/// Cap on individually reported fold mismatches before summarizing.
const FOLD_SAMPLES: usize = 5;

/// Audits the on-disk up-case table against the reference fold.
///
/// Walks the table's chain for `len_bytes` bytes, decoding the
/// compressed encoding (`0xFFFF` escape + identity skip-run length) and
/// checking every explicit mapping against `fold`. The u32 rotate-add
/// checksum runs over every raw byte read, escapes and run lengths
/// included; when `expected` is given the computed value is compared
/// against it.
///
/// Encoding anomalies become findings. An out-of-range cluster or a
/// chain shorter than the declared length aborts the pass.
pub fn audit_table<IO, F>(
    io: &mut IO,
    meta: &ExFatMeta,
    fold: &F,
    first_cluster: u32,
    len_bytes: u64,
    expected: Option<u32>,
    rep: &mut AuditReport,
) -> AuditResult<()>
where
    IO: VolIO + ?Sized,
    F: UpcaseFold + ?Sized,
{
    let mut sum: u32 = 0;
    let mut dec = TableDecoder::new(fold);

    if len_bytes > 0 {
        let bytes_per_cluster = meta.bytes_per_cluster as usize;
        let mut remain = len_bytes as usize;
        let mut cur = first_cluster;
        let mut walked = 0usize;
        let mut pending: Option<u8> = None;
        let mut buf = vec![0u8; bytes_per_cluster];

        loop {
            crate::ensure!(
                meta.contains_cluster(cur),
                AuditError::Invalid("up-case cluster out of range")
            );

            let take = remain.min(bytes_per_cluster);
            io.read_at(meta.unit_offset(cur), &mut buf[..take])?;
            accumulate_checksum(&mut sum, &buf[..take]);

            // Decode complete little-endian u16 values, carrying a split
            // byte across cluster boundaries.
            let mut i = 0usize;
            if let Some(lo) = pending.take() {
                dec.push_unit(u16::from_le_bytes([lo, buf[0]]), rep);
                i = 1;
            }
            while i + 2 <= take {
                dec.push_unit(u16::from_le_bytes([buf[i], buf[i + 1]]), rep);
                i += 2;
            }
            if i < take {
                pending = Some(buf[i]);
            }

            remain -= take;
            if remain == 0 {
                dec.finish(pending.is_some(), rep);
                break;
            }

            let next = chain::next(io, meta, cur)?;
            crate::ensure!(
                next != EXFAT_EOC,
                AuditError::Invalid("up-case chain shorter than declared length")
            );
            cur = next;

            walked += 1;
            crate::ensure!(
                walked <= meta.cluster_count as usize,
                AuditError::Invalid("up-case chain loop/overflow")
            );
        }
    }

    match expected {
        Some(exp) if exp == sum => {
            rep.push(Finding::info(
                FindingKind::Ok,
                format!("up-case table checksum OK (0x{sum:08X})"),
            ));
        }
        Some(exp) => {
            rep.push(
                Finding::err(FindingKind::ChecksumMismatch, "up-case table checksum")
                    .values(exp, sum),
            );
        }
        None => {
            rep.push(Finding::info(
                FindingKind::Note,
                format!("up-case table checksum computed (0x{sum:08X})"),
            ));
        }
    }

    Ok(())
}

struct TableDecoder<'f, F: UpcaseFold + ?Sized> {
    fold: &'f F,
    cursor: u32,
    escape_pending: bool,
    active: bool,
    fold_mismatches: usize,
}

impl<'f, F: UpcaseFold + ?Sized> TableDecoder<'f, F> {
    fn new(fold: &'f F) -> Self {
        Self {
            fold,
            cursor: 0,
            escape_pending: false,
            active: true,
            fold_mismatches: 0,
        }
    }

    fn push_unit(&mut self, v: u16, rep: &mut AuditReport) {
        if !self.active {
            return;
        }

        if self.escape_pending {
            self.escape_pending = false;
            let run = v as u32;
            if self.cursor + run > EXFAT_UPCASE_CODE_POINTS {
                rep.push(Finding::err(
                    FindingKind::MalformedTable,
                    format!(
                        "skip-run of {run} at code point 0x{:04X} passes table end",
                        self.cursor
                    ),
                ));
                self.active = false;
                return;
            }
            // Skip-runs assert identity folding over the whole range.
            for cp in self.cursor..self.cursor + run {
                let got = self.fold.fold(cp as u16);
                if got != cp as u16 {
                    self.report_fold(cp as u16, cp as u16, got, rep);
                }
            }
            self.cursor += run;
            return;
        }

        if v == EXFAT_UPCASE_ESCAPE {
            self.escape_pending = true;
            return;
        }

        if self.cursor >= EXFAT_UPCASE_CODE_POINTS {
            rep.push(Finding::err(
                FindingKind::MalformedTable,
                "mapping data past the last code point",
            ));
            self.active = false;
            return;
        }

        let cp = self.cursor as u16;
        let want = self.fold.fold(cp);
        if v != want {
            self.report_fold(cp, want, v, rep);
        }
        self.cursor += 1;
    }

    fn finish(&mut self, dangling_byte: bool, rep: &mut AuditReport) {
        if self.active && dangling_byte {
            rep.push(Finding::err(
                FindingKind::MalformedTable,
                "odd table length, trailing byte not decodable",
            ));
        }
        if self.active && self.escape_pending {
            rep.push(Finding::err(
                FindingKind::MalformedTable,
                "table ends inside an escape, missing skip-run length",
            ));
        }
        if self.fold_mismatches > FOLD_SAMPLES {
            rep.push(Finding::err(
                FindingKind::FoldMismatch,
                format!("{} mappings disagree with reference fold", self.fold_mismatches),
            ));
        }
    }

    fn report_fold(&mut self, cp: u16, want: u16, got: u16, rep: &mut AuditReport) {
        self.fold_mismatches += 1;
        if self.fold_mismatches <= FOLD_SAMPLES {
            rep.push(
                Finding::err(
                    FindingKind::FoldMismatch,
                    format!("mapping for code point 0x{cp:04X}"),
                )
                .values(want as u32, got as u32),
            );
        }
    }
}
