// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use auditio::prelude::*;

use crate::core::{AuditError, AuditResult};
use crate::fs::exfat::constant::*;
use crate::fs::exfat::meta::ExFatMeta;

/// Reads the FAT entry for `cluster` from the primary FAT.
#[inline]
pub fn next<IO: VolIO + ?Sized>(io: &mut IO, meta: &ExFatMeta, cluster: u32) -> AuditResult<u32> {
    crate::ensure!(
        meta.contains_cluster(cluster),
        AuditError::Invalid("cluster out of heap range")
    );
    let v = io.read_u32_at(meta.fat_entry_offset(cluster))?;
    Ok(v)
}

/// Reads an entire chain into a vector of clusters.
///
/// Stops at EOC. A chain longer than the cluster count means a loop, an
/// out-of-range link means corruption; both abort.
pub fn read<IO: VolIO + ?Sized>(
    io: &mut IO,
    meta: &ExFatMeta,
    start_cluster: u32,
) -> AuditResult<Vec<u32>> {
    let mut chain = Vec::new();
    let mut current = start_cluster;

    loop {
        crate::ensure!(
            meta.contains_cluster(current),
            AuditError::Invalid("cluster out of range in chain")
        );
        chain.push(current);
        crate::ensure!(
            chain.len() <= meta.cluster_count as usize,
            AuditError::Invalid("loop detected in chain")
        );

        let link = next(io, meta, current)?;
        if link == EXFAT_EOC {
            return Ok(chain);
        }
        crate::ensure!(
            link != EXFAT_BAD_CLUSTER,
            AuditError::Invalid("bad cluster in chain")
        );
        current = link;
    }
}
