// SPDX-License-Identifier: MIT

use crate::core::{AuditError, AuditResult};
use crate::fs::exfat::constant::*;

/// Volume geometry the audit passes need. Supplied by the caller from
/// already-parsed boot-sector fields; this crate does not define the
/// boot-sector layout itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExFatMeta {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u32,
    pub bytes_per_cluster: u32,

    pub fat_offset_bytes: u64,
    pub cluster_heap_offset_bytes: u64,
    pub cluster_count: u32,

    pub root_cluster: u32,
}

impl ExFatMeta {
    pub fn new(
        bytes_per_sector: u16,
        sectors_per_cluster: u32,
        fat_offset_bytes: u64,
        cluster_heap_offset_bytes: u64,
        cluster_count: u32,
        root_cluster: u32,
    ) -> AuditResult<Self> {
        crate::ensure!(
            bytes_per_sector != 0 && bytes_per_sector.is_power_of_two(),
            AuditError::Invalid("bytes_per_sector must be a nonzero power of two")
        );
        crate::ensure!(
            sectors_per_cluster != 0,
            AuditError::Invalid("sectors_per_cluster must be nonzero")
        );
        crate::ensure!(
            cluster_count != 0,
            AuditError::Invalid("cluster_count must be nonzero")
        );

        let bytes_per_cluster = (bytes_per_sector as u32)
            .checked_mul(sectors_per_cluster)
            .ok_or(AuditError::Invalid("cluster size overflow"))?;

        let meta = Self {
            bytes_per_sector,
            sectors_per_cluster,
            bytes_per_cluster,
            fat_offset_bytes,
            cluster_heap_offset_bytes,
            cluster_count,
            root_cluster,
        };

        crate::ensure!(
            meta.contains_cluster(root_cluster),
            AuditError::Invalid("root cluster out of heap range")
        );

        Ok(meta)
    }

    /// Byte offset of a cluster in the heap. Cluster numbering starts at 2.
    #[inline]
    pub fn unit_offset(&self, cluster: u32) -> u64 {
        self.cluster_heap_offset_bytes
            + ((cluster - EXFAT_FIRST_CLUSTER) as u64 * self.bytes_per_cluster as u64)
    }

    /// Byte offset of the FAT entry for `cluster` (primary FAT).
    #[inline]
    pub fn fat_entry_offset(&self, cluster: u32) -> u64 {
        self.fat_offset_bytes + cluster as u64 * EXFAT_FAT_ENTRY_SIZE as u64
    }

    #[inline]
    pub fn records_per_cluster(&self) -> u32 {
        self.bytes_per_cluster / EXFAT_RECORD_SIZE as u32
    }

    #[inline]
    pub fn first_data_unit(&self) -> u32 {
        EXFAT_FIRST_CLUSTER
    }

    #[inline]
    pub fn last_data_unit(&self) -> u32 {
        EXFAT_FIRST_CLUSTER + self.cluster_count - 1
    }

    #[inline]
    pub fn contains_cluster(&self, cluster: u32) -> bool {
        (self.first_data_unit()..=self.last_data_unit()).contains(&cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ExFatMeta {
        ExFatMeta::new(512, 2, 1024, 8192, 64, 4).unwrap()
    }

    #[test]
    fn test_offsets() {
        let m = meta();
        assert_eq!(m.bytes_per_cluster, 1024);
        assert_eq!(m.unit_offset(2), 8192);
        assert_eq!(m.unit_offset(4), 8192 + 2 * 1024);
        assert_eq!(m.fat_entry_offset(3), 1024 + 12);
        assert_eq!(m.records_per_cluster(), 32);
    }

    #[test]
    fn test_cluster_bounds() {
        let m = meta();
        assert!(!m.contains_cluster(0));
        assert!(!m.contains_cluster(1));
        assert!(m.contains_cluster(2));
        assert!(m.contains_cluster(65));
        assert!(!m.contains_cluster(66));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(ExFatMeta::new(0, 2, 0, 0, 64, 4).is_err());
        assert!(ExFatMeta::new(513, 2, 0, 0, 64, 4).is_err());
        assert!(ExFatMeta::new(512, 0, 0, 0, 64, 4).is_err());
        assert!(ExFatMeta::new(512, 2, 0, 0, 0, 4).is_err());
        // Root outside the heap
        assert!(ExFatMeta::new(512, 2, 0, 0, 8, 100).is_err());
    }
}
