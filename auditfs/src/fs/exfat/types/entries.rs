// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::utils::checksum::RollingWord;
use crate::fs::exfat::constant::*;

/// Classification of a 32-byte directory record by its tag byte.
///
/// Closed over everything the on-disk format can produce: known types,
/// known-but-freed types (in-use bit clear), and unknowns either way.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    EndOfDirectory,
    Bitmap,
    UpcaseTable,
    VolumeLabel,
    VolumeGuid,
    File,
    StreamExtension,
    FileName,
    /// Known underlying type with the in-use bit cleared.
    Unused(u8),
    /// In-use bit set but the type is not one this auditor knows.
    UnknownUsed(u8),
    /// In-use bit clear and the underlying type is unknown too.
    UnknownFree(u8),
}

impl EntryKind {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            EXFAT_EOD => EntryKind::EndOfDirectory,
            EXFAT_ENTRY_BITMAP => EntryKind::Bitmap,
            EXFAT_ENTRY_UPCASE => EntryKind::UpcaseTable,
            EXFAT_ENTRY_LABEL => EntryKind::VolumeLabel,
            EXFAT_ENTRY_GUID => EntryKind::VolumeGuid,
            EXFAT_ENTRY_FILE => EntryKind::File,
            EXFAT_ENTRY_STREAM => EntryKind::StreamExtension,
            EXFAT_ENTRY_NAME => EntryKind::FileName,
            t if t & EXFAT_ENTRY_IN_USE != 0 => EntryKind::UnknownUsed(t),
            t if Self::known_base(t | EXFAT_ENTRY_IN_USE) => EntryKind::Unused(t),
            t => EntryKind::UnknownFree(t),
        }
    }

    fn known_base(tag: u8) -> bool {
        matches!(
            tag,
            EXFAT_ENTRY_BITMAP
                | EXFAT_ENTRY_UPCASE
                | EXFAT_ENTRY_LABEL
                | EXFAT_ENTRY_GUID
                | EXFAT_ENTRY_FILE
                | EXFAT_ENTRY_STREAM
                | EXFAT_ENTRY_NAME
        )
    }

    /// True for the three record types that form a file entry set.
    pub fn in_set(&self) -> bool {
        matches!(
            self,
            EntryKind::File | EntryKind::StreamExtension | EntryKind::FileName
        )
    }
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct FileEntry {
    pub entry_type: u8,
    pub secondary_count: u8,
    pub set_checksum: u16,
    pub file_attributes: u16,
    pub reserved1: u16,
    pub create_timestamp: u32,
    pub modify_timestamp: u32,
    pub access_timestamp: u32,
    pub create_10ms_increment: u8,
    pub modify_10ms_increment: u8,
    pub create_utc_offset: u8,
    pub modify_utc_offset: u8,
    pub access_utc_offset: u8,
    pub reserved2: [u8; 7],
}

impl FileEntry {
    pub fn new(file_attributes: u16, secondary_count: u8) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_FILE,
            secondary_count,
            set_checksum: 0, // can be computed later
            file_attributes,
            reserved1: 0,
            create_timestamp: 0,
            modify_timestamp: 0,
            access_timestamp: 0,
            create_10ms_increment: 0,
            modify_10ms_increment: 0,
            create_utc_offset: 0,
            modify_utc_offset: 0,
            access_utc_offset: 0,
            reserved2: [0u8; 7],
        }
    }

    /// Computes and stores the rotate-add checksum over the whole set,
    /// excluding the stored checksum field itself (bytes 2 and 3 of this
    /// record).
    pub fn compute_set_checksum(&mut self, stream: &StreamEntry, names: &[NameEntry]) {
        let mut sum = 0u16;
        for (i, &b) in self.as_bytes().iter().enumerate() {
            if i == 2 || i == 3 {
                continue;
            }
            sum = sum.ror1().add_byte(b);
        }
        for &b in stream.as_bytes() {
            sum = sum.ror1().add_byte(b);
        }
        for name in names {
            for &b in name.as_bytes() {
                sum = sum.ror1().add_byte(b);
            }
        }
        self.set_checksum = sum;
    }
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct StreamEntry {
    pub entry_type: u8,
    pub general_secondary_flags: u8,
    pub reserved1: u8,
    pub name_length: u8,
    pub name_hash: u16,
    pub reserved2: u16,
    pub valid_data_length: u64,
    pub reserved3: u32,
    pub first_cluster: u32,
    pub data_length: u64,
}

impl StreamEntry {
    pub fn new(first_cluster: u32, data_length: u64, name_length: u8, name_hash: u16) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_STREAM,
            general_secondary_flags: 0,
            reserved1: 0,
            name_length,
            name_hash,
            reserved2: 0,
            valid_data_length: data_length,
            reserved3: 0,
            first_cluster,
            data_length,
        }
    }
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct NameEntry {
    pub entry_type: u8,
    pub reserved: u8,
    pub name_chars: [u16; EXFAT_NAME_ENTRY_CHARS],
}

impl NameEntry {
    pub fn new(name_chars: [u16; EXFAT_NAME_ENTRY_CHARS]) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_NAME,
            reserved: 0,
            name_chars,
        }
    }

    /// Packs a UTF-16 name into as many name records as it needs,
    /// zero-padding the last one.
    pub fn pack(name_utf16: &[u16]) -> alloc::vec::Vec<NameEntry> {
        name_utf16
            .chunks(EXFAT_NAME_ENTRY_CHARS)
            .map(|chunk| {
                let mut chars = [0u16; EXFAT_NAME_ENTRY_CHARS];
                chars[..chunk.len()].copy_from_slice(chunk);
                NameEntry::new(chars)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(core::mem::size_of::<FileEntry>(), EXFAT_RECORD_SIZE);
        assert_eq!(core::mem::size_of::<StreamEntry>(), EXFAT_RECORD_SIZE);
        assert_eq!(core::mem::size_of::<NameEntry>(), EXFAT_RECORD_SIZE);
    }

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(EntryKind::from_tag(0x00), EntryKind::EndOfDirectory);
        assert_eq!(EntryKind::from_tag(0x85), EntryKind::File);
        assert_eq!(EntryKind::from_tag(0xC0), EntryKind::StreamExtension);
        assert_eq!(EntryKind::from_tag(0xC1), EntryKind::FileName);
        assert_eq!(EntryKind::from_tag(0x81), EntryKind::Bitmap);
        assert_eq!(EntryKind::from_tag(0x82), EntryKind::UpcaseTable);
        assert_eq!(EntryKind::from_tag(0x83), EntryKind::VolumeLabel);
        assert_eq!(EntryKind::from_tag(0xA0), EntryKind::VolumeGuid);
        // 0x05 = File with the in-use bit cleared
        assert_eq!(EntryKind::from_tag(0x05), EntryKind::Unused(0x05));
        assert_eq!(EntryKind::from_tag(0xE5), EntryKind::UnknownUsed(0xE5));
        assert_eq!(EntryKind::from_tag(0x7F), EntryKind::UnknownFree(0x7F));
    }

    #[test]
    fn test_set_checksum_changes_with_payload() {
        let names = NameEntry::pack(&"hello.txt".encode_utf16().collect::<alloc::vec::Vec<_>>());
        let stream = StreamEntry::new(8, 1024, 9, 0x1234);
        let mut primary = FileEntry::new(0x20, 1 + names.len() as u8);
        primary.compute_set_checksum(&stream, &names);
        let first = primary.set_checksum;

        let other_stream = StreamEntry::new(9, 1024, 9, 0x1234);
        primary.compute_set_checksum(&other_stream, &names);
        assert_ne!(first, { primary.set_checksum });
    }

    #[test]
    fn test_set_checksum_ignores_stored_field() {
        let names = NameEntry::pack(&"a".encode_utf16().collect::<alloc::vec::Vec<_>>());
        let stream = StreamEntry::new(8, 0, 1, 0);
        let mut primary = FileEntry::new(0, 1 + names.len() as u8);
        primary.compute_set_checksum(&stream, &names);
        let first = primary.set_checksum;

        primary.set_checksum = 0xFFFF;
        primary.compute_set_checksum(&stream, &names);
        assert_eq!(first, { primary.set_checksum });
    }

    #[test]
    fn test_name_packing() {
        let long: alloc::vec::Vec<u16> = "a-rather-long-file-name.bin".encode_utf16().collect();
        let names = NameEntry::pack(&long);
        assert_eq!(names.len(), long.len().div_ceil(EXFAT_NAME_ENTRY_CHARS));
        let first_chars = { names[0].name_chars };
        assert_eq!(first_chars[0], long[0]);
        // Last record is zero-padded past the name.
        let last_chars = { names.last().unwrap().name_chars };
        let used = long.len() - (names.len() - 1) * EXFAT_NAME_ENTRY_CHARS;
        assert!(last_chars[used..].iter().all(|&c| c == 0));
    }
}
