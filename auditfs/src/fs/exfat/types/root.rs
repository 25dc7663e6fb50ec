// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::exfat::constant::*;

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct BitmapEntry {
    pub entry_type: u8,
    pub bitmap_flags: u8,
    pub reserved: [u8; 18],
    pub first_cluster: u32,
    pub data_length: u64,
}

impl BitmapEntry {
    pub fn new(first_cluster: u32, data_length: u64) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_BITMAP,
            bitmap_flags: 0,
            reserved: [0u8; 18],
            first_cluster,
            data_length,
        }
    }
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct UpcaseEntry {
    pub entry_type: u8,
    pub reserved1: [u8; 3],
    pub table_checksum: u32,
    pub reserved2: [u8; 12],
    pub first_cluster: u32,
    pub data_length: u64,
}

impl UpcaseEntry {
    pub fn new(first_cluster: u32, table_len: u64, table_checksum: u32) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_UPCASE,
            reserved1: [0u8; 3],
            table_checksum,
            reserved2: [0u8; 12],
            first_cluster,
            data_length: table_len,
        }
    }
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct VolumeLabelEntry {
    pub entry_type: u8,
    pub character_count: u8,
    pub volume_label: [u16; 11],
    pub reserved: u64,
}

impl VolumeLabelEntry {
    pub fn new(volume_label: [u16; 11]) -> Self {
        let character_count = volume_label.iter().take_while(|&&c| c != 0).count() as u8;

        Self {
            entry_type: EXFAT_ENTRY_LABEL,
            character_count,
            volume_label,
            reserved: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_record_sizes() {
        assert_eq!(core::mem::size_of::<BitmapEntry>(), EXFAT_RECORD_SIZE);
        assert_eq!(core::mem::size_of::<UpcaseEntry>(), EXFAT_RECORD_SIZE);
        assert_eq!(core::mem::size_of::<VolumeLabelEntry>(), EXFAT_RECORD_SIZE);
    }

    #[test]
    fn test_upcase_entry_round_trip() {
        let e = UpcaseEntry::new(3, 5836, 0xE619D30D);
        let raw = e.as_bytes();
        let back = UpcaseEntry::read_from_bytes(raw).unwrap();
        assert_eq!({ back.first_cluster }, 3);
        assert_eq!({ back.data_length }, 5836);
        assert_eq!({ back.table_checksum }, 0xE619D30D);
    }

    #[test]
    fn test_label_char_count() {
        let mut label = [0u16; 11];
        for (i, c) in "DATA".encode_utf16().enumerate() {
            label[i] = c;
        }
        let e = VolumeLabelEntry::new(label);
        assert_eq!(e.character_count, 4);
    }
}
