// SPDX-License-Identifier: MIT

// Cluster numbering

pub const EXFAT_FIRST_CLUSTER: u32 = 2;
pub const EXFAT_EOC: u32 = 0xFFFFFFFF;
pub const EXFAT_BAD_CLUSTER: u32 = 0xFFFFFFF7;

// FAT Parameters

pub const EXFAT_FAT_ENTRY_SIZE: usize = 4;

// DirEntry Types

/// In-use bit: set on every record that is still allocated.
pub const EXFAT_ENTRY_IN_USE: u8 = 0x80;

pub const EXFAT_ENTRY_BITMAP: u8 = 0x81;
pub const EXFAT_ENTRY_UPCASE: u8 = 0x82;
pub const EXFAT_ENTRY_LABEL: u8 = 0x83;
pub const EXFAT_ENTRY_GUID: u8 = 0xA0;

pub const EXFAT_ENTRY_FILE: u8 = 0x85;
pub const EXFAT_ENTRY_STREAM: u8 = 0xC0;
pub const EXFAT_ENTRY_NAME: u8 = 0xC1;
pub const EXFAT_EOD: u8 = 0x00;

// Record geometry

pub const EXFAT_RECORD_SIZE: usize = 32;
pub const EXFAT_NAME_ENTRY_CHARS: usize = 15;
pub const EXFAT_MAX_NAME_UTF16_CHARS: usize = 255;

// Up-case table

/// One entry per UTF-16 code unit at most.
pub const EXFAT_UPCASE_CODE_POINTS: u32 = 0x10000;
/// Escape value introducing an identity skip-run.
pub const EXFAT_UPCASE_ESCAPE: u16 = 0xFFFF;
