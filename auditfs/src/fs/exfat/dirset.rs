// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::format;

use zerocopy::FromBytes;

use crate::core::checker::{AuditReport, Finding, FindingKind, RecordAddr};
use crate::core::utils::checksum::{RollingWord, accumulate_checksum_with_escape};
use crate::fs::exfat::constant::*;
use crate::fs::exfat::source::RawRecord;
use crate::fs::exfat::types::*;
use crate::fs::exfat::upcase::UpcaseFold;

/// Rolls the 16-bit set checksum over one record.
///
/// When the record is the File primary, bytes 2 and 3 hold the stored
/// checksum itself and are excluded. Seed 0 on the first record of a
/// set, the running value afterwards.
#[inline]
pub fn record_checksum(raw: &RawRecord, seed: u16) -> u16 {
    let skip = raw[0] == EXFAT_ENTRY_FILE;
    let mut sum = seed;
    accumulate_checksum_with_escape(&mut sum, raw, |i, _| skip && (i == 2 || i == 3));
    sum
}

/// Rolls the 16-bit name hash over case-folded UTF-16 units, low byte
/// then high byte, stopping at a zero terminator.
#[inline]
pub fn name_hash<F: UpcaseFold + ?Sized>(units: &[u16], fold: &F, seed: u16) -> u16 {
    let mut sum = seed;
    for &u in units {
        if u == 0 {
            break;
        }
        let [lo, hi] = fold.fold(u).to_le_bytes();
        sum = sum.ror1().add_byte(lo);
        sum = sum.ror1().add_byte(hi);
    }
    sum
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetState {
    /// No set open; next record may start one.
    Idle,
    /// File primary seen, a StreamExtension must follow.
    InFile,
    /// StreamExtension seen, the first FileName must follow.
    InStream,
    /// Consuming the remaining FileName records.
    InNames,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScanStep {
    Continue,
    Stop,
}

/// Incremental validator for file entry sets.
///
/// Fed one record at a time in directory order. Completed sets produce
/// one finding each (verified, or the specific mismatch); sequence
/// violations close the open set as malformed and the machine
/// resynchronizes on the violating record itself, so one bad set never
/// hides the sets after it.
pub struct SetValidator<'f, F: UpcaseFold + ?Sized> {
    fold: &'f F,
    state: SetState,
    start: RecordAddr,
    checksum: u16,
    stored_checksum: u16,
    hash: u16,
    stored_hash: u16,
    secondaries_left: u8,
    name_units_left: u8,
    names_seen: u8,
}

impl<'f, F: UpcaseFold + ?Sized> SetValidator<'f, F> {
    pub fn new(fold: &'f F) -> Self {
        Self {
            fold,
            state: SetState::Idle,
            start: RecordAddr::new(0, 0),
            checksum: 0,
            stored_checksum: 0,
            hash: 0,
            stored_hash: 0,
            secondaries_left: 0,
            name_units_left: 0,
            names_seen: 0,
        }
    }

    pub fn state(&self) -> SetState {
        self.state
    }

    /// Dispatches one record. `Stop` means end-of-directory was reached.
    pub fn feed(&mut self, addr: RecordAddr, raw: &RawRecord, rep: &mut AuditReport) -> ScanStep {
        let kind = EntryKind::from_tag(raw[0]);
        match (self.state, kind) {
            (SetState::Idle, _) => self.dispatch_idle(addr, raw, kind, rep),
            (SetState::InFile, EntryKind::StreamExtension) => {
                self.on_stream(raw, rep);
                ScanStep::Continue
            }
            (SetState::InStream | SetState::InNames, EntryKind::FileName) => {
                self.on_name(raw, rep);
                ScanStep::Continue
            }
            _ => {
                rep.push(
                    Finding::err(
                        FindingKind::MalformedSet,
                        format!("entry set interrupted by 0x{:02X} record", raw[0]),
                    )
                    .at(self.start),
                );
                self.reset();
                self.dispatch_idle(addr, raw, kind, rep)
            }
        }
    }

    /// Closes the scan when the record stream ends without an
    /// end-of-directory marker.
    pub fn finish(&mut self, rep: &mut AuditReport) {
        if self.state != SetState::Idle {
            rep.push(
                Finding::err(
                    FindingKind::MalformedSet,
                    "directory ended inside an entry set",
                )
                .at(self.start),
            );
            self.reset();
        }
    }

    fn dispatch_idle(
        &mut self,
        addr: RecordAddr,
        raw: &RawRecord,
        kind: EntryKind,
        rep: &mut AuditReport,
    ) -> ScanStep {
        match kind {
            EntryKind::EndOfDirectory => return ScanStep::Stop,
            EntryKind::File => match FileEntry::read_from_bytes(&raw[..]) {
                Ok(entry) if entry.secondary_count == 0 => {
                    rep.push(
                        Finding::err(
                            FindingKind::MalformedSet,
                            "file record declares no secondaries",
                        )
                        .at(addr),
                    );
                }
                Ok(entry) => {
                    self.start = addr;
                    self.checksum = record_checksum(raw, 0);
                    self.stored_checksum = entry.set_checksum;
                    self.secondaries_left = entry.secondary_count;
                    self.names_seen = 0;
                    self.state = SetState::InFile;
                }
                Err(_) => {
                    rep.push(
                        Finding::err(FindingKind::MalformedSet, "unreadable file record").at(addr),
                    );
                }
            },
            EntryKind::StreamExtension | EntryKind::FileName => {
                rep.push(
                    Finding::err(
                        FindingKind::MalformedSet,
                        format!("secondary record 0x{:02X} outside an entry set", raw[0]),
                    )
                    .at(addr),
                );
            }
            EntryKind::Bitmap => {
                rep.push(Finding::info(FindingKind::Note, "allocation bitmap record").at(addr));
            }
            EntryKind::UpcaseTable => {
                rep.push(Finding::info(FindingKind::Note, "up-case table record").at(addr));
            }
            EntryKind::VolumeLabel => {
                rep.push(Finding::info(FindingKind::Note, "volume label record").at(addr));
            }
            EntryKind::VolumeGuid => {
                rep.push(Finding::info(FindingKind::Note, "volume GUID record").at(addr));
            }
            EntryKind::Unused(t) => {
                rep.push(
                    Finding::info(FindingKind::UnknownType, format!("unused record 0x{t:02X}"))
                        .at(addr),
                );
            }
            EntryKind::UnknownUsed(t) => {
                rep.push(
                    Finding::info(
                        FindingKind::UnknownType,
                        format!("unknown in-use record 0x{t:02X}"),
                    )
                    .at(addr),
                );
            }
            EntryKind::UnknownFree(t) => {
                rep.push(
                    Finding::info(
                        FindingKind::UnknownType,
                        format!("unknown free record 0x{t:02X}"),
                    )
                    .at(addr),
                );
            }
        }
        ScanStep::Continue
    }

    fn on_stream(&mut self, raw: &RawRecord, rep: &mut AuditReport) {
        self.checksum = record_checksum(raw, self.checksum);

        match StreamEntry::read_from_bytes(&raw[..]) {
            Ok(entry) => {
                self.stored_hash = entry.name_hash;
                self.name_units_left = entry.name_length;
                self.hash = 0;
            }
            Err(_) => {
                rep.push(
                    Finding::err(FindingKind::MalformedSet, "unreadable stream record")
                        .at(self.start),
                );
                self.reset();
                return;
            }
        }

        self.secondaries_left -= 1;
        if self.secondaries_left == 0 {
            self.close(rep);
        } else {
            self.state = SetState::InStream;
        }
    }

    fn on_name(&mut self, raw: &RawRecord, rep: &mut AuditReport) {
        self.checksum = record_checksum(raw, self.checksum);

        if let Ok(entry) = NameEntry::read_from_bytes(&raw[..]) {
            let chars = { entry.name_chars };
            let take = (self.name_units_left as usize).min(EXFAT_NAME_ENTRY_CHARS);
            self.hash = name_hash(&chars[..take], self.fold, self.hash);
            self.name_units_left -= take as u8;
            self.names_seen += 1;
        }

        self.secondaries_left -= 1;
        // The set closes when either count runs out; surplus name
        // records then hit the Idle state as out-of-sequence records.
        if self.secondaries_left == 0 || self.name_units_left == 0 {
            self.close(rep);
        } else {
            self.state = SetState::InNames;
        }
    }

    fn close(&mut self, rep: &mut AuditReport) {
        let names_complete = self.name_units_left == 0;
        if !names_complete {
            rep.push(
                Finding::err(
                    FindingKind::MalformedSet,
                    format!("set closed with {} name units missing", self.name_units_left),
                )
                .at(self.start),
            );
        }

        let checksum_ok = self.checksum == self.stored_checksum;
        if !checksum_ok {
            rep.push(
                Finding::err(FindingKind::ChecksumMismatch, "entry set checksum")
                    .at(self.start)
                    .values(self.stored_checksum as u32, self.checksum as u32),
            );
        }

        // Hash comparison is only meaningful when all name units arrived.
        let hash_ok = self.hash == self.stored_hash;
        if names_complete && !hash_ok {
            rep.push(
                Finding::err(FindingKind::HashMismatch, "entry set name hash")
                    .at(self.start)
                    .values(self.stored_hash as u32, self.hash as u32),
            );
        }

        if names_complete && checksum_ok && hash_ok {
            rep.push(
                Finding::info(
                    FindingKind::Ok,
                    format!("entry set verified ({} name records)", self.names_seen),
                )
                .at(self.start),
            );
        }

        self.reset();
    }

    fn reset(&mut self) {
        self.state = SetState::Idle;
        self.checksum = 0;
        self.stored_checksum = 0;
        self.hash = 0;
        self.stored_hash = 0;
        self.secondaries_left = 0;
        self.name_units_left = 0;
        self.names_seen = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checker::Severity;
    use zerocopy::IntoBytes;

    fn ascii_fold(cu: u16) -> u16 {
        match cu {
            0x61..=0x7A => cu - 0x20,
            _ => cu,
        }
    }

    fn raw_of(bytes: &[u8]) -> RawRecord {
        let mut r = [0u8; EXFAT_RECORD_SIZE];
        r.copy_from_slice(bytes);
        r
    }

    /// Builds a consistent on-disk set for `name`: File + Stream + names.
    fn build_set(name: &str) -> Vec<RawRecord> {
        let units: Vec<u16> = name.encode_utf16().collect();
        let names = NameEntry::pack(&units);
        let hash = name_hash(&units, &ascii_fold, 0);
        let stream = StreamEntry::new(8, 1024, units.len() as u8, hash);
        let mut primary = FileEntry::new(0x20, 1 + names.len() as u8);
        primary.compute_set_checksum(&stream, &names);

        let mut out = vec![raw_of(primary.as_bytes()), raw_of(stream.as_bytes())];
        out.extend(names.iter().map(|n| raw_of(n.as_bytes())));
        out
    }

    fn feed_all(records: &[RawRecord], rep: &mut AuditReport) {
        let mut v = SetValidator::new(&ascii_fold);
        for (i, raw) in records.iter().enumerate() {
            if v.feed(RecordAddr::new(4, i as u32), raw, rep) == ScanStep::Stop {
                return;
            }
        }
        v.finish(rep);
    }

    #[test]
    fn test_valid_set() {
        let mut rep = AuditReport::default();
        feed_all(&build_set("hello.txt"), &mut rep);
        assert!(rep.ok(), "unexpected findings: {rep}");
        assert_eq!(rep.count_kind(FindingKind::Ok), 1);
    }

    #[test]
    fn test_long_name_set() {
        // 27 chars -> two name records
        let mut rep = AuditReport::default();
        feed_all(&build_set("a-rather-long-file-name.bin"), &mut rep);
        assert!(rep.ok(), "unexpected findings: {rep}");
    }

    #[test]
    fn test_hash_is_case_insensitive() {
        // Stored hash computed over the folded name; feeding the
        // lower-case spelling must still verify.
        let units_lower: Vec<u16> = "readme.md".encode_utf16().collect();
        let units_upper: Vec<u16> = "README.MD".encode_utf16().collect();
        assert_eq!(
            name_hash(&units_lower, &ascii_fold, 0),
            name_hash(&units_upper, &ascii_fold, 0)
        );
    }

    #[test]
    fn test_corrupt_stored_checksum() {
        let mut set = build_set("data.bin");
        set[0][2] ^= 0xFF; // stored set_checksum, excluded from the sum
        let mut rep = AuditReport::default();
        feed_all(&set, &mut rep);
        assert_eq!(rep.count_kind(FindingKind::ChecksumMismatch), 1);
        assert_eq!(rep.count(Severity::Error), 1);
    }

    #[test]
    fn test_corrupt_name_byte() {
        let mut set = build_set("data.bin");
        // Flip one name character: breaks both the set checksum and the hash.
        let last = set.len() - 1;
        set[last][2] ^= 0x01;
        let mut rep = AuditReport::default();
        feed_all(&set, &mut rep);
        assert_eq!(rep.count_kind(FindingKind::ChecksumMismatch), 1);
        assert_eq!(rep.count_kind(FindingKind::HashMismatch), 1);
    }

    #[test]
    fn test_corrupt_stored_hash_only() {
        let units: Vec<u16> = "x.y".encode_utf16().collect();
        let names = NameEntry::pack(&units);
        // Stored hash is wrong, but the checksum is computed over the
        // wrong value too, so only the hash finding fires.
        let stream = StreamEntry::new(8, 0, units.len() as u8, 0xBEEF);
        let mut primary = FileEntry::new(0, 1 + names.len() as u8);
        primary.compute_set_checksum(&stream, &names);

        let mut set = vec![raw_of(primary.as_bytes()), raw_of(stream.as_bytes())];
        set.extend(names.iter().map(|n| raw_of(n.as_bytes())));

        let mut rep = AuditReport::default();
        feed_all(&set, &mut rep);
        assert_eq!(rep.count_kind(FindingKind::ChecksumMismatch), 0);
        assert_eq!(rep.count_kind(FindingKind::HashMismatch), 1);
    }

    #[test]
    fn test_eod_inside_set() {
        let mut set = build_set("cut.txt");
        set.truncate(2);
        set.push([0u8; EXFAT_RECORD_SIZE]); // EOD while names are pending
        let mut rep = AuditReport::default();
        feed_all(&set, &mut rep);
        assert_eq!(rep.count_kind(FindingKind::MalformedSet), 1);
    }

    #[test]
    fn test_stream_without_file() {
        let stream = StreamEntry::new(8, 0, 1, 0);
        let mut rep = AuditReport::default();
        feed_all(&[raw_of(stream.as_bytes())], &mut rep);
        assert_eq!(rep.count_kind(FindingKind::MalformedSet), 1);
    }

    #[test]
    fn test_resync_after_interrupting_file() {
        // First set is cut short by a second File primary; the second
        // set must still verify.
        let mut records = build_set("first.txt");
        records.truncate(2);
        records.extend(build_set("second.txt"));
        let mut rep = AuditReport::default();
        feed_all(&records, &mut rep);
        assert_eq!(rep.count_kind(FindingKind::MalformedSet), 1);
        assert_eq!(rep.count_kind(FindingKind::Ok), 1);
    }

    #[test]
    fn test_zero_secondary_count() {
        let primary = FileEntry::new(0, 0);
        let mut rep = AuditReport::default();
        feed_all(&[raw_of(primary.as_bytes())], &mut rep);
        assert_eq!(rep.count_kind(FindingKind::MalformedSet), 1);
    }

    #[test]
    fn test_unknown_and_metadata_records() {
        let mut unknown = [0u8; EXFAT_RECORD_SIZE];
        unknown[0] = 0xE5;
        let bitmap = BitmapEntry::new(2, 8);
        let mut rep = AuditReport::default();
        feed_all(&[raw_of(bitmap.as_bytes()), unknown], &mut rep);
        assert!(rep.ok());
        assert_eq!(rep.count_kind(FindingKind::Note), 1);
        assert_eq!(rep.count_kind(FindingKind::UnknownType), 1);
    }

    #[test]
    fn test_surplus_name_record_closes_set() {
        // Declared name length covered by the first name record, but the
        // secondary count promises one more. The set closes at name
        // exhaustion and the surplus record lands out of sequence.
        let units: Vec<u16> = "ab".encode_utf16().collect();
        let mut names = NameEntry::pack(&units);
        names.push(NameEntry::new([0x41; EXFAT_NAME_ENTRY_CHARS]));
        let hash = name_hash(&units, &ascii_fold, 0);
        let stream = StreamEntry::new(8, 0, units.len() as u8, hash);
        let mut primary = FileEntry::new(0x20, 1 + names.len() as u8);
        primary.compute_set_checksum(&stream, &names);

        let mut set = vec![raw_of(primary.as_bytes()), raw_of(stream.as_bytes())];
        set.extend(names.iter().map(|n| raw_of(n.as_bytes())));

        let mut rep = AuditReport::default();
        feed_all(&set, &mut rep);
        assert_eq!(rep.count_kind(FindingKind::Ok), 0);
        assert_eq!(rep.count_kind(FindingKind::MalformedSet), 1);
        // The early close compared against a checksum stored over the
        // surplus record too.
        assert_eq!(rep.count_kind(FindingKind::ChecksumMismatch), 1);
    }

    #[test]
    fn test_truncated_stream_end() {
        // Record stream ends mid-set without EOD.
        let mut set = build_set("tail.txt");
        set.pop();
        let mut rep = AuditReport::default();
        feed_all(&set, &mut rep);
        assert_eq!(rep.count_kind(FindingKind::MalformedSet), 1);
    }

    #[test]
    fn test_checksum_excludes_stored_field_only_for_file() {
        let set = build_set("f");
        let a = record_checksum(&set[1], 0);
        let mut mutated = set[1];
        mutated[2] ^= 0xFF;
        // Bytes 2..3 of a stream record are part of the sum.
        assert_ne!(a, record_checksum(&mutated, 0));
    }
}
