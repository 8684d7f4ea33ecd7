use {
    crate::{
        crc32::crc32,
        datetime::{DosDateTime, ZipDateTime},
        error::{ZipError, ZipResult},
        specs::{CentralDirectoryHeader, EndOfCentralDirectoryRecord, LocalFileHeader, ZipSpecs},
    },
    rayon::prelude::*,
    tracing::{debug, trace},
};

/// Content type to serve a built archive with.
pub const MIME_TYPE: &str = "application/zip";

/// One file to store. The name is written verbatim, so callers are
/// responsible for making it relative and unique.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Entry {
    pub name: String,
    pub content: Vec<u8>,
}

impl Entry {
    pub fn new<N, C>(name: N, content: C) -> Self
    where
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Bytes this entry occupies before the central directory.
    fn local_length(&self) -> u64 {
        (LocalFileHeader::LENGTH + self.name.len() + self.content.len()) as u64
    }
}

/// Fold state: running offset plus the two output streams.
#[derive(Debug, Default)]
struct Assembly {
    offset: u64,
    entries: usize,
    local: Vec<u8>,
    central: Vec<u8>,
}

impl Assembly {
    fn with_capacity(local: usize, central: usize) -> Self {
        Self {
            local: Vec::with_capacity(local),
            central: Vec::with_capacity(central),
            ..Self::default()
        }
    }

    fn push(mut self, entry: &Entry, crc32: u32, last_mod: DosDateTime) -> Self {
        let name = entry.name.as_bytes();
        let content = entry.content.as_slice();
        let local =
            LocalFileHeader::stored(last_mod, crc32, content.len() as u32, name.len() as u16);
        let central = CentralDirectoryHeader::for_local(&local, self.offset as u32);

        trace!(
            name = %entry.name,
            offset = self.offset,
            size = content.len(),
            crc32 = format_args!("{crc32:#010x}"),
            "stored entry"
        );

        local.write_to(&mut self.local);
        self.local.extend_from_slice(name);
        self.local.extend_from_slice(content);

        central.write_to(&mut self.central);
        self.central.extend_from_slice(name);

        self.offset += entry.local_length();
        self.entries += 1;
        self
    }

    fn finish(self) -> Vec<u8> {
        let Self {
            offset,
            entries,
            mut local,
            central,
        } = self;
        debug_assert_eq!(offset, local.len() as u64);

        let end =
            EndOfCentralDirectoryRecord::new(entries as u16, central.len() as u32, offset as u32);

        local.reserve_exact(central.len() + EndOfCentralDirectoryRecord::LENGTH);
        local.extend_from_slice(&central);
        end.write_to(&mut local);
        local
    }
}

/// Builds an uncompressed archive holding `entries` in the given order,
/// all stamped with `generated_at`.
///
/// The output is deterministic for identical inputs. Classic ZIP fields are
/// 16 and 32 bits wide: inputs past those limits (see [`try_build_zip`]) are
/// written truncated, so use the checked variant for untrusted sizes.
///
/// Entry checksums are spread over the rayon pool; the call blocks until the
/// whole archive is assembled.
pub fn build_zip<T>(entries: &[Entry], generated_at: T) -> Vec<u8>
where
    T: Into<ZipDateTime>,
{
    let last_mod = generated_at.into().to_dos();
    let checksums: Vec<u32> = entries
        .par_iter()
        .map(|entry| crc32(&entry.content))
        .collect();

    let local_capacity = entries.iter().map(Entry::local_length).sum::<u64>() as usize;
    let central_capacity = entries
        .iter()
        .map(|entry| CentralDirectoryHeader::LENGTH + entry.name.len())
        .sum();

    let archive = entries
        .iter()
        .zip(checksums)
        .fold(
            Assembly::with_capacity(local_capacity, central_capacity),
            |assembly, (entry, crc32)| assembly.push(entry, crc32, last_mod),
        )
        .finish();

    debug!(
        entries = entries.len(),
        bytes = archive.len(),
        "assembled zip archive"
    );
    archive
}

/// Same bytes as [`build_zip`], refusing inputs that need zip64.
pub fn try_build_zip<T>(entries: &[Entry], generated_at: T) -> ZipResult<Vec<u8>>
where
    T: Into<ZipDateTime>,
{
    check_limits(entries)?;
    Ok(build_zip(entries, generated_at))
}

// All-ones values are zip64 placeholders, so the limits are exclusive.
fn check_limits(entries: &[Entry]) -> ZipResult<()> {
    if entries.len() >= u16::MAX as usize {
        return Err(ZipError::FeatureNotSupported(
            format!("{} entries need zip64", entries.len()).into(),
        ));
    }

    let mut local_length: u64 = 0;
    let mut central_length: u64 = 0;
    for entry in entries {
        if entry.name.len() > u16::MAX as usize {
            return Err(ZipError::FeatureNotSupported(
                format!("entry name of {} bytes is too long", entry.name.len()).into(),
            ));
        }
        if entry.content.len() as u64 >= u32::MAX as u64 {
            return Err(ZipError::FeatureNotSupported(
                format!("{:?} is too large without zip64", entry.name).into(),
            ));
        }
        local_length += entry.local_length();
        central_length += (CentralDirectoryHeader::LENGTH + entry.name.len()) as u64;
    }

    if local_length >= u32::MAX as u64 || central_length >= u32::MAX as u64 {
        return Err(ZipError::FeatureNotSupported(
            "archive offsets exceed 32 bits".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::{build_zip, try_build_zip, Entry},
        crate::{
            crc32::crc32,
            datetime::ZipDateTime,
            error::ZipError,
            specs::{CentralDirectoryHeader, EndOfCentralDirectoryRecord, ZipSpecs},
        },
        chrono::{TimeZone, Utc},
        proptest::prelude::*,
        std::io::{Cursor, Read},
    };

    fn generated_at() -> ZipDateTime {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap().into()
    }

    fn export_entries() -> Vec<Entry> {
        vec![
            Entry::new("a.csv", "id,name\n1,Acme"),
            Entry::new("b.json", "{\"id\":1}"),
        ]
    }

    fn end_record(bytes: &[u8]) -> EndOfCentralDirectoryRecord {
        let tail = &bytes[bytes.len() - EndOfCentralDirectoryRecord::SIZE..];
        EndOfCentralDirectoryRecord::try_from(<[u8; 18]>::try_from(tail).unwrap()).unwrap()
    }

    fn central_headers(bytes: &[u8]) -> Vec<(CentralDirectoryHeader, Vec<u8>)> {
        let end = end_record(bytes);
        let mut at = end.central_directory_offset as usize;
        (0..end.number_of_entries)
            .map(|_| {
                assert_eq!(
                    &bytes[at..at + 4],
                    &CentralDirectoryHeader::SIGNATURE.to_le_bytes()
                );
                let fixed = <[u8; 42]>::try_from(&bytes[at + 4..at + 46]).unwrap();
                let header = CentralDirectoryHeader::try_from(fixed).unwrap();
                let name_start = at + CentralDirectoryHeader::LENGTH;
                let name_end = name_start + header.file_name_length as usize;
                let name = bytes[name_start..name_end].to_vec();
                at = name_start + header.variable_length();
                (header, name)
            })
            .collect()
    }

    #[test]
    fn empty_archive_is_a_bare_end_record() {
        let bytes = build_zip(&[], generated_at());

        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[..4], b"PK\x05\x06");
        assert!(bytes[4..].iter().all(|b| *b == 0));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
        assert!(archive.by_index(0).is_err());
    }

    #[test]
    fn export_scenario() {
        let bytes = build_zip(&export_entries(), generated_at());

        assert_eq!(
            bytes.len(),
            30 + 5 + 14 + 30 + 6 + 8 + (46 + 5 + 46 + 6) + 22
        );

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut csv = String::new();
        archive
            .by_name("a.csv")
            .unwrap()
            .read_to_string(&mut csv)
            .unwrap();
        assert_eq!(csv, "id,name\n1,Acme");

        let json = archive.by_index(1).unwrap();
        assert_eq!(json.name(), "b.json");
        assert_eq!(json.size(), 8);
        assert_eq!(json.crc32(), crc32(b"{\"id\":1}"));
    }

    #[test]
    fn local_headers_carry_the_shared_timestamp() {
        let bytes = build_zip(&export_entries(), generated_at());
        let dos = generated_at().to_dos().to_le_bytes();
        let second = 30 + 5 + 14;

        assert_eq!(&bytes[0..4], b"PK\x03\x04");
        assert_eq!(&bytes[10..14], &dos);
        assert_eq!(&bytes[30..35], b"a.csv");
        assert_eq!(&bytes[35..49], b"id,name\n1,Acme");
        assert_eq!(&bytes[second..second + 4], b"PK\x03\x04");
        assert_eq!(&bytes[second + 10..second + 14], &dos);
    }

    #[test]
    fn central_offsets_follow_local_segments() {
        let entries = vec![
            Entry::new("reports/summary.pdf", vec![0x25u8; 300]),
            Entry::new("empty.txt", Vec::<u8>::new()),
            Entry::new("mentions.csv", "brand,engine,count\nacme,chat,4\n"),
        ];
        let bytes = build_zip(&entries, generated_at());
        let headers = central_headers(&bytes);

        let mut expected = 0u32;
        for ((header, name), entry) in headers.iter().zip(&entries) {
            assert_eq!(header.file_header_offset, expected);
            assert_eq!(name.as_slice(), entry.name.as_bytes());
            assert_eq!(&bytes[expected as usize..expected as usize + 4], b"PK\x03\x04");
            expected += (30 + entry.name.len() + entry.content.len()) as u32;
        }

        let end = end_record(&bytes);
        assert_eq!(end.central_directory_offset, expected);
        assert_eq!(end.number_of_entries, 3);
        assert_eq!(end.number_of_entries_in_disk, 3);
        assert_eq!(
            end.central_directory_size as usize,
            bytes.len() - expected as usize - 22
        );
    }

    #[test]
    fn duplicate_names_are_written_verbatim() {
        let entries = vec![
            Entry::new("dup.csv", "first"),
            Entry::new("dup.csv", "second"),
        ];
        let bytes = build_zip(&entries, generated_at());
        let headers = central_headers(&bytes);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].1, b"dup.csv");
        assert_eq!(headers[1].1, b"dup.csv");
        assert_eq!(headers[1].0.crc32, crc32(b"second"));
    }

    #[test]
    fn output_is_deterministic() {
        let first = build_zip(&export_entries(), generated_at());
        let second = build_zip(&export_entries(), generated_at());

        assert_eq!(first, second);
    }

    #[test]
    fn checksums_keep_entry_order() {
        let entries: Vec<Entry> = (0..512u32)
            .map(|idx| {
                let content = idx.to_le_bytes().repeat(idx as usize);
                Entry::new(format!("part-{idx:03}.bin"), content)
            })
            .collect();
        let bytes = build_zip(&entries, generated_at());
        let headers = central_headers(&bytes);

        assert_eq!(headers.len(), entries.len());
        for (entry, (header, name)) in entries.iter().zip(headers) {
            assert_eq!(name, entry.name.as_bytes());
            assert_eq!(header.crc32, crc32(&entry.content));
        }
    }

    #[test]
    fn pre_1980_timestamps_clamp() {
        let old = Utc.with_ymd_and_hms(1975, 3, 2, 8, 0, 0).unwrap();
        let bytes = build_zip(&export_entries(), old);
        let date = u16::from_le_bytes([bytes[12], bytes[13]]);

        assert_eq!(date >> 9, 0);
    }

    #[test]
    fn checked_build_matches_unchecked() {
        let checked = try_build_zip(&export_entries(), generated_at()).unwrap();

        assert_eq!(checked, build_zip(&export_entries(), generated_at()));
    }

    #[test]
    fn checked_build_rejects_long_names() {
        let entries = vec![Entry::new("n".repeat(u16::MAX as usize + 1), "x")];

        assert!(matches!(
            try_build_zip(&entries, generated_at()),
            Err(ZipError::FeatureNotSupported(_))
        ));
    }

    #[test]
    fn checked_build_rejects_too_many_entries() {
        let entries = vec![Entry::default(); u16::MAX as usize];

        assert!(matches!(
            try_build_zip(&entries, generated_at()),
            Err(ZipError::FeatureNotSupported(_))
        ));
    }

    fn entries_strategy() -> impl Strategy<Value = Vec<Entry>> {
        proptest::collection::vec(
            (
                "[a-z]{1,12}(\\.(csv|json|pdf))?",
                proptest::collection::vec(any::<u8>(), 0..512),
            ),
            0..12,
        )
        .prop_map(|files| {
            files
                .into_iter()
                .enumerate()
                .map(|(idx, (name, content))| Entry::new(format!("{idx}/{name}"), content))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn standard_reader_round_trip(entries in entries_strategy()) {
            let bytes = build_zip(&entries, generated_at());
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

            prop_assert_eq!(archive.len(), entries.len());
            for (idx, entry) in entries.iter().enumerate() {
                let mut file = archive.by_index(idx).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();

                prop_assert_eq!(file.name(), entry.name.as_str());
                prop_assert_eq!(&content, &entry.content);
            }
        }

        #[test]
        fn offsets_are_cumulative(entries in entries_strategy()) {
            let bytes = build_zip(&entries, generated_at());
            let headers = central_headers(&bytes);

            let mut expected = 0u32;
            for ((header, _), entry) in headers.iter().zip(&entries) {
                prop_assert_eq!(header.file_header_offset, expected);
                expected += (30 + entry.name.len() + entry.content.len()) as u32;
            }
            prop_assert_eq!(end_record(&bytes).central_directory_offset, expected);
        }
    }
}
