pub mod compression;

use {
    crate::{
        datetime::{DosDateTime, ZipDateTime},
        ZipError, ZipResult,
    },
    compression::Compression,
};

pub(crate) const SIGNATURE_LENGTH: u8 = 4;
/// Version 2.0: stored entries, no zip64.
pub(crate) const VERSION: u16 = 20;

pub(crate) trait ZipSpecs {
    /// Fixed bytes following the signature.
    const SIZE: usize;
    const SIGNATURE: u32;
    const LENGTH: usize = SIGNATURE_LENGTH as usize + Self::SIZE;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct GeneralPurposeFlag {
    pub(crate) encrypted: bool,
    pub(crate) data_descriptor: bool,
    pub(crate) utf8_required: bool,
    pub(crate) central_directory_encrypted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LocalFileHeader {
    pub(crate) version_needed: u16,
    pub(crate) flags: GeneralPurposeFlag,
    pub(crate) compression: Compression,
    pub(crate) last_mod: DosDateTime,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) file_name_length: u16,
    pub(crate) extra_field_length: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CentralDirectoryHeader {
    pub(crate) version_made_by: u16,
    pub(crate) version_needed: u16,
    pub(crate) flags: GeneralPurposeFlag,
    pub(crate) compression: Compression,
    pub(crate) last_mod: DosDateTime,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) file_name_length: u16,
    pub(crate) extra_field_length: u16,
    pub(crate) comment_length: u16,
    pub(crate) disk_start: u16,
    pub(crate) internal_attribute: u16,
    pub(crate) external_attribute: u32,
    pub(crate) file_header_offset: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct EndOfCentralDirectoryRecord {
    pub(crate) disk_number: u16,
    pub(crate) central_directory_start_disk: u16,
    pub(crate) number_of_entries_in_disk: u16,
    pub(crate) number_of_entries: u16,
    pub(crate) central_directory_size: u32,
    pub(crate) central_directory_offset: u32,
    pub(crate) comment_length: u16,
}

/// One central directory record with its variable-length fields resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ZipEntry {
    pub(crate) compression: Compression,
    pub(crate) last_mod_datetime: ZipDateTime,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) file_header_offset: u32,
    pub(crate) file_name: String,
    pub(crate) comment: Option<String>,
}

impl ZipSpecs for LocalFileHeader {
    const SIZE: usize = 26;
    const SIGNATURE: u32 = 0x04034b50;
}

impl ZipSpecs for CentralDirectoryHeader {
    const SIZE: usize = 42;
    const SIGNATURE: u32 = 0x02014b50;
}

impl ZipSpecs for EndOfCentralDirectoryRecord {
    const SIZE: usize = 18;
    const SIGNATURE: u32 = 0x06054b50;
}

impl EndOfCentralDirectoryRecord {
    /// Record plus the longest possible archive comment.
    pub(crate) const MAX_LENGTH: usize = Self::LENGTH + u16::MAX as usize;
}

impl From<u16> for GeneralPurposeFlag {
    fn from(value: u16) -> Self {
        let encrypted = matches!(value & 0x1, 1);
        let data_descriptor = matches!((value & 0x8) >> 3, 1);
        let utf8_required = matches!((value & 0x800) >> 11, 1);
        let central_directory_encrypted = matches!((value & 0x2000) >> 13, 1);

        Self {
            encrypted,
            data_descriptor,
            utf8_required,
            central_directory_encrypted,
        }
    }
}

impl From<GeneralPurposeFlag> for u16 {
    fn from(value: GeneralPurposeFlag) -> Self {
        (value.encrypted as u16)
            | (value.data_descriptor as u16) << 3
            | (value.utf8_required as u16) << 11
            | (value.central_directory_encrypted as u16) << 13
    }
}

impl LocalFileHeader {
    /// Header for an uncompressed entry.
    pub(crate) fn stored(last_mod: DosDateTime, crc32: u32, size: u32, name_length: u16) -> Self {
        Self {
            version_needed: VERSION,
            flags: GeneralPurposeFlag::default(),
            compression: Compression::Stored,
            last_mod,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            file_name_length: name_length,
            extra_field_length: 0,
        }
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&Self::SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version_needed.to_le_bytes());
        out.extend_from_slice(&u16::from(self.flags).to_le_bytes());
        out.extend_from_slice(&u16::from(self.compression).to_le_bytes());
        out.extend_from_slice(&self.last_mod.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.file_name_length.to_le_bytes());
        out.extend_from_slice(&self.extra_field_length.to_le_bytes());
    }
}

impl CentralDirectoryHeader {
    /// Central record mirroring a local header written at `offset`.
    pub(crate) fn for_local(local: &LocalFileHeader, offset: u32) -> Self {
        Self {
            version_made_by: VERSION,
            version_needed: local.version_needed,
            flags: local.flags,
            compression: local.compression,
            last_mod: local.last_mod,
            crc32: local.crc32,
            compressed_size: local.compressed_size,
            uncompressed_size: local.uncompressed_size,
            file_name_length: local.file_name_length,
            extra_field_length: 0,
            comment_length: 0,
            disk_start: 0,
            internal_attribute: 0,
            external_attribute: 0,
            file_header_offset: offset,
        }
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&Self::SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version_made_by.to_le_bytes());
        out.extend_from_slice(&self.version_needed.to_le_bytes());
        out.extend_from_slice(&u16::from(self.flags).to_le_bytes());
        out.extend_from_slice(&u16::from(self.compression).to_le_bytes());
        out.extend_from_slice(&self.last_mod.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.file_name_length.to_le_bytes());
        out.extend_from_slice(&self.extra_field_length.to_le_bytes());
        out.extend_from_slice(&self.comment_length.to_le_bytes());
        out.extend_from_slice(&self.disk_start.to_le_bytes());
        out.extend_from_slice(&self.internal_attribute.to_le_bytes());
        out.extend_from_slice(&self.external_attribute.to_le_bytes());
        out.extend_from_slice(&self.file_header_offset.to_le_bytes());
    }

    /// Bytes of name, extra field and comment following the fixed part.
    pub(crate) fn variable_length(&self) -> usize {
        self.file_name_length as usize
            + self.extra_field_length as usize
            + self.comment_length as usize
    }
}

impl EndOfCentralDirectoryRecord {
    pub(crate) fn new(entries: u16, size: u32, offset: u32) -> Self {
        Self {
            number_of_entries_in_disk: entries,
            number_of_entries: entries,
            central_directory_size: size,
            central_directory_offset: offset,
            ..Self::default()
        }
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&Self::SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.disk_number.to_le_bytes());
        out.extend_from_slice(&self.central_directory_start_disk.to_le_bytes());
        out.extend_from_slice(&self.number_of_entries_in_disk.to_le_bytes());
        out.extend_from_slice(&self.number_of_entries.to_le_bytes());
        out.extend_from_slice(&self.central_directory_size.to_le_bytes());
        out.extend_from_slice(&self.central_directory_offset.to_le_bytes());
        out.extend_from_slice(&self.comment_length.to_le_bytes());
    }

    /// Zip64 archives mark the classic fields with all-ones placeholders.
    pub(crate) fn is_zip64(&self) -> bool {
        self.number_of_entries == u16::MAX
            || self.central_directory_size == u32::MAX
            || self.central_directory_offset == u32::MAX
    }
}

impl TryFrom<[u8; 26]> for LocalFileHeader {
    type Error = ZipError;

    fn try_from(value: [u8; 26]) -> ZipResult<Self> {
        let version_needed = u16::from_le_bytes(value[0..2].try_into()?);
        let flags = GeneralPurposeFlag::from(u16::from_le_bytes(value[2..4].try_into()?));
        let compression = Compression::try_from(u16::from_le_bytes(value[4..6].try_into()?))?;
        let last_mod = DosDateTime::try_from(&value[6..10])?;
        let crc32 = u32::from_le_bytes(value[10..14].try_into()?);
        let compressed_size = u32::from_le_bytes(value[14..18].try_into()?);
        let uncompressed_size = u32::from_le_bytes(value[18..22].try_into()?);
        let file_name_length = u16::from_le_bytes(value[22..24].try_into()?);
        let extra_field_length = u16::from_le_bytes(value[24..26].try_into()?);

        Ok(Self {
            version_needed,
            flags,
            compression,
            last_mod,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
        })
    }
}

impl TryFrom<[u8; 42]> for CentralDirectoryHeader {
    type Error = ZipError;

    fn try_from(value: [u8; 42]) -> ZipResult<Self> {
        let version_made_by = u16::from_le_bytes(value[0..2].try_into()?);
        let version_needed = u16::from_le_bytes(value[2..4].try_into()?);
        let flags = GeneralPurposeFlag::from(u16::from_le_bytes(value[4..6].try_into()?));
        let compression = Compression::try_from(u16::from_le_bytes(value[6..8].try_into()?))?;
        let last_mod = DosDateTime::try_from(&value[8..12])?;
        let crc32 = u32::from_le_bytes(value[12..16].try_into()?);
        let compressed_size = u32::from_le_bytes(value[16..20].try_into()?);
        let uncompressed_size = u32::from_le_bytes(value[20..24].try_into()?);
        let file_name_length = u16::from_le_bytes(value[24..26].try_into()?);
        let extra_field_length = u16::from_le_bytes(value[26..28].try_into()?);
        let comment_length = u16::from_le_bytes(value[28..30].try_into()?);
        let disk_start = u16::from_le_bytes(value[30..32].try_into()?);
        let internal_attribute = u16::from_le_bytes(value[32..34].try_into()?);
        let external_attribute = u32::from_le_bytes(value[34..38].try_into()?);
        let file_header_offset = u32::from_le_bytes(value[38..42].try_into()?);

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            compression,
            last_mod,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            comment_length,
            disk_start,
            internal_attribute,
            external_attribute,
            file_header_offset,
        })
    }
}

impl TryFrom<[u8; 18]> for EndOfCentralDirectoryRecord {
    type Error = ZipError;

    fn try_from(value: [u8; 18]) -> ZipResult<Self> {
        let disk_number = u16::from_le_bytes(value[0..2].try_into()?);
        let central_directory_start_disk = u16::from_le_bytes(value[2..4].try_into()?);
        let number_of_entries_in_disk = u16::from_le_bytes(value[4..6].try_into()?);
        let number_of_entries = u16::from_le_bytes(value[6..8].try_into()?);
        let central_directory_size = u32::from_le_bytes(value[8..12].try_into()?);
        let central_directory_offset = u32::from_le_bytes(value[12..16].try_into()?);
        let comment_length = u16::from_le_bytes(value[16..18].try_into()?);

        Ok(Self {
            disk_number,
            central_directory_start_disk,
            number_of_entries_in_disk,
            number_of_entries,
            central_directory_size,
            central_directory_offset,
            comment_length,
        })
    }
}

impl ZipEntry {
    pub(crate) fn new(
        header: &CentralDirectoryHeader,
        file_name: String,
        comment: Option<String>,
    ) -> Self {
        Self {
            compression: header.compression,
            last_mod_datetime: header.last_mod.into(),
            crc32: header.crc32,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            file_header_offset: header.file_header_offset,
            file_name,
            comment,
        }
    }
}
