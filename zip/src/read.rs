use {
    crate::{
        specs::{
            CentralDirectoryHeader, EndOfCentralDirectoryRecord, LocalFileHeader, ZipEntry,
            ZipSpecs,
        },
        ZipError, ZipFile, ZipResult,
    },
    fastsearch::FastSearch,
    smol::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, SeekFrom},
    tracing::{debug, trace},
};

fn utf8(bytes: Option<&[u8]>, what: &str) -> ZipResult<String> {
    let bytes =
        bytes.ok_or_else(|| ZipError::InvalidArchive(format!("truncated {what}").into()))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ZipError::InvalidArchive(format!("{what} is not valid UTF-8").into()))
}

pub(crate) trait ZipAsyncReadExt {
    async fn read_u32_le(&mut self) -> ZipResult<u32>
    where
        Self: AsyncRead + Unpin,
    {
        let mut buffer = [0; 4];
        self.read_exact(&mut buffer).await?;
        Ok(u32::from_le_bytes(buffer))
    }

    /// Finds the end record, skipping signature look-alikes that do not
    /// terminate the archive exactly.
    async fn read_zip_cd_end(
        &mut self,
    ) -> ZipResult<(EndOfCentralDirectoryRecord, Option<String>)>
    where
        Self: AsyncRead + AsyncSeek + Unpin,
    {
        let length = self.seek(SeekFrom::End(0)).await?;
        if length < EndOfCentralDirectoryRecord::LENGTH as u64 {
            return Err(ZipError::SignatureNotFound(
                "Archive is shorter than a Central Directory End Record".into(),
            ));
        }
        let position = length.saturating_sub(EndOfCentralDirectoryRecord::MAX_LENGTH as u64);
        let mut buffer = Vec::with_capacity((length - position) as usize);

        self.seek(SeekFrom::Start(position)).await?;
        self.read_to_end(&mut buffer).await?;

        let signature = EndOfCentralDirectoryRecord::SIGNATURE.to_le_bytes();
        let mut end = buffer.len();
        while let Some(idx) = (&buffer[..end]).rsearch(&signature) {
            let fixed_start = idx + signature.len();
            let fixed_end = fixed_start + EndOfCentralDirectoryRecord::SIZE;
            if let Some(fixed) = buffer.get(fixed_start..fixed_end) {
                let record = EndOfCentralDirectoryRecord::try_from(
                    TryInto::<[u8; 18]>::try_into(fixed)?,
                )?;
                if fixed_end + record.comment_length as usize == buffer.len() {
                    let comment = if record.comment_length > 0 {
                        Some(utf8(buffer.get(fixed_end..), "archive comment")?)
                    } else {
                        None
                    };
                    return Ok((record, comment));
                }
            }
            // Exclude this match and everything after it.
            end = idx + signature.len() - 1;
        }
        Err(ZipError::SignatureNotFound(
            "Central Directory End Record Signature not Found".into(),
        ))
    }

    async fn read_zip_entries(
        &mut self,
        eocdr: &EndOfCentralDirectoryRecord,
    ) -> ZipResult<Vec<ZipEntry>>
    where
        Self: AsyncRead + AsyncSeek + Unpin,
    {
        if eocdr.is_zip64() {
            return Err(ZipError::FeatureNotSupported("zip64 archives".into()));
        }
        if eocdr.disk_number != 0 || eocdr.central_directory_start_disk != 0 {
            return Err(ZipError::FeatureNotSupported("multi-disk archives".into()));
        }

        let size = eocdr.central_directory_size as u64;
        let mut buffer = Vec::with_capacity(size as usize);
        self.seek(SeekFrom::Start(eocdr.central_directory_offset as u64))
            .await?;
        self.take(size).read_to_end(&mut buffer).await?;
        if buffer.len() as u64 != size {
            return Err(ZipError::InvalidArchive(
                "Central Directory extends past the end of the archive".into(),
            ));
        }

        let signature = CentralDirectoryHeader::SIGNATURE.to_le_bytes();
        let mut entries = Vec::with_capacity(eocdr.number_of_entries as usize);
        let mut cursor = 0;

        for _ in 0..eocdr.number_of_entries {
            if buffer.get(cursor..cursor + signature.len()) != Some(&signature[..]) {
                return Err(ZipError::SignatureNotFound(
                    "Central Directory Header Signature not found".into(),
                ));
            }
            let fixed_start = cursor + signature.len();
            let fixed_end = fixed_start + CentralDirectoryHeader::SIZE;
            let fixed = buffer.get(fixed_start..fixed_end).ok_or_else(|| {
                ZipError::InvalidArchive("truncated Central Directory Header".into())
            })?;
            let header =
                CentralDirectoryHeader::try_from(TryInto::<[u8; 42]>::try_into(fixed)?)?;

            let name_end = fixed_end + header.file_name_length as usize;
            let comment_start = name_end + header.extra_field_length as usize;
            let comment_end = comment_start + header.comment_length as usize;

            let file_name = utf8(buffer.get(fixed_end..name_end), "file name")?;
            let comment = if header.comment_length > 0 {
                Some(utf8(buffer.get(comment_start..comment_end), "file comment")?)
            } else {
                None
            };
            trace!(
                name = %file_name,
                offset = header.file_header_offset,
                "central directory entry"
            );

            entries.push(ZipEntry::new(&header, file_name, comment));
            cursor = fixed_start + CentralDirectoryHeader::SIZE + header.variable_length();
        }
        debug!(records = entries.len(), "read central directory");
        Ok(entries)
    }

    async fn read_zipfile(&mut self, entry: &ZipEntry) -> ZipResult<ZipFile>
    where
        Self: AsyncRead + AsyncSeek + Unpin,
    {
        self.seek(SeekFrom::Start(entry.file_header_offset as u64))
            .await?;
        let signature = self.read_u32_le().await?;

        if signature != LocalFileHeader::SIGNATURE {
            Err(ZipError::SignatureNotFound(
                "Local File Header Signature not found".into(),
            ))?
        }
        let mut buffer = [0; LocalFileHeader::SIZE];
        self.read_exact(&mut buffer).await?;
        let header = LocalFileHeader::try_from(buffer)?;

        let skip = header.file_name_length as i64 + header.extra_field_length as i64;
        self.seek(SeekFrom::Current(skip)).await?;

        let mut data = Vec::with_capacity(entry.compressed_size as usize);
        self.take(entry.compressed_size as u64)
            .read_to_end(&mut data)
            .await?;
        if data.len() != entry.compressed_size as usize {
            return Err(ZipError::InvalidArchive(
                format!("{:?} is truncated", entry.file_name).into(),
            ));
        }

        Ok(ZipFile {
            compression: entry.compression,
            last_mod_datetime: entry.last_mod_datetime,
            crc32: entry.crc32,
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            file_name: entry.file_name.clone(),
            comment: entry.comment.clone(),
            data,
        })
    }
}

impl<R> ZipAsyncReadExt for R where R: AsyncRead + Unpin {}
