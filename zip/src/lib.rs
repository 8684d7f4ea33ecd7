#![warn(dead_code)]

pub mod crc32;
pub mod datetime;
pub mod error;
pub mod read;
pub mod specs;
pub mod write;

pub use {
    datetime::{DosDateTime, ZipDateTime},
    specs::compression,
    write::{build_zip, try_build_zip, Entry, MIME_TYPE},
};
use {
    crc32::crc32,
    error::{ZipError, ZipResult},
    indexmap::IndexMap,
    read::ZipAsyncReadExt,
    smol::{
        io::{AsyncRead, AsyncSeek},
        stream::Stream,
    },
    specs::{compression::Compression, ZipEntry},
    std::{ops::Deref, pin::Pin},
    tracing::debug,
};

/// Stored-entry archive opened for reading.
///
/// Records keep archive order, duplicates included; name lookup resolves a
/// duplicated name to its last record.
pub struct ZipArchive<R> {
    comment: Option<String>,
    pub(crate) entries: Vec<ZipEntry>,
    pub(crate) names: IndexMap<String, usize>,
    pub(crate) reader: R,
}

#[derive(Debug)]
pub struct ZipFile {
    pub compression: Compression,
    pub last_mod_datetime: ZipDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: String,
    pub comment: Option<String>,
    pub(crate) data: Vec<u8>,
}

impl Deref for ZipFile {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data.as_slice()
    }
}

impl<R> ZipArchive<R>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    pub async fn new(mut reader: R) -> ZipResult<Self> {
        let (eocdr, comment) = reader.read_zip_cd_end().await?;
        let entries = reader.read_zip_entries(&eocdr).await?;
        let mut names = IndexMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            names.insert(entry.file_name.clone(), idx);
        }
        debug!(
            entries = entries.len(),
            names = names.len(),
            "opened zip archive"
        );

        Ok(Self {
            reader,
            entries,
            names,
            comment,
        })
    }

    pub async fn file_by_name<S>(&mut self, name: S) -> ZipResult<ZipFile>
    where
        S: AsRef<str>,
    {
        let entry = match self.names.get(name.as_ref()) {
            Some(idx) => &self.entries[*idx],
            None => Err(ZipError::InvalidArchive(
                format!("no entry named {:?}", name.as_ref()).into(),
            ))?,
        };
        self.reader.read_zipfile(entry).await
    }

    pub async fn file_by_index(&mut self, index: usize) -> ZipResult<ZipFile> {
        let entry = match self.entries.get(index) {
            Some(value) => value,
            None => Err(ZipError::InvalidArchive(
                format!("no entry at index {index}").into(),
            ))?,
        };
        self.reader.read_zipfile(entry).await
    }

    pub fn file_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.file_name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn comment(&self) -> &Option<String> {
        &self.comment
    }

    pub fn stream(&mut self) -> Pin<Box<dyn Stream<Item = ZipResult<ZipFile>> + '_>> {
        Box::pin(async_fn_stream::try_fn_stream(|emitter| async move {
            for entry in &self.entries {
                let file = self.reader.read_zipfile(entry).await?;
                let _ = emitter.emit(file).await;
            }
            Ok(())
        }))
    }
}

impl ZipFile {
    /// Stored content, checked against the recorded CRC-32.
    pub fn extract(self) -> ZipResult<Vec<u8>> {
        match self.compression {
            Compression::Stored => {
                let actual = crc32(&self.data);
                if actual != self.crc32 {
                    return Err(ZipError::ChecksumMismatch {
                        expected: self.crc32,
                        actual,
                    });
                }
                Ok(self.data)
            }
        }
    }

    pub fn is_dir(&self) -> bool {
        self.file_name.ends_with('/')
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }
}
