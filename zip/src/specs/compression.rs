use crate::error::ZipError;

/// Archives written here only ever use method 0.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum Compression {
    #[default]
    Stored,
}

impl TryFrom<u16> for Compression {
    type Error = ZipError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stored),
            other => Err(ZipError::CompressionNotSupported(other)),
        }
    }
}

impl From<Compression> for u16 {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Stored => 0,
        }
    }
}
