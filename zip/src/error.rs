use std::array::TryFromSliceError;
use std::fmt;
use std::io;

pub type ZipResult<T> = Result<T, ZipError>;

#[derive(Debug)]
pub enum ZipError {
    ChecksumMismatch { expected: u32, actual: u32 },
    CompressionNotSupported(u16),
    FeatureNotSupported(Box<str>),
    InvalidArchive(Box<str>),
    IO(io::Error),
    SignatureNotFound(Box<str>),
    SliceArray(TryFromSliceError),
}

impl fmt::Display for ZipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "crc32 mismatch: header says {expected:#010x}, content is {actual:#010x}"
            ),
            Self::CompressionNotSupported(method) => {
                write!(f, "compression method {method} is not supported")
            }
            Self::FeatureNotSupported(feature) => write!(f, "feature not supported: {feature}"),
            Self::InvalidArchive(reason) => write!(f, "invalid archive: {reason}"),
            Self::IO(err) => write!(f, "io error: {err}"),
            Self::SignatureNotFound(reason) => write!(f, "{reason}"),
            Self::SliceArray(err) => write!(f, "truncated record: {err}"),
        }
    }
}

impl std::error::Error for ZipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IO(err) => Some(err),
            Self::SliceArray(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ZipError {
    fn from(value: io::Error) -> Self {
        Self::IO(value)
    }
}

impl From<TryFromSliceError> for ZipError {
    fn from(value: TryFromSliceError) -> Self {
        Self::SliceArray(value)
    }
}
