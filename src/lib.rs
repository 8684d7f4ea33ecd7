//! Export archives for the reporting dashboard.
//!
//! The ZIP support lives in [`libradar_zip`] and is enabled by the default
//! `zip` feature; [`fastsearch`] is re-exported for callers scanning
//! archive bytes themselves.

pub use fastsearch;
#[cfg(feature = "zip")]
pub use libradar_zip as zip;

/// Stores `files` in one archive stamped with `generated_at`, together
/// with the content type to send it under.
#[cfg(feature = "zip")]
pub fn bundle<T>(files: &[zip::Entry], generated_at: T) -> (Vec<u8>, &'static str)
where
    T: Into<zip::ZipDateTime>,
{
    (zip::build_zip(files, generated_at), zip::MIME_TYPE)
}
