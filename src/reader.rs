use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};

use crate::error::ReadFailure;

/// Bounded read of one file: at most `max_bytes` bytes, decoded leniently.
#[derive(Debug, Clone, Copy)]
pub struct FileReader {
    pub max_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappedRead {
    pub content: String,
    /// On-disk size exceeds `max_bytes`, taken from the handle's metadata.
    pub truncated: bool,
}

impl FileReader {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// The handle is dropped before returning on every path.
    pub fn read_capped(&self, path: &Path) -> Result<CappedRead, ReadFailure> {
        // opening a FIFO blocks until a writer shows up, so check before open
        if !fs::metadata(path)?.is_file() {
            return Err(ReadFailure::NotAFile);
        }
        let file = File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(ReadFailure::NotAFile);
        }

        let expected = meta.len().min(self.max_bytes);
        let mut buf = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
        file.take(self.max_bytes).read_to_end(&mut buf)?;

        Ok(CappedRead {
            content: decode_lossy(&buf),
            truncated: meta.len() > self.max_bytes,
        })
    }
}

/// UTF-8 unless a BOM says otherwise; malformed sequences become U+FFFD.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let (encoding, bom_len): (&'static Encoding, usize) =
        Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));
    let (text, _had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    text.into_owned()
}
