//! TFRecord framing.
//!
//! Each record is laid out as
//!
//! ```text
//! u64   length          (little endian)
//! u32   masked crc32c of the length bytes
//! [u8]  data
//! u32   masked crc32c of data
//! ```

use super::mask_crc;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Streaming reader over the records of one file
pub struct RecordReader<R> {
    inner: R,
    path: PathBuf,
    verify: bool,
}

impl RecordReader<BufReader<File>> {
    /// Open a TFRecord file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: Read> RecordReader<R> {
    /// Wrap a reader; `path` is only used in error messages.
    pub fn new(inner: R, path: impl Into<PathBuf>) -> Self {
        Self { inner, path: path.into(), verify: true }
    }

    /// Skip checksum verification of record payloads.
    pub fn without_verification(mut self) -> Self {
        self.verify = false;
        self
    }

    fn malformed(&self, message: impl Into<String>) -> Error {
        Error::TfRecord { path: self.path.clone(), message: message.into() }
    }

    /// Fill `buf`, returning how many bytes were read before EOF.
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::io(&self.path, e)),
            }
        }
        Ok(filled)
    }

    fn read_exact_or_truncated(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        let n = self.read_up_to(buf)?;
        if n < buf.len() {
            return Err(self.malformed(format!("truncated {what}: {n} of {} bytes", buf.len())));
        }
        Ok(())
    }

    fn check(&self, what: &str, bytes: &[u8], stored: u32) -> Result<()> {
        let computed = mask_crc(crc32c::crc32c(bytes));
        if stored != computed {
            return Err(Error::Checksum {
                context: format!("{what} in {}", self.path.display()),
                stored,
                computed,
            });
        }
        Ok(())
    }

    /// Next record payload, or `None` at a clean end of file.
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut header = [0u8; 12];
        match self.read_up_to(&mut header)? {
            0 => return Ok(None),
            12 => {}
            n => return Err(self.malformed(format!("truncated record header: {n} of 12 bytes"))),
        }

        let len_bytes: [u8; 8] = [
            header[0], header[1], header[2], header[3], header[4], header[5], header[6], header[7],
        ];
        let len_crc = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        if self.verify {
            self.check("record length", &len_bytes, len_crc)?;
        }

        let len = usize::try_from(u64::from_le_bytes(len_bytes))
            .map_err(|_| self.malformed("record length does not fit in memory"))?;
        let mut data = vec![0u8; len];
        self.read_exact_or_truncated(&mut data, "record data")?;

        let mut footer = [0u8; 4];
        self.read_exact_or_truncated(&mut footer, "record checksum")?;
        if self.verify {
            self.check("record data", &data, u32::from_le_bytes(footer))?;
        }

        Ok(Some(data))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Writes TFRecord framing; used to produce event files and test fixtures.
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl RecordWriter<BufWriter<File>> {
    /// Create (or truncate) a TFRecord file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Append one record.
    pub fn write_record(&mut self, data: &[u8]) -> std::io::Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&mask_crc(crc32c::crc32c(&len)).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&mask_crc(crc32c::crc32c(data)).to_le_bytes())
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn framed(records: &[&[u8]]) -> Vec<u8> {
        let mut writer = RecordWriter::new(Vec::new());
        for r in records {
            writer.write_record(r).expect("write should succeed");
        }
        writer.finish().expect("finish should succeed")
    }

    #[test]
    fn test_reads_records_in_order() {
        let bytes = framed(&[b"first", b"", b"third record"]);
        let records: Vec<Vec<u8>> = RecordReader::new(Cursor::new(bytes), "mem")
            .collect::<Result<_>>()
            .expect("read should succeed");
        assert_eq!(records, vec![b"first".to_vec(), Vec::new(), b"third record".to_vec()]);
    }

    #[test]
    fn test_empty_input_is_clean_eof() {
        let mut reader = RecordReader::new(Cursor::new(Vec::new()), "mem");
        assert!(reader.next_record().expect("read should succeed").is_none());
    }

    #[test]
    fn test_known_frame_layout() {
        let bytes = framed(&[b"abc"]);
        assert_eq!(bytes.len(), 8 + 4 + 3 + 4);
        assert_eq!(&bytes[..8], &3u64.to_le_bytes());
        assert_eq!(&bytes[12..15], b"abc");
    }

    #[test]
    fn test_truncated_data() {
        let mut bytes = framed(&[b"payload"]);
        bytes.truncate(bytes.len() - 6);
        let err = RecordReader::new(Cursor::new(bytes), "mem").next_record().unwrap_err();
        assert!(matches!(err, Error::TfRecord { .. }));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = framed(&[b"payload"])[..5].to_vec();
        let err = RecordReader::new(Cursor::new(bytes), "mem").next_record().unwrap_err();
        assert!(matches!(err, Error::TfRecord { .. }));
    }

    #[test]
    fn test_corrupt_payload_checksum() {
        let mut bytes = framed(&[b"payload"]);
        bytes[13] ^= 0xff;
        let err = RecordReader::new(Cursor::new(bytes.clone()), "mem").next_record().unwrap_err();
        assert!(matches!(err, Error::Checksum { .. }));

        let data = RecordReader::new(Cursor::new(bytes), "mem")
            .without_verification()
            .next_record()
            .expect("unverified read should succeed");
        assert!(data.is_some());
    }

    #[test]
    fn test_mask_crc_matches_reference_formula() {
        let c: u32 = 0x1234_5678;
        let expected = ((c >> 15) | (c << 17)).wrapping_add(0xa282_ead8);
        assert_eq!(mask_crc(c), expected);
    }
}
