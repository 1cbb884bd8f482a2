// TFRecord container reader and writer
//
// Each record is framed as:
//   u64 length (little endian)
//   u32 masked crc32c of the length bytes
//   [length] payload bytes
//   u32 masked crc32c of the payload

use std::{
    fs::File,
    io::{self, BufReader, ErrorKind, Read, Write},
    path::Path,
};

use flate2::read::{MultiGzDecoder, ZlibDecoder};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::EgoPlotError;

const LENGTH_SIZE: usize = 8;
const CRC_SIZE: usize = 4;
const MASK_DELTA: u32 = 0xa282_ead8;

/// Upper bound on a single record payload, guards against garbage length headers
pub const MAX_RECORD_LEN: u64 = 512 * 1024 * 1024;

/// Compression applied to the whole container file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zlib,
}

pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    (crc.rotate_right(15)).wrapping_add(MASK_DELTA)
}

/// Streams record payloads out of a TFRecord container in stored order.
///
/// The reader is consumed once. Iteration stops at a clean end of file; a
/// partial header or payload is reported as [`EgoPlotError::TruncatedRecord`].
pub struct RecordReader<R: Read> {
    inner: R,
    verify_checksums: bool,
    records_read: usize,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            verify_checksums: true,
            records_read: 0,
            finished: false,
        }
    }

    pub fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Number of records successfully returned so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Read the next payload, `Ok(None)` at end of file
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, EgoPlotError> {
        let record_no = self.records_read;

        let mut header = [0u8; LENGTH_SIZE + CRC_SIZE];
        let filled = read_fully(&mut self.inner, &mut header)
            .map_err(|e| EgoPlotError::RecordRead { record_no, source: e })?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < header.len() {
            return Err(EgoPlotError::TruncatedRecord {
                record_no,
                reason: format!("header has {} of {} bytes", filled, header.len()),
            });
        }

        let (length_bytes, length_crc_bytes) = header.split_at(LENGTH_SIZE);
        if self.verify_checksums {
            let expected = read_u32(length_crc_bytes);
            let actual = masked_crc32c(length_bytes);
            if expected != actual {
                return Err(EgoPlotError::ChecksumMismatch {
                    record_no,
                    part: "length",
                    expected,
                    actual,
                });
            }
        }

        let mut length_buf = [0u8; LENGTH_SIZE];
        length_buf.copy_from_slice(length_bytes);
        let length = u64::from_le_bytes(length_buf);
        if length > MAX_RECORD_LEN {
            return Err(EgoPlotError::RecordTooLarge {
                record_no,
                length,
                max: MAX_RECORD_LEN,
            });
        }

        // bounded by MAX_RECORD_LEN above
        let mut payload = vec![0u8; length as usize];
        let filled = read_fully(&mut self.inner, &mut payload)
            .map_err(|e| EgoPlotError::RecordRead { record_no, source: e })?;
        if filled < payload.len() {
            return Err(EgoPlotError::TruncatedRecord {
                record_no,
                reason: format!("payload has {} of {} bytes", filled, length),
            });
        }

        let mut payload_crc = [0u8; CRC_SIZE];
        let filled = read_fully(&mut self.inner, &mut payload_crc)
            .map_err(|e| EgoPlotError::RecordRead { record_no, source: e })?;
        if filled < CRC_SIZE {
            return Err(EgoPlotError::TruncatedRecord {
                record_no,
                reason: "missing payload checksum".to_string(),
            });
        }
        if self.verify_checksums {
            let expected = read_u32(&payload_crc);
            let actual = masked_crc32c(&payload);
            if expected != actual {
                return Err(EgoPlotError::ChecksumMismatch {
                    record_no,
                    part: "payload",
                    expected,
                    actual,
                });
            }
        }

        debug!("Read record {} with {} bytes", record_no, length);
        self.records_read += 1;
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>, EgoPlotError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Open a container file, wrapping it in the decoder for `compression`
pub fn open_records(
    path: &Path,
    compression: Compression,
    verify_checksums: bool,
) -> Result<RecordReader<Box<dyn Read>>, EgoPlotError> {
    if !path.exists() {
        return Err(EgoPlotError::MissingScenarioFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| EgoPlotError::ScenarioFileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    let buffered = BufReader::new(file);
    let inner: Box<dyn Read> = match compression {
        Compression::None => Box::new(buffered),
        Compression::Gzip => Box::new(MultiGzDecoder::new(buffered)),
        Compression::Zlib => Box::new(ZlibDecoder::new(buffered)),
    };
    debug!("Opened {:?} with {:?} compression", path, compression);
    Ok(RecordReader::new(inner).with_checksums(verify_checksums))
}

/// Frames payloads into a TFRecord container
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_record(&mut self, payload: &[u8]) -> Result<(), EgoPlotError> {
        let length = (payload.len() as u64).to_le_bytes();
        self.write_all(&length)?;
        self.write_all(&masked_crc32c(&length).to_le_bytes())?;
        self.write_all(payload)?;
        self.write_all(&masked_crc32c(payload).to_le_bytes())
    }

    pub fn into_inner(mut self) -> Result<W, EgoPlotError> {
        self.inner
            .flush()
            .map_err(|e| EgoPlotError::RecordWrite { source: e })?;
        Ok(self.inner)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), EgoPlotError> {
        self.inner
            .write_all(bytes)
            .map_err(|e| EgoPlotError::RecordWrite { source: e })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; CRC_SIZE];
    buf.copy_from_slice(&bytes[..CRC_SIZE]);
    u32::from_le_bytes(buf)
}

// Like read_exact, but reports how much was read before EOF
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
