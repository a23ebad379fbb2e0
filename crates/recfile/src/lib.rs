//! # recfile — fixed-width record files
//!
//! A record file stores one record per line, every line exactly
//! [`LINE_BYTES`] bytes long:
//!
//! ```text
//! field0;field1;...;fieldN<spaces up to 500 bytes>\n
//! ```
//!
//! The fixed width is the core invariant of the whole store: record
//! `ordinal` always lives at byte offset `ordinal * LINE_BYTES`, so a
//! point read is a single seek regardless of field content. A payload
//! that would not fit is rejected up front ([`RecordError::TooLong`])
//! rather than truncated — a truncated line would still occupy its
//! slot but silently lose data.
//!
//! Files are never kept open between calls. Each operation opens the
//! file, does its seek/read/write, and closes the handle on every exit
//! path. This keeps ownership simple and means a [`RecordFile`] is just
//! a path.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str;

use thiserror::Error;

/// Payload width of every line, in bytes (excluding the newline).
pub const PAYLOAD_BYTES: usize = 500;

/// Full width of every line on disk: payload + `\n`.
pub const LINE_BYTES: usize = PAYLOAD_BYTES + 1;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("encoded payload is {len} bytes, limit is {PAYLOAD_BYTES}")]
    TooLong { len: usize },
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Byte offset of the record at `ordinal`.
pub fn offset(ordinal: u64) -> u64 {
    ordinal * LINE_BYTES as u64
}

/// Encodes one record as a full fixed-width line.
///
/// Fields are joined with `;` and right-padded with spaces to
/// [`PAYLOAD_BYTES`], then terminated with `\n`. Fails with
/// [`RecordError::TooLong`] if the joined payload does not fit.
pub fn encode_line(fields: &[String]) -> Result<Vec<u8>, RecordError> {
    let payload = fields.join(";");
    if payload.len() > PAYLOAD_BYTES {
        return Err(RecordError::TooLong { len: payload.len() });
    }
    let mut line = Vec::with_capacity(LINE_BYTES);
    line.extend_from_slice(payload.as_bytes());
    line.resize(PAYLOAD_BYTES, b' ');
    line.push(b'\n');
    Ok(line)
}

fn decode_payload(buf: &[u8], ordinal: u64) -> Result<Vec<String>, RecordError> {
    let payload = str::from_utf8(&buf[..PAYLOAD_BYTES])
        .map_err(|_| RecordError::Corrupt(format!("non-utf8 payload at ordinal {ordinal}")))?;
    let payload = payload.trim_end_matches(' ');
    Ok(payload.split(';').map(str::to_string).collect())
}

/// A fixed-width record file on disk.
///
/// All methods take `&self`; the file is opened fresh for every call.
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    /// Opens a record file, creating it empty if it does not exist.
    /// An existing file is never truncated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path })
    }

    /// Path to the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of physical lines in the file (including erased ones).
    pub fn len(&self) -> Result<u64, RecordError> {
        let meta = std::fs::metadata(&self.path)?;
        Ok(meta.len() / LINE_BYTES as u64)
    }

    /// Returns `true` if the file holds no lines at all.
    pub fn is_empty(&self) -> Result<bool, RecordError> {
        Ok(self.len()? == 0)
    }

    /// Appends one record at the end of the file, returning the ordinal
    /// it was written at.
    pub fn append(&self, fields: &[String]) -> Result<u64, RecordError> {
        let line = encode_line(fields)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let ordinal = file.metadata()?.len() / LINE_BYTES as u64;
        file.write_all(&line)?;
        file.flush()?;
        Ok(ordinal)
    }

    /// Reads the record at `ordinal` and splits it into fields.
    ///
    /// Fails with [`RecordError::Corrupt`] if the ordinal is past the
    /// end of the file or the line does not split into `arity` fields.
    pub fn read_at(&self, ordinal: u64, arity: usize) -> Result<Vec<String>, RecordError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset(ordinal)))?;
        let mut buf = [0u8; LINE_BYTES];
        file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                RecordError::Corrupt(format!("no record at ordinal {ordinal}"))
            } else {
                RecordError::Io(e)
            }
        })?;
        let fields = decode_payload(&buf, ordinal)?;
        if fields.len() != arity {
            return Err(RecordError::Corrupt(format!(
                "expected {arity} fields at ordinal {ordinal}, got {}",
                fields.len()
            )));
        }
        Ok(fields)
    }

    /// Overwrites the record at `ordinal` with a freshly encoded line.
    ///
    /// The write is always exactly [`LINE_BYTES`] bytes at the record's
    /// own offset; later records never move.
    pub fn overwrite_at(&self, ordinal: u64, fields: &[String]) -> Result<(), RecordError> {
        let line = encode_line(fields)?;
        self.write_line_at(ordinal, &line)
    }

    /// Blanks out the record at `ordinal` in place (tombstone).
    ///
    /// The line keeps its slot so every later ordinal stays valid;
    /// [`scan`](RecordFile::scan) skips blank lines.
    pub fn erase_at(&self, ordinal: u64) -> Result<(), RecordError> {
        let mut line = vec![b' '; PAYLOAD_BYTES];
        line.push(b'\n');
        self.write_line_at(ordinal, &line)
    }

    fn write_line_at(&self, ordinal: u64, line: &[u8]) -> Result<(), RecordError> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let count = file.metadata()?.len() / LINE_BYTES as u64;
        if ordinal >= count {
            return Err(RecordError::Corrupt(format!(
                "overwrite at ordinal {ordinal} past end of file ({count} records)"
            )));
        }
        file.seek(SeekFrom::Start(offset(ordinal)))?;
        file.write_all(line)?;
        file.flush()?;
        Ok(())
    }

    /// Returns an iterator over `(ordinal, fields)` for every non-blank
    /// line, in append order.
    ///
    /// The file is re-opened for every scan, so scans are restartable
    /// and see whatever is on disk at call time. Erased lines are
    /// skipped but still consume their ordinal.
    pub fn scan(&self) -> Result<RecordScan, RecordError> {
        let file = File::open(&self.path)?;
        Ok(RecordScan {
            reader: BufReader::new(file),
            ordinal: 0,
        })
    }
}

/// Iterator over the non-blank records of a [`RecordFile`].
pub struct RecordScan {
    reader: BufReader<File>,
    ordinal: u64,
}

impl Iterator for RecordScan {
    type Item = Result<(u64, Vec<String>), RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = [0u8; LINE_BYTES];
            match self.reader.read_exact(&mut buf) {
                Ok(()) => {}
                // A partial trailing line is treated as end-of-file.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return None,
                Err(e) => return Some(Err(RecordError::Io(e))),
            }
            let ordinal = self.ordinal;
            self.ordinal += 1;

            let fields = match decode_payload(&buf, ordinal) {
                Ok(f) => f,
                Err(e) => return Some(Err(e)),
            };
            // A fully blank payload decodes to one empty field: the
            // line is empty or tombstoned. Skip it.
            if fields.len() == 1 && fields[0].is_empty() {
                continue;
            }
            return Some(Ok((ordinal, fields)));
        }
    }
}
