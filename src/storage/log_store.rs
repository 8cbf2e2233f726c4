//! JSON-lines log store
//!
//! Each entry is one JSON object on its own line. Appends are flushed and
//! synced before returning, so every line that made it to disk is a complete
//! unit and a killed process never leaves the dedup state half written.
//! A torn final line left by a crash is sealed with a newline on the next
//! open, so it replays as one malformed line and never swallows new entries.

use crate::storage::{EntrySink, LogEntry, StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append-only JSON-lines file
#[derive(Debug)]
pub struct JsonLinesLog {
    path: PathBuf,
    file: File,
}

impl JsonLinesLog {
    /// Opens the log for appending, creating it (and its directory) if absent
    ///
    /// Existing content is never truncated. If the file does not end with a
    /// newline, one is appended before anything else is written.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| StorageError::Open {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;

        if ends_with_torn_line(&path).map_err(open_err)? {
            tracing::warn!("Sealing incomplete last line in {}", path.display());
            file.write_all(b"\n").map_err(open_err)?;
            file.sync_data().map_err(open_err)?;
        }

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the existing entries back, lazily and in insertion order
    pub fn replay(&self) -> StorageResult<ReplayIter> {
        ReplayIter::open(&self.path)
    }
}

/// True if the file is non-empty and its last byte is not a newline
fn ends_with_torn_line(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl EntrySink for JsonLinesLog {
    fn append(&mut self, entry: &LogEntry) -> StorageResult<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let append_err = |source| StorageError::Append {
            path: self.path.clone(),
            source,
        };

        self.file.write_all(&line).map_err(append_err)?;
        self.file.flush().map_err(append_err)?;
        self.file.sync_data().map_err(append_err)?;
        Ok(())
    }
}

/// Lazy iterator over the entries of a JSON-lines log
///
/// Lines that are not valid entries are skipped and counted, including lines
/// that are not UTF-8. Only I/O failures are yielded as errors.
#[derive(Debug)]
pub struct ReplayIter {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    buf: Vec<u8>,
    line_number: usize,
    skipped: usize,
}

impl ReplayIter {
    /// Opens a replay over the file at `path`; a missing file replays nothing
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let reader = match File::open(&path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        Ok(Self {
            path,
            reader,
            buf: Vec::new(),
            line_number: 0,
            skipped: 0,
        })
    }

    /// Number of malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for ReplayIter {
    type Item = StorageResult<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.as_mut()?.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(_) => {}
                Err(source) => {
                    // The sequence ends after the first read failure
                    self.reader = None;
                    return Some(Err(StorageError::Read {
                        path: self.path.clone(),
                        source,
                    }));
                }
            }
            self.line_number += 1;

            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_slice::<LogEntry>(line) {
                Ok(entry) => return Some(Ok(entry)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(
                        "Skipping malformed line {} in {}: {}",
                        self.line_number,
                        self.path.display(),
                        e
                    );
                }
            }
        }
    }
}
