// Filesystem log store
use std::fs::{self, OpenOptions};
use std::io::{self, LineWriter};
use std::path::Path;

use dailyrun_core::port::log_store::{LogStore, LogWriter};

/// Log files on the local filesystem, line buffered so `tail -f` follows along
pub struct FsLogStore;

impl LogStore for FsLogStore {
    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn create(&self, path: &Path) -> io::Result<LogWriter> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(LineWriter::new(file)))
    }
}
