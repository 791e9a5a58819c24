// Job Log Store Port
// Where per-invocation log files live

use std::io::{self, Write};
use std::path::Path;

/// Writer handed back for a freshly created log file
pub type LogWriter = Box<dyn Write + Send>;

pub trait LogStore: Send + Sync {
    /// Create `dir` and its parents; succeeds if it already exists
    fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Create the log file (append mode) and return a writer for it
    fn create(&self, path: &Path) -> io::Result<LogWriter>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::application::fanout::SharedBuffer;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory log store
    #[derive(Default)]
    pub struct MemoryLogStore {
        dirs: Mutex<Vec<PathBuf>>,
        files: Mutex<HashMap<PathBuf, SharedBuffer>>,
        fail_dirs: bool,
    }

    impl MemoryLogStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store whose `ensure_dir` always fails (e.g. read-only volume)
        pub fn new_read_only() -> Self {
            Self {
                fail_dirs: true,
                ..Self::default()
            }
        }

        pub fn created_dirs(&self) -> Vec<PathBuf> {
            self.dirs.lock().unwrap().clone()
        }

        pub fn file_paths(&self) -> Vec<PathBuf> {
            self.files.lock().unwrap().keys().cloned().collect()
        }

        /// Content of a log file, lossily decoded
        pub fn contents(&self, path: &Path) -> Option<String> {
            self.files.lock().unwrap().get(path).map(|b| b.contents())
        }
    }

    impl LogStore for MemoryLogStore {
        fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
            if self.fail_dirs {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "read-only file system",
                ));
            }
            let mut dirs = self.dirs.lock().unwrap();
            if !dirs.iter().any(|d| d == dir) {
                dirs.push(dir.to_path_buf());
            }
            Ok(())
        }

        fn create(&self, path: &Path) -> io::Result<LogWriter> {
            let buffer = self
                .files
                .lock()
                .unwrap()
                .entry(path.to_path_buf())
                .or_default()
                .clone();
            Ok(Box::new(buffer))
        }
    }
}
