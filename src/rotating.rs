//! Size-capped log file.
//!
//! The active file keeps a stable name (`<directory>/<file_name>`). Once a
//! write would push it past `max_bytes` it is renamed to
//! `<file_name>.<timestamp>` and a fresh file is opened. Rotated files older
//! than `max_age` are removed after each rotation.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub struct SizeRotatingFile {
    directory: PathBuf,
    file_name: String,
    max_bytes: u64,
    max_age: Duration,
    file: File,
    written: u64,
}

impl SizeRotatingFile {
    pub fn new(
        directory: impl Into<PathBuf>,
        file_name: impl Into<String>,
        max_bytes: u64,
        max_age: Duration,
    ) -> io::Result<Self> {
        let directory = directory.into();
        let file_name = file_name.into();
        fs::create_dir_all(&directory)?;

        let file = open_append(&directory.join(&file_name))?;
        let written = file.metadata()?.len();
        Ok(Self {
            directory,
            file_name,
            max_bytes: max_bytes.max(1),
            max_age,
            file,
            written,
        })
    }

    /// Path of the file currently written to.
    pub fn active_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
        let mut target = self.directory.join(format!("{}.{}", self.file_name, stamp));
        let mut n = 1;
        while target.exists() {
            target = self.directory.join(format!("{}.{}.{}", self.file_name, stamp, n));
            n += 1;
        }

        let active = self.active_path();
        fs::rename(&active, &target)?;
        self.file = open_append(&active)?;
        self.written = 0;
        self.remove_expired();
        Ok(())
    }

    fn remove_expired(&self) {
        let prefix = format!("{}.", self.file_name);
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, directory = %self.directory.display(), "cannot list rotated log files");
                return;
            }
        };

        let now = SystemTime::now();
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > self.max_age);
            if expired {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::warn!(error = %e, path = %entry.path().display(), "cannot remove expired log file");
                }
            }
        }
    }
}

impl Write for SizeRotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A single record larger than the cap still lands in one file.
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
