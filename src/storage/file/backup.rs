//! Append-only backup log for the file backend.
//!
//! New links are handed to a single writer task over a bounded channel, so
//! callers never wait on disk I/O unless the buffer is full. Each line is one
//! JSON [`FileRecord`]; the `uuid` field counts written records from 1.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::FileRecord;
use crate::error::StorageResult;

/// Capacity of the channel between callers and the writer task.
pub const EVENT_BUFFER: usize = 100;

/// A link waiting to be written.
#[derive(Debug)]
struct BackupEvent {
    short_url: String,
    original_url: String,
}

/// Handle to the backup log and its writer task.
#[derive(Debug)]
pub struct BackupLog {
    path: PathBuf,
    events: Mutex<Option<mpsc::Sender<BackupEvent>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl BackupLog {
    /// Open the log, read back every record and start the writer.
    ///
    /// The file is created if it does not exist. Restored records are
    /// renumbered from 1 and written to a sibling temporary file that then
    /// replaces the log, so the log on disk is complete at every point of the
    /// restore. The writer continues numbering after the last restored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or replaced, or if any
    /// non-empty line is not a valid record. The log is left untouched in
    /// the latter case.
    pub async fn open(path: &Path) -> StorageResult<(Self, Vec<FileRecord>)> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let records = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<FileRecord>)
            .collect::<Result<Vec<_>, _>>()?;

        let records = rewrite(path, records).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let written = records.len() as u64;
        let writer = tokio::spawn(run_writer(file, rx, path.to_path_buf(), written));

        Ok((
            Self {
                path: path.to_path_buf(),
                events: Mutex::new(Some(tx)),
                writer: Mutex::new(Some(writer)),
            },
            records,
        ))
    }

    /// Queue a link for writing.
    ///
    /// Waits only if the writer has fallen [`EVENT_BUFFER`] records behind.
    /// After [`close`](Self::close) the link is dropped with a warning.
    pub async fn append(&self, short_url: String, original_url: String) {
        let Some(events) = self.events.lock().clone() else {
            warn!(path = %self.path.display(), short_url = %short_url, "Backup log closed, record not persisted");
            return;
        };

        let event = BackupEvent {
            short_url,
            original_url,
        };
        if let Err(e) = events.send(event).await {
            warn!(
                path = %self.path.display(),
                short_url = %e.0.short_url,
                "Backup writer stopped, record not persisted"
            );
        }
    }

    /// Stop accepting records and wait until the queued ones are on disk.
    pub async fn close(&self) {
        drop(self.events.lock().take());

        let writer = self.writer.lock().take();
        if let Some(writer) = writer
            && let Err(e) = writer.await
        {
            error!(path = %self.path.display(), error = %e, "Backup writer task failed");
        }
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Replace the log at `path` with `records` numbered from 1.
async fn rewrite(path: &Path, records: Vec<FileRecord>) -> StorageResult<Vec<FileRecord>> {
    let records: Vec<FileRecord> = records
        .into_iter()
        .zip(1_u64..)
        .map(|(record, uuid)| FileRecord {
            uuid: uuid.to_string(),
            ..record
        })
        .collect();

    let mut buf = Vec::new();
    for record in &records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }

    let tmp_path = temp_path(path);
    let mut tmp = File::create(&tmp_path).await?;
    tmp.write_all(&buf).await?;
    tmp.sync_all().await?;
    drop(tmp);

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(records)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("backup"));
    name.push(".tmp");
    path.with_file_name(name)
}

async fn run_writer(
    file: File,
    mut events: mpsc::Receiver<BackupEvent>,
    path: PathBuf,
    mut counter: u64,
) {
    let mut out = BufWriter::new(file);

    while let Some(event) = events.recv().await {
        counter += 1;
        let record = FileRecord {
            uuid: counter.to_string(),
            short_url: event.short_url,
            original_url: event.original_url,
        };

        if let Err(e) = write_record(&mut out, &record).await {
            error!(path = %path.display(), short_url = %record.short_url, error = %e, "Failed to write backup record");
        }
    }

    debug!(path = %path.display(), written = counter, "Backup writer finished");
}

async fn write_record(out: &mut BufWriter<File>, record: &FileRecord) -> StorageResult<()> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn read_records(path: &Path) -> Vec<FileRecord> {
        tokio::fs::read_to_string(path)
            .await
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("urls.json");

        let (log, records) = BackupLog::open(&path).await.unwrap();

        assert!(records.is_empty());
        assert!(path.exists());
        assert_eq!(log.path(), path.as_path());
        log.close().await;
    }

    #[tokio::test]
    async fn test_writes_counted_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");

        let (log, _) = BackupLog::open(&path).await.unwrap();
        log.append("abc".to_string(), "https://a.com".to_string())
            .await;
        log.append("def".to_string(), "https://b.com".to_string())
            .await;
        log.close().await;

        let records = read_records(&path).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uuid, "1");
        assert_eq!(records[0].short_url, "abc");
        assert_eq!(records[1].uuid, "2");
        assert_eq!(records[1].original_url, "https://b.com");
    }

    #[tokio::test]
    async fn test_open_renumbers_restored_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");
        tokio::fs::write(
            &path,
            "{\"uuid\":\"7\",\"short_url\":\"abc\",\"original_url\":\"https://a.com\"}\n\n",
        )
        .await
        .unwrap();

        let (log, records) = BackupLog::open(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uuid, "1");
        assert_eq!(records[0].short_url, "abc");

        log.append("def".to_string(), "https://b.com".to_string())
            .await;
        log.close().await;

        let on_disk = read_records(&path).await;
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk[0].uuid, "1");
        assert_eq!(on_disk[1].uuid, "2");
        assert_eq!(on_disk[1].short_url, "def");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_restored_records_survive_without_close() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");
        let lines: String = (0..5)
            .map(|i| {
                format!(
                    "{{\"uuid\":\"{i}\",\"short_url\":\"id{i}\",\"original_url\":\"https://{i}.com\"}}\n"
                )
            })
            .collect();
        std::fs::write(&path, lines).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (log, records) = runtime.block_on(BackupLog::open(&path)).unwrap();
        assert_eq!(records.len(), 5);

        // Tear down without closing the log.
        drop(log);
        drop(runtime);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 5);
    }

    #[tokio::test]
    async fn test_corrupt_line_fails_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");
        tokio::fs::write(&path, "not json\n").await.unwrap();

        assert!(BackupLog::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_append_after_close_is_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");

        let (log, _) = BackupLog::open(&path).await.unwrap();
        log.close().await;
        log.append("abc".to_string(), "https://a.com".to_string())
            .await;

        assert!(read_records(&path).await.is_empty());
    }
}
