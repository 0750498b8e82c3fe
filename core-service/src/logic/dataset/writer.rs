use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;

use super::record::LabeledRecord;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB
const FILE_PREFIX: &str = "labeled";

/// Append-only JSONL log of labeled records, rotated by size
pub struct DatasetWriter {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DatasetStats {
    pub total_files: usize,
    pub total_size_mb: f32,
    pub current_file: Option<String>,
}

impl DatasetWriter {
    pub fn from_path(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        if let Err(e) = fs::create_dir_all(&base_dir) {
            log::error!("Failed to create dataset directory {}: {}", base_dir.display(), e);
        }

        Self {
            file: Mutex::new(None),
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Append one record, opening or rotating the current file as needed
    pub fn append(&self, record: &LabeledRecord) -> io::Result<()> {
        let mut guard = self.file.lock();

        if guard.is_none() {
            *guard = Some(match self.find_latest_file()? {
                Some(path) => {
                    let f = OpenOptions::new().create(true).append(true).open(&path)?;
                    if f.metadata()?.len() < MAX_FILE_SIZE {
                        f
                    } else {
                        self.create_new_file()?
                    }
                }
                None => self.create_new_file()?,
            });
        }

        let full = match guard.as_ref() {
            Some(f) => f.metadata()?.len() >= MAX_FILE_SIZE,
            None => false,
        };
        if full {
            *guard = Some(self.create_new_file()?);
        }

        if let Some(file) = guard.as_mut() {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{}", json)?;
        }

        Ok(())
    }

    pub fn get_stats(&self) -> io::Result<DatasetStats> {
        let mut total_files = 0;
        let mut size = 0u64;
        let mut latest: Option<PathBuf> = None;

        for entry in fs::read_dir(&self.base_dir)?.flatten() {
            let path = entry.path();
            if !is_dataset_file(&path) {
                continue;
            }
            total_files += 1;
            if let Ok(meta) = entry.metadata() {
                size += meta.len();
            }
            if latest.as_ref().map_or(true, |l| path > *l) {
                latest = Some(path);
            }
        }

        Ok(DatasetStats {
            total_files,
            total_size_mb: size as f32 / 1024.0 / 1024.0,
            current_file: latest.and_then(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string)),
        })
    }

    fn create_new_file(&self) -> io::Result<File> {
        let now = Utc::now();
        let filename = format!("{}-{}.jsonl", FILE_PREFIX, now.format("%Y-%m-%d-%H%M%S%.3f"));
        let path = self.base_dir.join(filename);
        log::info!("Opening dataset file {}", path.display());
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn find_latest_file(&self) -> io::Result<Option<PathBuf>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.base_dir)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| is_dataset_file(p))
            .collect();

        // Timestamped names sort chronologically
        entries.sort();
        Ok(entries.pop())
    }
}

fn is_dataset_file(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == "jsonl")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with(FILE_PREFIX))
}
