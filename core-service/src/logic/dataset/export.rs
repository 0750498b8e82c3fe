use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::record::LabeledRecord;

/// Write a one-shot JSONL snapshot of labeled records into `dir`.
///
/// Records are de-duplicated by session id, first occurrence wins.
/// Returns the snapshot path and the number of records written.
pub fn write_snapshot(dir: &Path, records: &[LabeledRecord]) -> io::Result<(PathBuf, usize)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("training-export-{}.jsonl", Utc::now().format("%Y%m%d-%H%M%S%.3f")));

    let mut out = BufWriter::new(File::create(&path)?);
    let mut seen = HashSet::new();
    let mut written = 0;

    for record in records {
        if !seen.insert(record.session_id.as_str()) {
            log::warn!("Skipping duplicate labeled record for session {}", record.session_id);
            continue;
        }
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
        written += 1;
    }

    out.flush()?;
    log::info!("Exported {} labeled records to {}", written, path.display());
    Ok((path, written))
}
