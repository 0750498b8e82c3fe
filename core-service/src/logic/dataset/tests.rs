use super::export::write_snapshot;
use super::record::LabeledRecord;
use super::writer::DatasetWriter;
use crate::logic::features::FeatureVector;
use crate::logic::model::RiskLevel;
use std::fs;
use tempfile::tempdir;

fn record(session: &str, outcome: RiskLevel) -> LabeledRecord {
    let features = FeatureVector::from_entries([("Age", 28.0), ("PHQ9 Score", 14.0)]);
    LabeledRecord::new(session, &features, outcome)
}

#[test]
fn test_dataset_append_and_read() {
    let dir = tempdir().unwrap();
    let writer = DatasetWriter::from_path(dir.path());

    writer.append(&record("s-1", RiskLevel::High)).unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap()).collect();
    assert_eq!(entries.len(), 1);
    let path = entries[0].path();
    assert!(path.extension().unwrap() == "jsonl");

    let content = fs::read_to_string(&path).unwrap();
    let deserialized: LabeledRecord = serde_json::from_str(content.trim()).unwrap();

    assert_eq!(deserialized.session_id, "s-1");
    assert_eq!(deserialized.outcome, RiskLevel::High);
    assert_eq!(deserialized.features["PHQ9 Score"], serde_json::json!(14.0));
}

#[test]
fn test_small_appends_share_a_file() {
    let dir = tempdir().unwrap();
    let writer = DatasetWriter::from_path(dir.path());

    writer.append(&record("a", RiskLevel::Low)).unwrap();
    writer.append(&record("b", RiskLevel::Medium)).unwrap();

    let stats = writer.get_stats().unwrap();
    assert_eq!(stats.total_files, 1);
    assert!(stats.current_file.unwrap().starts_with("labeled-"));

    let path = fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
    assert_eq!(fs::read_to_string(path).unwrap().lines().count(), 2);
}

#[test]
fn test_reopened_writer_continues_latest_file() {
    let dir = tempdir().unwrap();
    DatasetWriter::from_path(dir.path()).append(&record("a", RiskLevel::Low)).unwrap();
    DatasetWriter::from_path(dir.path()).append(&record("b", RiskLevel::Low)).unwrap();

    assert_eq!(DatasetWriter::from_path(dir.path()).get_stats().unwrap().total_files, 1);
}

#[test]
fn test_snapshot_deduplicates_sessions() {
    let dir = tempdir().unwrap();
    let records = vec![
        record("a", RiskLevel::Low),
        record("b", RiskLevel::High),
        record("a", RiskLevel::High),
    ];

    let (path, written) = write_snapshot(&dir.path().join("exports"), &records).unwrap();
    assert_eq!(written, 2);

    let lines: Vec<LabeledRecord> = fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].outcome, RiskLevel::Low);
}
