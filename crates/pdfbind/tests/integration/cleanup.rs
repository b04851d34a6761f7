//! Partial output must not survive a failed job.

use pdfbind::error::ConvertError;
use pdfbind::job::{ConversionJob, FileSubmission, JobStatus};
use pdfbind::storage::MemoryStorage;
use pdfbind::{Config, Converter};
use std::sync::Arc;

use crate::common::png_bytes;

fn converter(storage: &MemoryStorage) -> Converter {
    Converter::new(Config::with_output_dir("/out"), Arc::new(storage.clone())).unwrap()
}

fn stage(storage: &MemoryStorage) -> Vec<FileSubmission> {
    storage.insert("/uploads/1", "first page of text");
    storage.insert("/uploads/2", png_bytes(200, 100));
    vec![
        FileSubmission::new("/uploads/1", "a.txt"),
        FileSubmission::new("/uploads/2", "b.png"),
    ]
}

#[tokio::test]
async fn test_write_failure_midway_removes_artifact() {
    let storage = MemoryStorage::new("/out");
    let submissions = stage(&storage);
    storage.fail_writes_after(64);

    let mut job = ConversionJob::new(submissions);
    let err = converter(&storage).run(&mut job).await.unwrap_err();

    assert!(matches!(err, ConvertError::FailedToWrite { .. }));
    assert_eq!(job.status(), JobStatus::Failed);
    assert!(storage.artifacts().is_empty());
}

#[tokio::test]
async fn test_failed_cleanup_still_reports_original_error() {
    let storage = MemoryStorage::new("/out");
    let submissions = stage(&storage);
    storage.fail_writes_after(64);
    storage.fail_deletes();

    let mut job = ConversionJob::new(submissions);
    let err = converter(&storage).run(&mut job).await.unwrap_err();

    assert!(matches!(err, ConvertError::FailedToWrite { .. }));
    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(storage.artifacts().len(), 1);
}

#[tokio::test]
async fn test_input_lost_after_validation_removes_artifact() {
    let storage = MemoryStorage::new("/out");
    let submissions = stage(&storage);
    storage.deny_read("/uploads/2");

    let mut job = ConversionJob::new(submissions);
    let err = converter(&storage).run(&mut job).await.unwrap_err();

    assert!(matches!(err, ConvertError::FailedToReadInput { ref name, .. } if name == "b.png"));
    assert!(storage.artifacts().is_empty());
}

#[tokio::test]
async fn test_create_failure_leaves_nothing_to_clean() {
    let storage = MemoryStorage::new("/out");
    let submissions = stage(&storage);
    storage.fail_create();

    let err = converter(&storage).convert(submissions).await.unwrap_err();

    assert!(matches!(err, ConvertError::FailedToCreateOutput { .. }));
    assert!(storage.artifacts().is_empty());
}

#[tokio::test]
async fn test_successful_job_keeps_its_artifact() {
    let storage = MemoryStorage::new("/out");
    let submissions = stage(&storage);

    let document = converter(&storage).convert(submissions).await.unwrap();

    assert_eq!(storage.artifacts(), vec![document.path.clone()]);
    let bytes = storage.contents(&document.path).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.5"));
    assert_eq!(bytes.len() as u64, document.size_bytes);
}
