//! Integration tests for validation failures and edge cases.

use pdfbind::config::DEFAULT_MAX_FILE_SIZE;
use pdfbind::error::ConvertError;
use pdfbind::job::FileSubmission;
use pdfbind::storage::FsStorage;
use pdfbind::validation::FileValidator;
use pdfbind::{Config, convert_files};
use std::sync::Arc;

use crate::common::{Workspace, png_bytes};

#[tokio::test]
async fn test_exact_size_limit_is_accepted() {
    let ws = Workspace::new();
    let validator = FileValidator::new(
        Arc::new(FsStorage::new(ws.output_dir())),
        DEFAULT_MAX_FILE_SIZE,
        10,
    );

    let at_limit = ws.upload_sized("big.txt", DEFAULT_MAX_FILE_SIZE);
    let summary = validator.validate_files(&[at_limit]).await.unwrap();

    assert_eq!(summary.files_validated, 1);
    assert_eq!(summary.total_size, DEFAULT_MAX_FILE_SIZE);
}

#[tokio::test]
async fn test_one_byte_over_limit_is_rejected() {
    let ws = Workspace::new();
    let submissions = vec![
        ws.upload("small.txt", "fine"),
        ws.upload_sized("huge.txt", DEFAULT_MAX_FILE_SIZE + 1),
    ];

    let err = convert_files(ws.config(), submissions).await.unwrap_err();

    match err {
        ConvertError::FileTooLarge {
            index,
            ref name,
            size,
            limit,
        } => {
            assert_eq!(index, 1);
            assert_eq!(name, "huge.txt");
            assert_eq!(size, DEFAULT_MAX_FILE_SIZE + 1);
            assert_eq!(limit, DEFAULT_MAX_FILE_SIZE);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_validation());
    assert!(ws.artifacts().is_empty());
}

#[tokio::test]
async fn test_unsupported_extension_creates_nothing() {
    let ws = Workspace::new();
    let submissions = vec![
        ws.upload("a.txt", "fine"),
        ws.upload("report.docx", "not supported"),
    ];

    let err = convert_files(ws.config(), submissions).await.unwrap_err();

    assert!(matches!(
        err,
        ConvertError::UnsupportedFileType { index: 1, ref name } if name == "report.docx"
    ));
    assert_eq!(err.file_index(), Some(1));
    assert!(ws.artifacts().is_empty());
}

#[tokio::test]
async fn test_missing_upload_is_unreadable() {
    let ws = Workspace::new();
    let submissions = vec![FileSubmission::new(
        ws.output_dir().join("does-not-exist"),
        "ghost.png",
    )];

    let err = convert_files(ws.config(), submissions).await.unwrap_err();

    assert!(matches!(err, ConvertError::FileUnreadable { index: 0, .. }));
    assert!(ws.artifacts().is_empty());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_unreadable_upload_fails_validation() {
    let ws = Workspace::new();
    let submissions = vec![
        ws.upload("a.txt", "fine"),
        FileSubmission::new("/proc/self/mem", "b.txt"),
    ];

    let err = convert_files(ws.config(), submissions).await.unwrap_err();

    assert!(matches!(err, ConvertError::FileUnreadable { index: 1, ref name, .. } if name == "b.txt"));
    assert!(err.is_validation());
    assert!(ws.artifacts().is_empty());
}

#[tokio::test]
async fn test_empty_submission_is_rejected() {
    let ws = Workspace::new();

    let err = convert_files(ws.config(), vec![]).await.unwrap_err();

    assert!(matches!(err, ConvertError::NoFiles));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_too_many_files() {
    let ws = Workspace::new();
    let submissions: Vec<FileSubmission> = (0..11)
        .map(|i| ws.upload(&format!("{i}.txt"), "x"))
        .collect();

    let err = convert_files(ws.config(), submissions).await.unwrap_err();

    assert!(matches!(err, ConvertError::TooManyFiles { count: 11, max: 10 }));
    assert!(ws.artifacts().is_empty());
}

#[tokio::test]
async fn test_corrupt_image_fails_and_leaves_nothing() {
    let ws = Workspace::new();
    let mut truncated = png_bytes(40, 40);
    truncated.truncate(truncated.len() / 2);
    let submissions = vec![ws.upload("a.txt", "ok"), ws.upload("b.png", truncated)];

    let err = convert_files(ws.config(), submissions).await.unwrap_err();

    assert!(matches!(err, ConvertError::MalformedContent { ref name, .. } if name == "b.png"));
    assert!(ws.artifacts().is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_reported() {
    let ws = Workspace::new();
    let config = Config {
        max_file_size: 0,
        ..ws.config()
    };

    let err = convert_files(config, vec![ws.upload("a.txt", "x")])
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::InvalidConfig { .. }));
}
