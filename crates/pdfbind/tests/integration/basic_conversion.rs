//! End-to-end conversions through the file system.

use pdfbind::job::{ConversionJob, JobStatus};
use pdfbind::storage::FsStorage;
use pdfbind::{Converter, convert_files};
use std::sync::Arc;

use crate::common::{Workspace, image_matrix, jpeg_bytes, load_pdf, png_bytes};

#[tokio::test]
async fn test_text_and_image_make_two_pages() {
    let ws = Workspace::new();
    let submissions = vec![
        ws.upload("a.txt", "hello"),
        ws.upload("b.png", png_bytes(1200, 800)),
    ];

    let document = convert_files(ws.config(), submissions).await.unwrap();

    assert_eq!(document.page_count, 2);
    assert_eq!(document.file_name, format!("{}.pdf", document.id));
    assert_eq!(ws.artifacts(), vec![document.path.clone()]);

    let pdf = load_pdf(&document.path);
    let pages = pdf.get_pages();
    assert_eq!(pages.len(), 2);

    let text = pdf.get_page_content(pages[&1]).unwrap();
    assert!(String::from_utf8_lossy(&text).contains("(hello) Tj"));

    let matrix = image_matrix(&pdf, pages[&2]);
    assert!((matrix[0] - 500.0).abs() < 0.01);
    assert!((matrix[3] - 333.33).abs() < 0.01);
    assert!((matrix[4] - 56.0).abs() < 0.01);
    assert!((matrix[5] - 229.33).abs() < 0.01);
}

#[tokio::test]
async fn test_pages_follow_submission_order() {
    let ws = Workspace::new();
    let submissions = vec![
        ws.upload("photo.JPG", jpeg_bytes(300, 600)),
        ws.upload("notes.txt", "first words"),
        ws.upload("diagram.png", png_bytes(64, 64)),
    ];

    let document = convert_files(ws.config(), submissions).await.unwrap();

    let names: Vec<&str> = document
        .sections
        .iter()
        .map(|s| s.original_name.as_str())
        .collect();
    assert_eq!(names, vec!["photo.JPG", "notes.txt", "diagram.png"]);

    let pdf = load_pdf(&document.path);
    let pages = pdf.get_pages();
    let second = pdf.get_page_content(pages[&2]).unwrap();
    assert!(String::from_utf8_lossy(&second).contains("(first words) Tj"));

    // 300x600 is height bound: 350x700 centred horizontally.
    let matrix = image_matrix(&pdf, pages[&1]);
    assert!((matrix[0] - 350.0).abs() < 0.01);
    assert!((matrix[4] - 131.0).abs() < 0.01);
}

#[tokio::test]
async fn test_long_text_spills_onto_extra_pages() {
    let ws = Workspace::new();
    let text = (1..=40).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    let submissions = vec![ws.upload("long.txt", text), ws.upload("end.txt", "end")];

    let document = convert_files(ws.config(), submissions).await.unwrap();

    assert_eq!(document.page_count, 3);
    assert_eq!(document.sections[0].page_count, 2);
    assert_eq!(document.sections[1].first_page, 3);
    assert_eq!(load_pdf(&document.path).get_pages().len(), 3);
}

#[tokio::test]
async fn test_default_compression_still_parses() {
    let ws = Workspace::new();
    let config = pdfbind::Config::with_output_dir(ws.output_dir());
    let submissions = vec![ws.upload("a.txt", "compressed"), ws.upload("b.png", png_bytes(20, 10))];

    let document = convert_files(config, submissions).await.unwrap();

    let pdf = load_pdf(&document.path);
    let pages = pdf.get_pages();
    let text = pdf.get_page_content(pages[&1]).unwrap();
    assert!(String::from_utf8_lossy(&text).contains("(compressed) Tj"));
}

#[tokio::test]
async fn test_concurrent_jobs_are_isolated() {
    let ws = Workspace::new();
    let storage = FsStorage::new(ws.output_dir());
    storage.ensure_output_dir().await.unwrap();
    let converter = Converter::new(ws.config(), Arc::new(storage)).unwrap();

    let submissions = vec![
        ws.upload("a.txt", "same input"),
        ws.upload("b.png", png_bytes(100, 50)),
    ];

    let (first, second) = tokio::join!(
        converter.convert(submissions.clone()),
        converter.convert(submissions.clone())
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_ne!(first.id, second.id);
    assert_ne!(first.path, second.path);
    assert_eq!(first.page_count, second.page_count);
    assert_eq!(first.sections, second.sections);
    assert_eq!(ws.artifacts().len(), 2);

    let (a, b) = (load_pdf(&first.path), load_pdf(&second.path));
    let (pages_a, pages_b) = (a.get_pages(), b.get_pages());
    assert_eq!(
        a.get_page_content(pages_a[&1]).unwrap(),
        b.get_page_content(pages_b[&1]).unwrap()
    );
}

#[tokio::test]
async fn test_job_reaches_completed() {
    let ws = Workspace::new();
    let storage = FsStorage::new(ws.output_dir());
    storage.ensure_output_dir().await.unwrap();
    let converter = Converter::new(ws.config(), Arc::new(storage)).unwrap();

    let mut job = ConversionJob::new(vec![ws.upload("a.txt", "done")]);
    assert_eq!(job.status(), JobStatus::Pending);

    let document = converter.run(&mut job).await.unwrap();

    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(document.id, job.id());
    assert_eq!(job.files().len(), 1);
}

#[tokio::test]
async fn test_document_serializes_for_callers() {
    let ws = Workspace::new();
    let document = convert_files(ws.config(), vec![ws.upload("a.txt", "json")])
        .await
        .unwrap();

    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["id"], document.id.to_string());
    assert_eq!(value["pageCount"], 1);
    assert_eq!(value["sections"][0]["originalName"], "a.txt");
}
