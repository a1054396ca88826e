//! URL source and report sink.

use std::path::PathBuf;

use futures::StreamExt as _;
use topcolors::error::Error;
use topcolors::io::{OutputFormat, ReportWriter, format_report, read_urls};
use topcolors::model::{Color, ColorReport, ColorTriple};
use uuid::Uuid;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("topcolors-{}-{name}", Uuid::new_v4()))
}

fn sample_report() -> ColorReport {
    ColorReport::new(
        "http://a/img1.jpg",
        ColorTriple::from_ranked([
            Color::new(255, 255, 255).to_hex(),
            Color::new(0, 0, 0).to_hex(),
            Color::new(255, 0, 0).to_hex(),
        ]),
    )
}

#[tokio::test]
async fn reads_trimmed_non_blank_lines() {
    let path = temp_path("urls.txt");
    tokio::fs::write(&path, "http://a/1.jpg\r\n\n  http://a/2.jpg  \nhttp://a/1.jpg\nhttp://a/3.jpg")
        .await
        .unwrap();

    let urls: Vec<String> = read_urls(&path).await.unwrap().collect().await;
    assert_eq!(
        urls,
        vec![
            "http://a/1.jpg",
            "http://a/2.jpg",
            "http://a/1.jpg",
            "http://a/3.jpg"
        ]
    );

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn trailing_newline_adds_no_empty_url() {
    let path = temp_path("urls.txt");
    tokio::fs::write(&path, "http://a/1.jpg\n").await.unwrap();

    let urls: Vec<String> = read_urls(&path).await.unwrap().collect().await;
    assert_eq!(urls, vec!["http://a/1.jpg"]);

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn missing_input_is_a_startup_error() {
    let result = read_urls(&temp_path("does-not-exist.txt")).await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn csv_line_format() {
    let line = format_report(&sample_report(), OutputFormat::Csv).unwrap();
    assert_eq!(line, "http://a/img1.jpg,#FFFFFF,#000000,#FF0000\n");
}

#[test]
fn jsonl_line_format() {
    let line = format_report(&sample_report(), OutputFormat::Jsonl).unwrap();
    assert!(line.ends_with('\n'));
    let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(value["url"], "http://a/img1.jpg");
    assert_eq!(value["colors"]["primary"], "#FFFFFF");
    assert_eq!(value["colors"]["tertiary"], "#FF0000");
}

#[test]
fn output_format_parses() {
    assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
    assert_eq!("JSONL".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
    assert!("xml".parse::<OutputFormat>().is_err());
}

#[tokio::test]
async fn writer_emits_one_line_per_report() {
    let path = temp_path("out.txt");
    let mut writer = ReportWriter::create(&path, OutputFormat::Csv).await.unwrap();
    writer.write(&sample_report()).await.unwrap();
    writer
        .write(&ColorReport::new("http://a/bad.jpg", ColorTriple::error()))
        .await
        .unwrap();
    assert_eq!(writer.finish().await.unwrap(), 2);

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(
        content,
        "http://a/img1.jpg,#FFFFFF,#000000,#FF0000\nhttp://a/bad.jpg,#ERROR,#ERROR,#ERROR\n"
    );

    let _ = tokio::fs::remove_file(&path).await;
}
