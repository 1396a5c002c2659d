//! Lesson Source Integration Tests
//!
//! Tests for loading lesson files from disk.

use classcast::domain::ResourceParent;
use classcast::library::{FileLessonSource, LessonError, LessonSource};
use tempfile::TempDir;

const LESSON_YAML: &str = r#"
id: fractions
title: Fractions
activities:
  - id: practice
    title: Practice
    order_index: 2
  - id: warm-up
    title: Warm-up
    student_content: "<p>Look at the pizza</p>"
    show_to_students: true
    duration: 10 min
    order_index: 1
resources:
  - id: sheet
    title: Worksheet
    file_url: https://example.com/sheet.pdf
    visible_to_students: true
    order_index: 1
    parent:
      activity: practice
  - id: homework
    title: Homework
    file_url: https://example.com/hw.pdf
    parent:
      homework: hw-1
"#;

#[tokio::test]
async fn test_load_yaml_lesson() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fractions.yaml");
    tokio::fs::write(&path, LESSON_YAML).await.unwrap();

    let source = FileLessonSource::new(&path);
    assert!(source.name().ends_with("fractions.yaml"));

    let lesson = source.fetch().await.unwrap();
    assert_eq!(lesson.title, "Fractions");
    assert_eq!(lesson.activities[0].id, "warm-up");
    assert_eq!(lesson.activities[0].duration.as_deref(), Some("10 min"));
    assert_eq!(
        lesson.resources[0].parent,
        ResourceParent::Homework("hw-1".to_string())
    );
    assert_eq!(lesson.resources[1].id, "sheet");
}

#[tokio::test]
async fn test_load_json_lesson() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lesson.json");
    let json = r#"{
        "id": "l",
        "title": "JSON lesson",
        "activities": [{"id": "a", "title": "Only"}],
        "resources": [{
            "id": "r",
            "title": "Clip",
            "file_url": "https://example.com/clip.mp4",
            "visible_to_students": true,
            "parent": {"activity": "a"}
        }]
    }"#;
    tokio::fs::write(&path, json).await.unwrap();

    let lesson = FileLessonSource::new(&path).fetch().await.unwrap();
    assert_eq!(lesson.activity_count(), 1);
    assert!(lesson.resources[0].belongs_to_activity("a"));
}

#[tokio::test]
async fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let source = FileLessonSource::new(dir.path().join("nope.yaml"));

    match source.fetch().await {
        Err(LessonError::NotFound(path)) => assert!(path.ends_with("nope.yaml")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    tokio::fs::write(&path, "activities: [oops").await.unwrap();

    let err = FileLessonSource::new(&path).fetch().await.unwrap_err();
    assert!(matches!(err, LessonError::Yaml(_)));
}
