//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use diecast_scan::config::Config;
use diecast_scan::error::DiecastError;
use diecast_scan::ocr::ImageSource;
use diecast_scan::scanner;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result.unwrap_err(), DiecastError::FolderNotFound(_)));
}

/// 画像のないフォルダは空のVec
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path()).unwrap();
    assert!(result.is_empty());
}

/// 存在しない画像は読み込み時にエラー
#[test]
fn test_image_source_missing_file() {
    let source = ImageSource::from_path(Path::new("/nonexistent/blister.jpg"));
    assert!(matches!(source.to_bytes(), Err(DiecastError::ImageLoad(_))));
}

/// 壊れたdata URI
#[test]
fn test_image_source_bad_data_uri() {
    let source = ImageSource::DataUri("not-a-data-uri".to_string());
    assert!(matches!(source.to_bytes(), Err(DiecastError::ImageLoad(_))));
}

/// 不正な抽出ルールは読み込み時にエラー
#[test]
fn test_invalid_rule_pattern() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rules.json");
    std::fs::write(&path, r#"{"series": [{"name": "broken", "pattern": "HW ("}]}"#).unwrap();

    let err = Config::default().load_rules(Some(&path), None).unwrap_err();
    assert!(matches!(err, DiecastError::Common(_)));
    assert!(err.to_string().contains("broken"));
}

/// 壊れたカタログJSON
#[test]
fn test_malformed_catalog() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(Config::default().load_catalog(Some(&path)).is_err());
}

/// DiecastErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        DiecastError::Config("テスト設定エラー".to_string()),
        DiecastError::FileNotFound("front.jpg".to_string()),
        DiecastError::FolderNotFound("/path/to/folder".to_string()),
        DiecastError::Ocr("tesseract not found".to_string()),
        DiecastError::Lookup("remote: HTTP 500".to_string()),
        DiecastError::InvalidIdentifier("ABC".to_string()),
        DiecastError::MissingField("brand"),
        DiecastError::Store("壊れたファイル".to_string()),
        DiecastError::NoImagesFound("フォルダ".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}
