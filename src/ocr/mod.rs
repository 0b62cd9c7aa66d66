//! OCRエンジン境界
//!
//! 画像（バイト列またはdata URI）と言語ヒントを受け取り、抽出テキストを返す。
//! エンジン本体はブラックボックスとして扱う。

pub mod cache;
mod tesseract;

pub use cache::CachedOcrEngine;
pub use tesseract::TesseractCli;

use crate::error::{DiecastError, Result};
use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image: &ImageSource, language: &str) -> Result<String>;
}

/// OCR入力画像
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 生のバイト列（名前はログ・キャッシュ表示用）
    Bytes { name: String, data: Vec<u8> },
    /// 画像ファイル（読み込みはOCR時、失敗はその画像だけの失敗になる）
    File { name: String, path: PathBuf },
    /// エンコード済みのdata URI（`data:image/jpeg;base64,...`）
    DataUri(String),
}

impl ImageSource {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        ImageSource::Bytes {
            name: name.into(),
            data,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        ImageSource::File {
            name,
            path: path.to_path_buf(),
        }
    }

    /// 表示用の名前
    pub fn label(&self) -> &str {
        match self {
            ImageSource::Bytes { name, .. } | ImageSource::File { name, .. } => name,
            ImageSource::DataUri(_) => "data-uri",
        }
    }

    /// 画像バイト列を取得（data URIはデコード）
    pub fn to_bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            ImageSource::Bytes { data, .. } => Ok(Cow::Borrowed(data)),
            ImageSource::File { path, .. } => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| DiecastError::ImageLoad(format!("{}: {}", path.display(), e))),
            ImageSource::DataUri(uri) => decode_data_uri(uri).map(Cow::Owned),
        }
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    lazy_static::lazy_static! {
        static ref DATA_URI_RE: Regex = Regex::new(r"(?s)^data:[^,]*?;base64,(.*)$").unwrap();
    }

    let payload = DATA_URI_RE
        .captures(uri.trim())
        .and_then(|cap| cap.get(1))
        .ok_or_else(|| DiecastError::ImageLoad("base64のdata URIではありません".into()))?;

    let compact: String = payload.as_str().chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| DiecastError::ImageLoad(format!("data URIのデコードに失敗: {}", e)))
}
