//! OCR結果キャッシュモジュール
//!
//! 画像バイト列と言語ヒントのSHA-256をキーにしてOCRテキストをキャッシュし、
//! 同じ写真の再認識をスキップする。

use super::{ImageSource, OcrEngine};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const CACHE_FILE_NAME: &str = "ocr-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// ハッシュ → OCR結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 画像名
    pub label: String,
    /// 言語ヒント
    pub language: String,
    /// OCRテキスト
    pub text: String,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(dir: &Path) -> PathBuf {
        dir.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（壊れていれば空から）
    pub fn load(dir: &Path) -> Self {
        let cache_path = Self::cache_path(dir);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(_) => {
                log::warn!("[OCR] Cache version mismatch, starting fresh");
                Self::default()
            }
            Err(_) => Self::default(),
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let file = File::create(Self::cache_path(dir))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければ `false`）
    pub fn clear(dir: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(dir);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// キャッシュキー（言語ヒント＋画像バイト列のSHA-256）
pub fn cache_key(bytes: &[u8], language: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(language.as_bytes());
    hasher.update([0u8]);
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// キャッシュ付きOCRエンジン
///
/// ヒットしたら内側のエンジンを呼ばない。保存は `persist` で明示的に行う。
pub struct CachedOcrEngine<E> {
    inner: E,
    dir: PathBuf,
    cache: Mutex<CacheFile>,
}

impl<E: OcrEngine> CachedOcrEngine<E> {
    pub fn new(inner: E, dir: &Path) -> Self {
        Self {
            inner,
            dir: dir.to_path_buf(),
            cache: Mutex::new(CacheFile::load(dir)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn persist(&self) -> Result<()> {
        let snapshot = match self.cache.lock() {
            Ok(cache) => cache.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        snapshot.save(&self.dir)
    }
}

#[async_trait]
impl<E: OcrEngine> OcrEngine for CachedOcrEngine<E> {
    async fn extract_text(&self, image: &ImageSource, language: &str) -> Result<String> {
        let key = cache_key(&image.to_bytes()?, language);

        let hit = self
            .cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&key).map(|e| e.text.clone()));
        if let Some(text) = hit {
            log::debug!("[OCR] Cache hit for {}", image.label());
            return Ok(text);
        }

        let text = self.inner.extract_text(image, language).await?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                key,
                CacheEntry {
                    label: image.label().to_string(),
                    language: language.to_string(),
                    text: text.clone(),
                },
            );
        }
        Ok(text)
    }
}
