//! tesseract CLI連携
//!
//! 画像をグレースケールPNGに変換し、標準入力経由で `tesseract stdin stdout` に渡す。

use super::{ImageSource, OcrEngine};
use crate::config::Config;
use crate::error::{DiecastError, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use std::io::Cursor;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub struct TesseractCli {
    command: String,
    max_image_size: u32,
}

impl TesseractCli {
    pub fn new(command: impl Into<String>, max_image_size: u32) -> Self {
        Self {
            command: command.into(),
            max_image_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ocr_command.clone(), config.max_image_size)
    }
}

/// OCR向けに画像を整形（縮小・グレースケール・PNG）
pub(crate) fn prepare_image(bytes: &[u8], max_image_size: u32) -> Result<Vec<u8>> {
    let mut img = image::load_from_memory(bytes)
        .map_err(|e| DiecastError::ImageLoad(e.to_string()))?;

    if max_image_size > 0 && (img.width() > max_image_size || img.height() > max_image_size) {
        log::debug!(
            "[OCR] Downscaling {}x{} to fit {}px",
            img.width(),
            img.height(),
            max_image_size
        );
        img = img.resize(max_image_size, max_image_size, FilterType::Triangle);
    }

    let mut buffer = Cursor::new(Vec::new());
    img.grayscale()
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| DiecastError::ImageLoad(format!("PNG変換に失敗: {}", e)))?;
    Ok(buffer.into_inner())
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn extract_text(&self, image: &ImageSource, language: &str) -> Result<String> {
        log::info!("[OCR] Extracting text from {}", image.label());

        let bytes = image.to_bytes()?.into_owned();
        let max = self.max_image_size;
        let png = tokio::task::spawn_blocking(move || prepare_image(&bytes, max))
            .await
            .map_err(|e| DiecastError::Ocr(format!("画像変換タスクが異常終了: {}", e)))??;

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DiecastError::Ocr(format!("{} の起動に失敗（インストール済みか確認）: {}", self.command, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DiecastError::Ocr("標準入力を開けません".into()))?;
        stdin.write_all(&png).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiecastError::Ocr(format!(
                "{} failed (code {:?}): {}",
                self.command,
                output.status.code(),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        log::info!("[OCR] {}: {} characters", image.label(), text.len());
        log::debug!("[OCR] Raw text:\n{}", text);
        Ok(text)
    }
}
