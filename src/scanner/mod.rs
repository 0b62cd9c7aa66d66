//! 画像ファイルの収集
//!
//! 引数で渡された画像パスとフォルダ直下の画像を、OCR入力の順序に並べる。

use crate::error::{DiecastError, Result};
use crate::ocr::ImageSource;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

/// フォルダ直下の画像をファイル名順で取得
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(DiecastError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_path(e.path()))
        .map(|e| e.into_path())
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    log::debug!("[SCAN] {} image(s) in {:?}", images.len(), folder);
    Ok(images)
}

/// 明示パス（指定順）＋フォルダ内画像を集める
pub fn collect_images(paths: &[PathBuf], folder: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.is_file() {
            return Err(DiecastError::FileNotFound(path.display().to_string()));
        }
        images.push(path.clone());
    }
    if let Some(folder) = folder {
        images.extend(scan_folder(folder)?);
    }
    Ok(images)
}

/// 画像パスをOCR入力にする（読めないファイルは解決時にその画像だけ失敗扱い）
pub fn load_images(paths: &[PathBuf]) -> Vec<ImageSource> {
    paths.iter().map(|p| ImageSource::from_path(p)).collect()
}
