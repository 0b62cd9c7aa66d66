use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiecastError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("OCRエラー: {0}")]
    Ocr(String),

    #[error("識別コード検索エラー: {0}")]
    Lookup(String),

    #[error("識別コードが不正です: '{0}'（数字のみ）")]
    InvalidIdentifier(String),

    #[error("必須項目が未入力です: {0}")]
    MissingField(&'static str),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("コレクション保存エラー: {0}")]
    Store(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("カタログ取り込みエラー: {0:#}")]
    Import(#[from] anyhow::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] diecast_scan_common::Error),
}

pub type Result<T> = std::result::Result<T, DiecastError>;
