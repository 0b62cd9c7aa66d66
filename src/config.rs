use crate::error::{DiecastError, Result};
use diecast_scan_common::{Catalog, CompiledRules, RuleTable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://api.upcitemdb.com/prod/trial/lookup";
pub const DEFAULT_IMPORT_ENDPOINT: &str = "https://fastwheelsapi.joedots1.repl.co/car/";
const LOOKUP_ENDPOINT_ENV: &str = "DIECAST_LOOKUP_ENDPOINT";
const APP_DIR: &str = "diecast-scan";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr_command: String,
    pub ocr_language: String,
    pub max_image_size: u32,
    pub lookup_endpoint: String,
    pub import_endpoint: String,
    pub timeout_seconds: u64,
    pub catalog_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    /// 抽出ルールのプリセット（hotwheels / generic）
    pub rules_preset: String,
    pub store_path: Option<PathBuf>,
    pub collector: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr_command: "tesseract".into(),
            ocr_language: "eng".into(),
            max_image_size: 2000, // 長辺。これ以上はOCR前に縮小
            lookup_endpoint: DEFAULT_LOOKUP_ENDPOINT.into(),
            import_endpoint: DEFAULT_IMPORT_ENDPOINT.into(),
            timeout_seconds: 15,
            catalog_path: None,
            rules_path: None,
            rules_preset: "hotwheels".into(),
            store_path: None,
            collector: "local".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            log::debug!("[CONFIG] Loaded {:?}", config_path);
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DiecastError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join(APP_DIR).join("config.json"))
    }

    /// 識別コード検索APIのエンドポイント（環境変数を優先）
    pub fn lookup_endpoint(&self) -> String {
        match std::env::var(LOOKUP_ENDPOINT_ENV) {
            Ok(endpoint) if !endpoint.trim().is_empty() => endpoint,
            _ => self.lookup_endpoint.clone(),
        }
    }

    /// 参照カタログ（指定がなければ同梱データ）
    pub fn load_catalog(&self, override_path: Option<&Path>) -> Result<Catalog> {
        match override_path.or(self.catalog_path.as_deref()) {
            Some(path) => {
                if !path.exists() {
                    return Err(DiecastError::FileNotFound(path.display().to_string()));
                }
                let catalog = Catalog::from_file(path)?;
                log::info!("[CONFIG] Catalog {:?}: {} entries", path, catalog.len());
                Ok(catalog)
            }
            None => Ok(Catalog::bundled().clone()),
        }
    }

    /// 抽出ルール（プリセット＋ファイル指定分）
    pub fn load_rules(&self, override_path: Option<&Path>, override_preset: Option<&str>) -> Result<CompiledRules> {
        let preset = override_preset.unwrap_or(&self.rules_preset);
        let mut table = RuleTable::from_preset(preset)?;
        log::debug!("[CONFIG] Extraction rules preset: {}", preset);
        if let Some(path) = override_path.or(self.rules_path.as_deref()) {
            if !path.exists() {
                return Err(DiecastError::FileNotFound(path.display().to_string()));
            }
            table.merge(&RuleTable::from_file(path)?);
            log::info!("[CONFIG] Extraction rules merged from {:?}", path);
        }
        Ok(table.compile()?)
    }

    /// コレクション保存先
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| DiecastError::Config("データディレクトリが見つかりません".into()))?;
        Ok(data_dir.join(APP_DIR).join("collection.json"))
    }

    /// OCRキャッシュの保存ディレクトリ
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| DiecastError::Config("キャッシュディレクトリが見つかりません".into()))?;
        Ok(cache_dir.join(APP_DIR))
    }
}
