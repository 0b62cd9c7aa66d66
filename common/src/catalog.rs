//! 参照カタログモジュール
//!
//! 同梱またはファイル指定の参照データセットを読み込み、
//! 車名・識別コードで完全一致検索を行う。あいまい検索はしない。

use crate::error::Result;
use crate::types::CatalogEntry;
use std::path::Path;

/// 同梱データセット
const BUNDLED_CATALOG: &str = include_str!("../data/hotwheels_lookup.json");

lazy_static::lazy_static! {
    static ref BUNDLED: Catalog = Catalog::from_json(BUNDLED_CATALOG)
        .expect("同梱カタログの読み込みに失敗");
}

/// 車名の比較キー（空白をすべて除去して小文字化）
///
/// `"Porsche 904"` と `"porsche904"` は同じキーになる。
pub fn normalize_model_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 参照カタログ（読み込み後は変更しない）
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// 同梱データセット（プロセス内で1回だけ読み込む）
    pub fn bundled() -> &'static Catalog {
        &BUNDLED
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み（CatalogEntryの配列）
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 車名または識別コードで検索
    ///
    /// データセット順に走査し、どちらかの条件を満たす最初のエントリを返す。
    /// 同じ車名で識別コードが異なるエントリがあっても統合しない。
    pub fn match_catalog(
        &self,
        model_name: Option<&str>,
        identifier_code: Option<&str>,
    ) -> Option<&CatalogEntry> {
        let model_key = model_name
            .map(normalize_model_key)
            .filter(|key| !key.is_empty());
        let code = identifier_code.map(str::trim).filter(|c| !c.is_empty());

        if model_key.is_none() && code.is_none() {
            return None;
        }

        self.entries.iter().find(|entry| {
            let name_hit = model_key
                .as_deref()
                .is_some_and(|key| normalize_model_key(&entry.model_name) == key);
            let code_hit = code.is_some_and(|c| entry.identifier_code == c);
            name_hit || code_hit
        })
    }

    /// 識別コードの完全一致のみで検索
    pub fn find_by_identifier(&self, code: &str) -> Option<&CatalogEntry> {
        self.match_catalog(None, Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawYear;

    fn sample_catalog() -> Catalog {
        Catalog::from_json(
            r#"[
                {"model_name": "BONE SHAKER", "brand": "Hot Wheels", "upc": "027084111111", "year": 2006, "series": "HW Originals"},
                {"model_name": "PORSCHE 904", "brand": "Porsche", "upc": "887961000001", "year": "2019", "series": "HW Exotics"},
                {"model_name": "PORSCHE 904", "brand": "Porsche", "upc": "887961000002", "year": "2020", "series": "Car Culture"},
                {"model_name": "TWIN MILL", "brand": "Hot Wheels", "upc": "", "year": "n/a"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_model_key() {
        assert_eq!(normalize_model_key("Porsche 904"), "porsche904");
        assert_eq!(normalize_model_key("  PORSCHE\t904 "), "porsche904");
    }

    #[test]
    fn test_match_case_and_whitespace_insensitive() {
        let catalog = sample_catalog();
        let a = catalog.match_catalog(Some("Porsche 904"), None).unwrap();
        let b = catalog.match_catalog(Some("porsche904"), None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.identifier_code, "887961000001");
    }

    #[test]
    fn test_match_by_identifier() {
        let catalog = sample_catalog();
        let entry = catalog.match_catalog(None, Some("887961000002")).unwrap();
        assert_eq!(entry.series, "Car Culture");
    }

    #[test]
    fn test_match_first_entry_in_dataset_order() {
        let catalog = sample_catalog();
        // 車名は1件目、コードは2件目に一致 → データセット順で先の1件目
        let entry = catalog
            .match_catalog(Some("PORSCHE 904"), Some("887961000002"))
            .unwrap();
        assert_eq!(entry.identifier_code, "887961000001");
    }

    #[test]
    fn test_match_either_predicate() {
        let catalog = sample_catalog();
        let entry = catalog
            .match_catalog(Some("UNKNOWN CAR"), Some("027084111111"))
            .unwrap();
        assert_eq!(entry.model_name, "BONE SHAKER");
    }

    #[test]
    fn test_no_partial_match() {
        let catalog = sample_catalog();
        assert!(catalog.match_catalog(Some("PORSCHE"), None).is_none());
        assert!(catalog.match_catalog(None, Some("88796100000")).is_none());
    }

    #[test]
    fn test_absent_inputs() {
        let catalog = sample_catalog();
        assert!(catalog.match_catalog(None, None).is_none());
        assert!(catalog.match_catalog(Some("  "), Some("")).is_none());
    }

    #[test]
    fn test_empty_code_never_matches_blank_entry() {
        let catalog = sample_catalog();
        assert!(catalog.find_by_identifier("").is_none());
    }

    #[test]
    fn test_year_text_not_numeric() {
        let catalog = sample_catalog();
        let entry = catalog.match_catalog(Some("twin mill"), None).unwrap();
        assert_eq!(entry.year, Some(RawYear::Text("n/a".to_string())));
        assert_eq!(entry.launch_year(), None);
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = Catalog::bundled();
        assert!(!catalog.is_empty(), "同梱カタログが空");
        assert!(catalog.entries().iter().all(|e| !e.model_name.is_empty()));
    }
}
