//! 解析結果の型定義
//!
//! CLIとライブラリ利用側で共有される型:
//! - CandidateFields: OCRテキストから抽出した候補値
//! - CatalogEntry: 参照カタログの1件
//! - ResolvedRecord: 最終出力（カタログ＋候補値をマージ）
//! - ProductInfo: 識別コード検索の結果

use serde::{Deserialize, Serialize};
use std::fmt;

/// 空文字（空白のみ含む）を欠損として扱う
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// OCRテキストから抽出した候補値
///
/// 各スロットは独立して存在/欠損する。値は検証済みの事実ではなく候補。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateFields {
    pub model_name: Option<String>,
    pub series: Option<String>,
    pub collection_number: Option<String>,
    pub identifier_code: Option<String>,
}

impl CandidateFields {
    /// 全スロットが欠損しているか
    pub fn is_empty(&self) -> bool {
        self.model_name.is_none()
            && self.series.is_none()
            && self.collection_number.is_none()
            && self.identifier_code.is_none()
    }
}

/// カタログの年フィールド（数値と文字列の両方が混在する）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawYear {
    Number(i64),
    Text(String),
}

/// 参照カタログの1件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub model_name: String,
    pub brand: String,
    /// 識別コード（UPC/EAN）
    #[serde(rename = "upc")]
    pub identifier_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<RawYear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_year: Option<i32>,
    pub series: String,
    pub collection_number: String,
    pub base_color: String,
    pub variants: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl CatalogEntry {
    /// 発売年を整数で取得
    ///
    /// `year` が文字列の場合は数値に変換し、変換できなければ `None`。
    /// `year` がなければ `launch_year` を使う。
    pub fn launch_year(&self) -> Option<i32> {
        match &self.year {
            Some(RawYear::Number(n)) => i32::try_from(*n).ok(),
            Some(RawYear::Text(text)) => text.trim().parse().ok(),
            None => self.launch_year,
        }
    }

    /// 年の表示用文字列（変換せずそのまま）
    pub fn year_text(&self) -> String {
        match &self.year {
            Some(RawYear::Number(n)) => n.to_string(),
            Some(RawYear::Text(text)) => text.clone(),
            None => self.launch_year.map(|y| y.to_string()).unwrap_or_default(),
        }
    }
}

/// 保存状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    Sealed,
    Loose,
    Damaged,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::Sealed, Condition::Loose, Condition::Damaged];

    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Sealed => "未開封",
            Condition::Loose => "ルース",
            Condition::Damaged => "破損",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sealed => "sealed",
            Condition::Loose => "loose",
            Condition::Damaged => "damaged",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sealed" | "未開封" => Ok(Condition::Sealed),
            "loose" | "ルース" => Ok(Condition::Loose),
            "damaged" | "破損" => Ok(Condition::Damaged),
            _ => Err(format!("Unknown condition: {}. Use sealed, loose, or damaged", s)),
        }
    }
}

/// 解決済みレコード（フォーム入力状態）
///
/// 解決1回ごとに新規作成され、呼び出し側が所有する。
/// 所有情報（購入日など）は解決では埋まらず、確認・編集時に入力される。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedRecord {
    pub model_name: String,
    pub brand: String,
    pub launch_year: Option<i32>,
    pub series: String,
    pub collection_number: String,
    pub base_color: String,
    pub variants: String,
    pub identifier_code: String,

    // 所有情報
    pub acquisition_date: String,
    pub price_paid: Option<f64>,
    pub condition: Condition,
    pub is_treasure_hunt: bool,
    pub is_super_treasure_hunt: bool,
    pub personal_notes: String,
}

/// 識別コード検索の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInfo {
    pub upc: String,
    pub name: String,
    pub brand: String,
    pub year: String,
    pub image_url: String,
    pub description: String,
}

impl From<&CatalogEntry> for ProductInfo {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            upc: entry.identifier_code.clone(),
            name: entry.model_name.clone(),
            brand: entry.brand.clone(),
            year: entry.year_text(),
            image_url: entry.image_url.clone(),
            description: entry.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  HW EXOTICS "), Some("HW EXOTICS".to_string()));
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("   "), None);
    }

    #[test]
    fn test_candidate_fields_default_is_empty() {
        assert!(CandidateFields::default().is_empty());

        let fields = CandidateFields {
            series: Some("HW ART CARS".to_string()),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_catalog_entry_year_as_text() {
        let json = r#"{"model_name": "PORSCHE 904", "brand": "Porsche", "year": "2019"}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.launch_year(), Some(2019));
        assert_eq!(entry.year_text(), "2019");
    }

    #[test]
    fn test_catalog_entry_year_as_number() {
        let json = r#"{"model_name": "BONE SHAKER", "year": 2006}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.launch_year(), Some(2006));
    }

    #[test]
    fn test_catalog_entry_year_not_numeric() {
        let json = r#"{"model_name": "TWIN MILL", "year": "desconhecido"}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.launch_year(), None);
        assert_eq!(entry.year_text(), "desconhecido");
    }

    #[test]
    fn test_catalog_entry_upc_field_name() {
        let json = r#"{"model_name": "DEORA II", "upc": "887961234567"}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.identifier_code, "887961234567");

        let out = serde_json::to_string(&entry).unwrap();
        assert!(out.contains("\"upc\":\"887961234567\""));
        assert!(!out.contains("image_url"));
    }

    #[test]
    fn test_condition_from_str() {
        assert_eq!("sealed".parse::<Condition>(), Ok(Condition::Sealed));
        assert_eq!("LOOSE".parse::<Condition>(), Ok(Condition::Loose));
        assert_eq!("破損".parse::<Condition>(), Ok(Condition::Damaged));
        assert!("mint".parse::<Condition>().is_err());
    }

    #[test]
    fn test_resolved_record_serialize() {
        let record = ResolvedRecord {
            model_name: "PORSCHE 904 CARRERA GTS".to_string(),
            identifier_code: "887961234567".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"modelName\":\"PORSCHE 904 CARRERA GTS\""));
        assert!(json.contains("\"identifierCode\":\"887961234567\""));
        assert!(json.contains("\"condition\":\"sealed\""));
    }

    #[test]
    fn test_product_info_from_catalog_entry() {
        let entry = CatalogEntry {
            model_name: "'67 CAMARO".to_string(),
            brand: "Chevrolet".to_string(),
            identifier_code: "027084123456".to_string(),
            year: Some(RawYear::Number(2012)),
            image_url: "https://example.com/camaro.jpg".to_string(),
            ..Default::default()
        };
        let info = ProductInfo::from(&entry);
        assert_eq!(info.upc, "027084123456");
        assert_eq!(info.name, "'67 CAMARO");
        assert_eq!(info.year, "2012");
        assert_eq!(info.image_url, "https://example.com/camaro.jpg");
        assert_eq!(info.description, "");
    }
}
