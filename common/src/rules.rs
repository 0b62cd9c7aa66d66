//! 抽出ルールテーブル
//!
//! パッケージ文字列から候補値を拾うための正規表現をまとめて管理する。
//! ルールは「名前 → パターン」で保持し、JSONファイルで追加・上書き・無効化できる。
//!
//! パターンはすべて大文字化済みのテキストに対して適用される。

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 名前付きパターン
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub name: String,
    pub pattern: String,
}

impl PatternRule {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// ルール定義（未コンパイル）
///
/// JSONから読み込んだ場合、記述のないフィールドは空になる。
/// 空のフィールドは `merge` 時に上書きしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// 車名候補とみなす行全体のパターン
    #[serde(default)]
    pub model_name: String,
    /// 車名候補から除外する定型文・注意書き
    #[serde(default)]
    pub exclusions: Vec<PatternRule>,
    /// シリーズ名を示す行のパターン
    #[serde(default)]
    pub series: Vec<PatternRule>,
    /// コレクション番号（例: 82/250）
    #[serde(default)]
    pub collection_number: String,
    /// 識別コード（UPC/EAN）
    #[serde(default)]
    pub identifier_code: String,
}

impl RuleTable {
    /// 組み込みルール（Hot Wheelsのブリスター向け）
    pub fn builtin() -> Self {
        Self {
            model_name: r"^[A-Z0-9 \-]{3,25}$".into(),
            exclusions: vec![
                PatternRule::new("brand_disclaimer", r"HOT WHEELS|MATTEL"),
                PatternRule::new("safety_warning", r"WARNING|CAUTION|SEGURAN[CÇ]A|FOR AGES|PARTS"),
                PatternRule::new("manufacturing_notice", r"MADE IN|FABRICADO|EMPOWERING"),
                PatternRule::new("regulatory_notice", r"INMETRO|INDICADO"),
                PatternRule::new("numeric_only", r"^[0-9 \-]+$"),
            ],
            series: vec![
                PatternRule::new("art_token", r"\bART\b"),
                PatternRule::new("cars_token", r"\bCARS\b"),
                PatternRule::new("hw_prefix", r"\bHW\s+[A-Z]+"),
            ],
            collection_number: r"\d{1,3}\s*[\\/]\s*\d{1,3}".into(),
            identifier_code: r"\d{12,13}".into(),
        }
    }

    /// プリセットを取得
    pub fn from_preset(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "hotwheels" | "hot-wheels" | "default" => Ok(Self::builtin()),
            "generic" | "汎用" => Ok(Self::generic_preset()),
            other => Err(Error::Config(format!(
                "Unknown rules preset: {}. Use hotwheels or generic",
                other
            ))),
        }
    }

    /// ブランド固有のシリーズ規則を持たない汎用プリセット
    fn generic_preset() -> Self {
        let mut table = Self::builtin();
        table.exclusions.retain(|r| r.name != "brand_disclaimer");
        table.series.retain(|r| r.name != "hw_prefix");
        table
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        Ok(table)
    }

    /// 設定をマージ（後から追加した設定が優先）
    ///
    /// 同名のルールは置き換え、パターンが空のルールは削除する。
    pub fn merge(&mut self, other: &RuleTable) {
        if !other.model_name.is_empty() {
            self.model_name = other.model_name.clone();
        }
        if !other.collection_number.is_empty() {
            self.collection_number = other.collection_number.clone();
        }
        if !other.identifier_code.is_empty() {
            self.identifier_code = other.identifier_code.clone();
        }
        merge_rules(&mut self.exclusions, &other.exclusions);
        merge_rules(&mut self.series, &other.series);
    }

    /// 正規表現をコンパイル
    pub fn compile(&self) -> Result<CompiledRules> {
        Ok(CompiledRules {
            model_name: compile_one("model_name", &self.model_name)?,
            exclusions: compile_all(&self.exclusions)?,
            series: compile_all(&self.series)?,
            collection_number: compile_one("collection_number", &self.collection_number)?,
            identifier_code: compile_one("identifier_code", &self.identifier_code)?,
        })
    }
}

fn merge_rules(base: &mut Vec<PatternRule>, overrides: &[PatternRule]) {
    for rule in overrides {
        let existing = base.iter().position(|r| r.name == rule.name);
        match (existing, rule.pattern.is_empty()) {
            (Some(idx), true) => {
                base.remove(idx);
            }
            (Some(idx), false) => base[idx] = rule.clone(),
            (None, false) => base.push(rule.clone()),
            (None, true) => {}
        }
    }
}

fn compile_one(name: &str, pattern: &str) -> Result<Regex> {
    if pattern.is_empty() {
        return Err(Error::Rule {
            name: name.to_string(),
            message: "パターンが空です".into(),
        });
    }
    Regex::new(pattern).map_err(|e| Error::Rule {
        name: name.to_string(),
        message: e.to_string(),
    })
}

fn compile_all(rules: &[PatternRule]) -> Result<Vec<(String, Regex)>> {
    rules
        .iter()
        .map(|r| compile_one(&r.name, &r.pattern).map(|re| (r.name.clone(), re)))
        .collect()
}

/// コンパイル済みルール
#[derive(Debug, Clone)]
pub struct CompiledRules {
    model_name: Regex,
    exclusions: Vec<(String, Regex)>,
    series: Vec<(String, Regex)>,
    collection_number: Regex,
    identifier_code: Regex,
}

lazy_static::lazy_static! {
    static ref BUILTIN_RULES: CompiledRules = RuleTable::builtin()
        .compile()
        .expect("組み込みルールのコンパイルに失敗");
}

impl CompiledRules {
    /// 組み込みルール（プロセス内で1回だけコンパイル）
    pub fn builtin() -> &'static CompiledRules {
        &BUILTIN_RULES
    }

    /// 車名パターンに一致するか（除外ルールは見ない）
    pub fn matches_model_name(&self, line: &str) -> bool {
        self.model_name.is_match(line)
    }

    /// 最初に一致した除外ルール名
    pub fn exclusion_for(&self, line: &str) -> Option<&str> {
        self.exclusions
            .iter()
            .find(|(_, re)| re.is_match(line))
            .map(|(name, _)| name.as_str())
    }

    /// 最初に一致したシリーズルール名
    pub fn series_rule_for(&self, line: &str) -> Option<&str> {
        self.series
            .iter()
            .find(|(_, re)| re.is_match(line))
            .map(|(name, _)| name.as_str())
    }

    pub fn collection_number(&self) -> &Regex {
        &self.collection_number
    }

    pub fn identifier_code(&self) -> &Regex {
        &self.identifier_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_compiles() {
        let rules = CompiledRules::builtin();
        assert!(rules.matches_model_name("PORSCHE 904 CARRERA GTS"));
        assert!(rules.identifier_code().is_match("887961234567"));
    }

    #[test]
    fn test_exclusion_markers() {
        let rules = CompiledRules::builtin();
        assert_eq!(rules.exclusion_for("HOT WHEELS"), Some("brand_disclaimer"));
        assert_eq!(rules.exclusion_for("MADE IN MALAYSIA"), Some("manufacturing_notice"));
        assert_eq!(rules.exclusion_for("WARNING - SMALL PARTS"), Some("safety_warning"));
        assert_eq!(rules.exclusion_for("SEGURANÇA"), Some("safety_warning"));
        assert_eq!(rules.exclusion_for("887961234567"), Some("numeric_only"));
        assert_eq!(rules.exclusion_for("BONE SHAKER"), None);
    }

    #[test]
    fn test_series_rules() {
        let rules = CompiledRules::builtin();
        assert_eq!(rules.series_rule_for("HW EXOTICS"), Some("hw_prefix"));
        assert_eq!(rules.series_rule_for("HW ART CARS"), Some("art_token"));
        assert_eq!(rules.series_rule_for("CARRERA GTS"), None);
    }

    #[test]
    fn test_preset_unknown() {
        assert_eq!(RuleTable::from_preset("hotwheels").unwrap(), RuleTable::builtin());
        assert_eq!(RuleTable::from_preset("").unwrap(), RuleTable::builtin());
        assert!(matches!(RuleTable::from_preset("不明"), Err(Error::Config(_))));
    }

    #[test]
    fn test_generic_preset_drops_brand_rules() {
        let rules = RuleTable::from_preset("generic").unwrap().compile().unwrap();
        assert_eq!(rules.exclusion_for("HOT WHEELS"), None);
        assert_eq!(rules.series_rule_for("HW EXOTICS"), None);
    }

    #[test]
    fn test_merge_overrides_and_removes() {
        let mut table = RuleTable::builtin();
        let custom = RuleTable::from_json(
            r#"{
                "exclusions": [
                    {"name": "numeric_only", "pattern": ""},
                    {"name": "collector_club", "pattern": "RLC|COLLECTORS"}
                ],
                "series": [
                    {"name": "hw_prefix", "pattern": "\\b(HW|MB)\\s+[A-Z]+"}
                ]
            }"#,
        )
        .unwrap();

        table.merge(&custom);
        let rules = table.compile().unwrap();

        assert_eq!(rules.exclusion_for("887961234567"), None);
        assert_eq!(rules.exclusion_for("RLC EXCLUSIVE"), Some("collector_club"));
        assert_eq!(rules.series_rule_for("MB CITY"), Some("hw_prefix"));
        // 空フィールドは上書きしない
        assert_eq!(table.model_name, RuleTable::builtin().model_name);
    }

    #[test]
    fn test_compile_invalid_pattern() {
        let mut table = RuleTable::builtin();
        table.series.push(PatternRule::new("broken", "(HW"));
        let err = table.compile().unwrap_err();
        assert!(matches!(err, Error::Rule { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_compile_empty_scalar_pattern() {
        let table = RuleTable::from_json("{}").unwrap();
        assert!(table.compile().is_err());
    }
}
