//! 解決結果のマージ
//!
//! カタログの既知情報を下地にし、OCRで得た候補値で上書きする。

use crate::types::{CandidateFields, CatalogEntry, ResolvedRecord};

/// カタログ一致と候補値からレコードを生成
///
/// 優先順位: 空のレコード < カタログ < OCR候補値。
/// 候補値が存在するスロットだけがカタログの値を上書きする。
pub fn merge_record(catalog_match: Option<&CatalogEntry>, candidates: &CandidateFields) -> ResolvedRecord {
    let mut record = ResolvedRecord::default();

    if let Some(entry) = catalog_match {
        record.model_name = entry.model_name.clone();
        record.brand = entry.brand.clone();
        record.launch_year = entry.launch_year();
        record.series = entry.series.clone();
        record.collection_number = entry.collection_number.clone();
        record.base_color = entry.base_color.clone();
        record.variants = entry.variants.clone();
        record.identifier_code = entry.identifier_code.clone();
    }

    overlay(&mut record.model_name, &candidates.model_name);
    overlay(&mut record.series, &candidates.series);
    overlay(&mut record.collection_number, &candidates.collection_number);
    overlay(&mut record.identifier_code, &candidates.identifier_code);

    record
}

fn overlay(target: &mut String, candidate: &Option<String>) {
    if let Some(value) = candidate.as_deref().filter(|v| !v.trim().is_empty()) {
        *target = value.to_string();
    }
}

/// 何か認識できたか
///
/// 車名・識別コードの候補がどちらもなく、カタログ一致にも車名がない場合のみ `false`。
pub fn is_recognized(candidates: &CandidateFields, catalog_match: Option<&CatalogEntry>) -> bool {
    let catalog_has_name = catalog_match.is_some_and(|e| !e.model_name.trim().is_empty());
    candidates.model_name.is_some() || candidates.identifier_code.is_some() || catalog_has_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawYear;

    fn exotics_entry() -> CatalogEntry {
        CatalogEntry {
            model_name: "PORSCHE 904 CARRERA GTS".to_string(),
            brand: "Porsche".to_string(),
            identifier_code: "887961700015".to_string(),
            year: Some(RawYear::Text("2019".to_string())),
            series: "HW Exotics".to_string(),
            collection_number: "1/10".to_string(),
            base_color: "Silver".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_candidate_overrides_catalog() {
        let candidates = CandidateFields {
            series: Some("HW Art Cars".to_string()),
            ..Default::default()
        };
        let record = merge_record(Some(&exotics_entry()), &candidates);
        assert_eq!(record.series, "HW Art Cars");
        // 候補のないスロットはカタログ値のまま
        assert_eq!(record.brand, "Porsche");
        assert_eq!(record.collection_number, "1/10");
        assert_eq!(record.launch_year, Some(2019));
    }

    #[test]
    fn test_catalog_only() {
        let record = merge_record(Some(&exotics_entry()), &CandidateFields::default());
        assert_eq!(record.model_name, "PORSCHE 904 CARRERA GTS");
        assert_eq!(record.identifier_code, "887961700015");
        assert_eq!(record.base_color, "Silver");
    }

    #[test]
    fn test_candidates_only() {
        let candidates = CandidateFields {
            model_name: Some("TWIN MILL".to_string()),
            collection_number: Some("5/10".to_string()),
            ..Default::default()
        };
        let record = merge_record(None, &candidates);
        assert_eq!(record.model_name, "TWIN MILL");
        assert_eq!(record.collection_number, "5/10");
        assert_eq!(record.brand, "");
        assert_eq!(record.launch_year, None);
    }

    #[test]
    fn test_empty_candidate_does_not_erase_catalog() {
        let candidates = CandidateFields {
            series: Some(String::new()),
            ..Default::default()
        };
        let record = merge_record(Some(&exotics_entry()), &candidates);
        assert_eq!(record.series, "HW Exotics");
    }

    #[test]
    fn test_nothing_merged_is_default() {
        assert_eq!(merge_record(None, &CandidateFields::default()), ResolvedRecord::default());
    }

    #[test]
    fn test_is_recognized() {
        let empty = CandidateFields::default();
        assert!(!is_recognized(&empty, None));
        assert!(is_recognized(&empty, Some(&exotics_entry())));

        let series_only = CandidateFields {
            series: Some("HW EXOTICS".to_string()),
            collection_number: Some("1/10".to_string()),
            ..Default::default()
        };
        assert!(!is_recognized(&series_only, None));

        let code_only = CandidateFields {
            identifier_code: Some("887961700015".to_string()),
            ..Default::default()
        };
        assert!(is_recognized(&code_only, None));
    }

    #[test]
    fn test_catalog_match_without_name_is_not_recognized() {
        let nameless = CatalogEntry {
            brand: "Hot Wheels".to_string(),
            ..Default::default()
        };
        assert!(!is_recognized(&CandidateFields::default(), Some(&nameless)));
    }
}
