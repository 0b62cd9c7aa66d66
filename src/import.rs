//! 参照カタログの取り込み
//!
//! 年別の車両APIから取得したデータを `CatalogEntry` の配列に整形する。
//! 車名を大文字化、ブランド・色・シリーズは単語ごとに先頭大文字化。
//! 車名のない行は捨て、(車名, ブランド, 年) の重複は先勝ちで除去する。

use anyhow::{Context, Result};
use diecast_scan_common::{CatalogEntry, RawYear};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

/// APIの1行
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawCar {
    name: Option<String>,
    manufacturer: Option<String>,
    color: Option<String>,
    year: Option<serde_json::Value>,
    series: Option<String>,
    number: Option<serde_json::Value>,
    upc: Option<String>,
}

/// 単語ごとに先頭を大文字、残りを小文字
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn value_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

/// 1行を整形（車名がなければ `None`）
pub fn normalize_car(car: &RawCar, fallback_year: i32) -> Option<CatalogEntry> {
    let model_name = trimmed(&car.name).to_uppercase();
    if model_name.is_empty() {
        return None;
    }

    let year = match &car.year {
        Some(serde_json::Value::Number(n)) => n.as_i64().map(RawYear::Number),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(RawYear::Text(s.trim().to_string())),
        _ => Some(RawYear::Number(i64::from(fallback_year))),
    };

    Some(CatalogEntry {
        model_name,
        brand: title_case(trimmed(&car.manufacturer)),
        identifier_code: trimmed(&car.upc).to_string(),
        year,
        series: title_case(trimmed(&car.series)),
        collection_number: value_text(car.number.as_ref()),
        base_color: title_case(trimmed(&car.color)),
        ..Default::default()
    })
}

/// (車名, ブランド, 年) で重複除去（先勝ち）
pub fn dedupe(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert((e.model_name.clone(), e.brand.clone(), e.year_text())))
        .collect()
}

/// 年ごとに取得して整形（取得できなかった年はスキップ）
pub async fn import_catalog(
    endpoint: &str,
    years: RangeInclusive<i32>,
    timeout: Duration,
) -> Result<Vec<CatalogEntry>> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("HTTPクライアントの初期化に失敗")?;

    let total = years.clone().count() as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let base = endpoint.trim_end_matches('/');
    let mut entries = Vec::new();

    for year in years {
        pb.set_message(format!("{}年", year));
        let url = format!("{}/{}", base, year);

        match fetch_year(&client, &url).await {
            Ok(cars) => {
                log::debug!("[IMPORT] {}: {} rows", url, cars.len());
                entries.extend(cars.iter().filter_map(|car| normalize_car(car, year)));
            }
            Err(e) => {
                log::warn!("[IMPORT] Skipping {}: {:#}", url, e);
                pb.println(format!("⚠ {}年の取得に失敗: {}", year, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(dedupe(entries))
}

async fn fetch_year(client: &reqwest::Client, url: &str) -> Result<Vec<RawCar>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("リクエスト失敗: {}", url))?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {}", status);
    }
    response
        .json::<Vec<RawCar>>()
        .await
        .context("レスポンスのJSON解析に失敗")
}

/// カタログJSONを書き出し
pub fn write_catalog(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("フォルダを作成できません: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, json).with_context(|| format!("書き込み失敗: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(json: &str) -> RawCar {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("HW EXOTICS"), "Hw Exotics");
        assert_eq!(title_case("  metalflake red "), "Metalflake Red");
        assert_eq!(title_case("mercedes-benz"), "Mercedes-Benz");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_normalize_car() {
        let entry = normalize_car(
            &car(r#"{"name": " porsche 904 carrera gts ", "manufacturer": "PORSCHE", "color": "silver",
                     "year": 2019, "series": "hw exotics", "number": "1/10", "upc": " 887961700015 "}"#),
            2019,
        )
        .unwrap();
        assert_eq!(entry.model_name, "PORSCHE 904 CARRERA GTS");
        assert_eq!(entry.brand, "Porsche");
        assert_eq!(entry.base_color, "Silver");
        assert_eq!(entry.series, "Hw Exotics");
        assert_eq!(entry.collection_number, "1/10");
        assert_eq!(entry.identifier_code, "887961700015");
        assert_eq!(entry.launch_year(), Some(2019));
    }

    #[test]
    fn test_normalize_car_defaults() {
        let entry = normalize_car(&car(r#"{"name": "Twin Mill", "number": 42}"#), 2012).unwrap();
        assert_eq!(entry.year, Some(RawYear::Number(2012)));
        assert_eq!(entry.collection_number, "42");
        assert_eq!(entry.brand, "");
    }

    #[test]
    fn test_nameless_row_dropped() {
        assert!(normalize_car(&car(r#"{"name": "  ", "manufacturer": "Ford"}"#), 2015).is_none());
        assert!(normalize_car(&car(r#"{"manufacturer": "Ford"}"#), 2015).is_none());
    }

    #[test]
    fn test_dedupe_first_wins() {
        let rows = [
            r#"{"name": "Bone Shaker", "manufacturer": "Hot Wheels", "year": 2015, "color": "black"}"#,
            r#"{"name": "BONE SHAKER", "manufacturer": "hot wheels", "year": 2015, "color": "red"}"#,
            r#"{"name": "Bone Shaker", "manufacturer": "Hot Wheels", "year": 2016}"#,
        ];
        let entries: Vec<_> = rows.iter().filter_map(|r| normalize_car(&car(r), 2015)).collect();
        let unique = dedupe(entries);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].base_color, "Black");
    }

    #[test]
    fn test_write_catalog_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("catalog.json");
        let entries = vec![normalize_car(&car(r#"{"name": "Deora II", "upc": "027084000001"}"#), 2010).unwrap()];
        write_catalog(&path, &entries).unwrap();

        let catalog = diecast_scan_common::Catalog::from_file(&path).unwrap();
        assert_eq!(catalog.find_by_identifier("027084000001").unwrap().model_name, "DEORA II");
    }
}
