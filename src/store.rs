//! コレクション保存
//!
//! カタログ単位のレコード（車名＋ブランドで重複排除）と、
//! コレクターごとの所有レコードをJSONファイル1つに保存する。

use crate::error::{DiecastError, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use diecast_scan_common::{Condition, ResolvedRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// カタログ単位のレコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub id: u64,
    pub upc: String,
    pub model_name: String,
    pub brand: String,
    pub launch_year: Option<i32>,
    pub series: String,
    pub collection_number: String,
    pub base_color: String,
    pub variants: String,
}

/// 所有レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedRecord {
    pub id: u64,
    pub master_id: u64,
    pub collector: String,
    pub acquisition_date: String,
    pub price_paid: Option<f64>,
    pub condition: Condition,
    pub variants: String,
    pub is_treasure_hunt: bool,
    pub is_super_treasure_hunt: bool,
    pub personal_notes: String,
    pub created_at: String,
}

impl OwnedRecord {
    fn created_date(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.created_at, TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| dt.date())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    masters: Vec<MasterRecord>,
    #[serde(default)]
    owned: Vec<OwnedRecord>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: CollectionStore::CURRENT_VERSION,
            masters: Vec::new(),
            owned: Vec::new(),
        }
    }
}

/// 追加結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub master_id: u64,
    pub owned_id: u64,
    /// カタログ単位のレコードを新規作成したか
    pub new_master: bool,
}

/// トレジャーハントの絞り込み
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreasureFilter {
    /// TH または STH
    Th,
    /// STH のみ
    Sth,
}

impl std::str::FromStr for TreasureFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "th" => Ok(TreasureFilter::Th),
            "sth" => Ok(TreasureFilter::Sth),
            _ => Err(format!("Unknown treasure filter: {}. Use th or sth", s)),
        }
    }
}

/// ガレージ一覧の絞り込み条件
#[derive(Debug, Clone, Default)]
pub struct GarageFilter {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub condition: Option<Condition>,
    pub treasure: Option<TreasureFilter>,
}

/// 一覧表示用（所有レコード＋カタログ単位レコード）
#[derive(Debug, Clone, Serialize)]
pub struct GarageItem<'a> {
    #[serde(flatten)]
    pub owned: &'a OwnedRecord,
    pub master: &'a MasterRecord,
}

impl GarageItem<'_> {
    fn matches(&self, filter: &GarageFilter) -> bool {
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = [&self.master.model_name, &self.master.brand, &self.master.series]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if let Some(brand) = &filter.brand {
            if &self.master.brand != brand {
                return false;
            }
        }
        if let Some(condition) = filter.condition {
            if self.owned.condition != condition {
                return false;
            }
        }
        match filter.treasure {
            Some(TreasureFilter::Th) => self.owned.is_treasure_hunt || self.owned.is_super_treasure_hunt,
            Some(TreasureFilter::Sth) => self.owned.is_super_treasure_hunt,
            None => true,
        }
    }
}

/// コレクション統計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub treasure_hunts: usize,
    pub added_this_month: usize,
    pub days_collecting: i64,
}

pub struct CollectionStore {
    path: PathBuf,
    data: StoreFile,
}

impl CollectionStore {
    const CURRENT_VERSION: u32 = 1;

    /// 保存ファイルを開く（なければ空）
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let data: StoreFile = serde_json::from_str(&content)?;
            if data.version != Self::CURRENT_VERSION {
                return Err(DiecastError::Store(format!(
                    "未対応のバージョンです: {}",
                    data.version
                )));
            }
            data
        } else {
            StoreFile::default()
        };
        log::debug!("[STORE] Opened {:?}: {} owned", path, data.owned.len());
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)?;
        log::info!("[STORE] Saved {:?}", self.path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.owned.is_empty()
    }

    /// コレクションに追加（現在時刻で記録）
    pub fn add_to_collection(&mut self, record: &ResolvedRecord, collector: &str) -> Result<AddOutcome> {
        self.add_at(record, collector, Local::now().naive_local())
    }

    /// コレクションに追加
    ///
    /// 車名とブランドは必須。購入日が空なら `now` の日付になる。
    pub fn add_at(&mut self, record: &ResolvedRecord, collector: &str, now: NaiveDateTime) -> Result<AddOutcome> {
        let model_name = record.model_name.trim();
        let brand = record.brand.trim();
        if model_name.is_empty() {
            return Err(DiecastError::MissingField("modelName"));
        }
        if brand.is_empty() {
            return Err(DiecastError::MissingField("brand"));
        }

        let acquisition_date = match record.acquisition_date.trim() {
            "" => now.format(DATE_FORMAT).to_string(),
            date => NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map_err(|_| DiecastError::Store(format!("購入日の形式が不正です: {}", date)))?
                .format(DATE_FORMAT)
                .to_string(),
        };

        let existing = self
            .data
            .masters
            .iter()
            .find(|m| m.model_name == model_name && m.brand == brand)
            .map(|m| m.id);

        let (master_id, new_master) = match existing {
            Some(id) => (id, false),
            None => {
                let id = next_id(self.data.masters.iter().map(|m| m.id));
                self.data.masters.push(MasterRecord {
                    id,
                    upc: record.identifier_code.clone(),
                    model_name: model_name.to_string(),
                    brand: brand.to_string(),
                    launch_year: record.launch_year,
                    series: record.series.clone(),
                    collection_number: record.collection_number.clone(),
                    base_color: record.base_color.clone(),
                    variants: record.variants.clone(),
                });
                (id, true)
            }
        };

        let owned_id = next_id(self.data.owned.iter().map(|o| o.id));
        self.data.owned.push(OwnedRecord {
            id: owned_id,
            master_id,
            collector: collector.to_string(),
            acquisition_date,
            price_paid: record.price_paid,
            condition: record.condition,
            variants: record.variants.clone(),
            is_treasure_hunt: record.is_treasure_hunt,
            is_super_treasure_hunt: record.is_super_treasure_hunt,
            personal_notes: record.personal_notes.clone(),
            created_at: now.format(TIMESTAMP_FORMAT).to_string(),
        });

        log::info!(
            "[STORE] Added {} / {} (master #{}{})",
            model_name,
            brand,
            master_id,
            if new_master { ", new" } else { "" }
        );
        Ok(AddOutcome {
            master_id,
            owned_id,
            new_master,
        })
    }

    /// 絞り込み済み一覧（新しい順）
    pub fn list(&self, filter: &GarageFilter) -> Vec<GarageItem<'_>> {
        let mut items: Vec<GarageItem<'_>> = self
            .data
            .owned
            .iter()
            .filter_map(|owned| {
                self.data
                    .masters
                    .iter()
                    .find(|m| m.id == owned.master_id)
                    .map(|master| GarageItem { owned, master })
            })
            .filter(|item| item.matches(filter))
            .collect();

        items.sort_by(|a, b| {
            b.owned
                .created_at
                .cmp(&a.owned.created_at)
                .then(b.owned.id.cmp(&a.owned.id))
        });
        items
    }

    /// 所有レコードに含まれるブランド一覧
    pub fn brands(&self) -> Vec<String> {
        let brands: BTreeSet<&str> = self
            .data
            .owned
            .iter()
            .filter_map(|owned| self.data.masters.iter().find(|m| m.id == owned.master_id))
            .map(|master| master.brand.as_str())
            .filter(|b| !b.is_empty())
            .collect();
        brands.into_iter().map(str::to_string).collect()
    }

    /// 統計（`today` 基準）
    pub fn stats(&self, today: NaiveDate) -> CollectionStats {
        let owned = &self.data.owned;
        let added_this_month = owned
            .iter()
            .filter_map(OwnedRecord::created_date)
            .filter(|d| d.year() == today.year() && d.month() == today.month())
            .count();
        let days_collecting = owned
            .iter()
            .filter_map(OwnedRecord::created_date)
            .min()
            .map(|first| (today - first).num_days().max(0))
            .unwrap_or(0);

        CollectionStats {
            total: owned.len(),
            treasure_hunts: owned
                .iter()
                .filter(|o| o.is_treasure_hunt || o.is_super_treasure_hunt)
                .count(),
            added_this_month,
            days_collecting,
        }
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map(|id| id + 1).unwrap_or(1)
}
