//! 解決結果の対話確認
//!
//! 一覧表示 → 番号で項目を編集 → 保存/破棄。

use crate::error::{DiecastError, Result};
use crate::resolver::Resolution;
use diecast_scan_common::{Condition, ResolvedRecord};
use dialoguer::{Confirm, Input, Select};

/// 編集可能な項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewField {
    ModelName,
    Brand,
    LaunchYear,
    Series,
    CollectionNumber,
    BaseColor,
    Variants,
    IdentifierCode,
    AcquisitionDate,
    PricePaid,
    Condition,
    TreasureHunt,
    SuperTreasureHunt,
    PersonalNotes,
}

impl ReviewField {
    pub const ALL: [ReviewField; 14] = [
        ReviewField::ModelName,
        ReviewField::Brand,
        ReviewField::LaunchYear,
        ReviewField::Series,
        ReviewField::CollectionNumber,
        ReviewField::BaseColor,
        ReviewField::Variants,
        ReviewField::IdentifierCode,
        ReviewField::AcquisitionDate,
        ReviewField::PricePaid,
        ReviewField::Condition,
        ReviewField::TreasureHunt,
        ReviewField::SuperTreasureHunt,
        ReviewField::PersonalNotes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReviewField::ModelName => "車名",
            ReviewField::Brand => "ブランド",
            ReviewField::LaunchYear => "発売年",
            ReviewField::Series => "シリーズ",
            ReviewField::CollectionNumber => "コレクション番号",
            ReviewField::BaseColor => "ボディカラー",
            ReviewField::Variants => "バリエーション",
            ReviewField::IdentifierCode => "識別コード",
            ReviewField::AcquisitionDate => "購入日",
            ReviewField::PricePaid => "購入価格",
            ReviewField::Condition => "状態",
            ReviewField::TreasureHunt => "TH",
            ReviewField::SuperTreasureHunt => "STH",
            ReviewField::PersonalNotes => "メモ",
        }
    }

    /// 表示用の現在値
    pub fn display(&self, record: &ResolvedRecord) -> String {
        match self {
            ReviewField::ModelName => record.model_name.clone(),
            ReviewField::Brand => record.brand.clone(),
            ReviewField::LaunchYear => record.launch_year.map(|y| y.to_string()).unwrap_or_default(),
            ReviewField::Series => record.series.clone(),
            ReviewField::CollectionNumber => record.collection_number.clone(),
            ReviewField::BaseColor => record.base_color.clone(),
            ReviewField::Variants => record.variants.clone(),
            ReviewField::IdentifierCode => record.identifier_code.clone(),
            ReviewField::AcquisitionDate => record.acquisition_date.clone(),
            ReviewField::PricePaid => record.price_paid.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            ReviewField::Condition => record.condition.label().to_string(),
            ReviewField::TreasureHunt => yes_no(record.is_treasure_hunt).to_string(),
            ReviewField::SuperTreasureHunt => yes_no(record.is_super_treasure_hunt).to_string(),
            ReviewField::PersonalNotes => record.personal_notes.clone(),
        }
    }

    /// 入力文字列を項目に反映
    pub fn apply(&self, record: &mut ResolvedRecord, input: &str) -> Result<()> {
        let value = input.trim();
        match self {
            ReviewField::ModelName => record.model_name = value.to_string(),
            ReviewField::Brand => record.brand = value.to_string(),
            ReviewField::LaunchYear => {
                record.launch_year = match value {
                    "" => None,
                    v => Some(v.parse().map_err(|_| invalid(self, v))?),
                }
            }
            ReviewField::Series => record.series = value.to_string(),
            ReviewField::CollectionNumber => record.collection_number = value.to_string(),
            ReviewField::BaseColor => record.base_color = value.to_string(),
            ReviewField::Variants => record.variants = value.to_string(),
            ReviewField::IdentifierCode => record.identifier_code = value.to_string(),
            ReviewField::AcquisitionDate => record.acquisition_date = value.to_string(),
            ReviewField::PricePaid => record.price_paid = parse_price(value)?,
            ReviewField::Condition => {
                record.condition = value.parse::<Condition>().map_err(DiecastError::Prompt)?
            }
            ReviewField::TreasureHunt => record.is_treasure_hunt = parse_flag(self, value)?,
            ReviewField::SuperTreasureHunt => record.is_super_treasure_hunt = parse_flag(self, value)?,
            ReviewField::PersonalNotes => record.personal_notes = value.to_string(),
        }
        Ok(())
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "はい"
    } else {
        "いいえ"
    }
}

fn invalid(field: &ReviewField, value: &str) -> DiecastError {
    DiecastError::Prompt(format!("{}の値が不正です: {}", field.label(), value))
}

fn parse_flag(field: &ReviewField, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "y" | "yes" | "true" | "はい" => Ok(true),
        "" | "n" | "no" | "false" | "いいえ" => Ok(false),
        _ => Err(invalid(field, value)),
    }
}

/// 価格（`12,50` のようなカンマ小数も受け付ける）
pub fn parse_price(value: &str) -> Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let price: f64 = value
        .replace(',', ".")
        .parse()
        .map_err(|_| invalid(&ReviewField::PricePaid, value))?;
    if price < 0.0 {
        return Err(invalid(&ReviewField::PricePaid, value));
    }
    Ok(Some(price))
}

/// 対話アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Save,
    Discard,
    Edit(ReviewField),
}

/// 操作入力を解釈（番号は1始まり）
pub fn parse_action(input: &str) -> Option<ReviewAction> {
    match input.trim() {
        "" | "y" | "Y" => Some(ReviewAction::Save),
        "q" | "Q" | "n" | "N" => Some(ReviewAction::Discard),
        n => n
            .parse::<usize>()
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| ReviewField::ALL.get(i).copied())
            .map(ReviewAction::Edit),
    }
}

/// レコードを番号付きで表示
pub fn print_record(record: &ResolvedRecord) {
    for (i, field) in ReviewField::ALL.iter().enumerate() {
        println!("  {:>2}. {:<14} {}", i + 1, field.label(), field.display(record));
    }
}

/// 解決結果を確認・編集する（破棄なら `None`）
pub fn review_resolution(resolution: &Resolution) -> Result<Option<ResolvedRecord>> {
    if !resolution.recognized {
        println!("⚠ 認識できませんでした。各項目を手入力してください");
    } else if resolution.catalog_match.is_some() {
        println!("✔ カタログと一致しました");
    }
    if !resolution.failed_images.is_empty() {
        println!("⚠ OCRに失敗した画像: {}枚", resolution.failed_images.len());
    }

    let mut record = resolution.record.clone();

    loop {
        println!();
        print_record(&record);
        println!("---");

        let input: String = Input::new()
            .with_prompt("番号で編集 (Enter:保存 q:破棄)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| DiecastError::Prompt(e.to_string()))?;

        match parse_action(&input) {
            Some(ReviewAction::Save) => return Ok(Some(record)),
            Some(ReviewAction::Discard) => return Ok(None),
            Some(ReviewAction::Edit(field)) => {
                if let Err(e) = prompt_field(&mut record, field) {
                    println!("  → {}", e);
                }
            }
            None => println!("  → 不明な操作です: {}", input.trim()),
        }
    }
}

fn prompt_field(record: &mut ResolvedRecord, field: ReviewField) -> Result<()> {
    match field {
        ReviewField::Condition => {
            let labels: Vec<&str> = Condition::ALL.iter().map(|c| c.label()).collect();
            let current = Condition::ALL
                .iter()
                .position(|c| *c == record.condition)
                .unwrap_or(0);
            let selected = Select::new()
                .with_prompt(field.label())
                .items(labels.as_slice())
                .default(current)
                .interact()
                .map_err(|e| DiecastError::Prompt(e.to_string()))?;
            record.condition = Condition::ALL[selected];
        }
        ReviewField::TreasureHunt | ReviewField::SuperTreasureHunt => {
            let current = match field {
                ReviewField::TreasureHunt => record.is_treasure_hunt,
                _ => record.is_super_treasure_hunt,
            };
            let flag = Confirm::new()
                .with_prompt(field.label())
                .default(current)
                .interact()
                .map_err(|e| DiecastError::Prompt(e.to_string()))?;
            field.apply(record, if flag { "yes" } else { "no" })?;
        }
        _ => {
            let input: String = Input::new()
                .with_prompt(field.label())
                .with_initial_text(field.display(record))
                .allow_empty(true)
                .interact_text()
                .map_err(|e| DiecastError::Prompt(e.to_string()))?;
            field.apply(record, &input)?;
        }
    }
    Ok(())
}
