//! 識別コード検索
//!
//! ローカルデータセット → 外部APIの順に問い合わせる段階的検索。
//! 各段は「見つかった/見つからない/失敗」を返し、最初に見つかった段で打ち切る。

mod remote;

pub use remote::{parse_lookup_response, RemoteLookupStage};

use crate::error::{DiecastError, Result};
use async_trait::async_trait;
use diecast_scan_common::{Catalog, ProductInfo};
use std::sync::Arc;

/// 1段分の検索結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Found(ProductInfo),
    NotFound,
    Failed(String),
}

/// 検索段
#[async_trait]
pub trait IdentifierStage: Send + Sync {
    fn name(&self) -> &str;
    async fn lookup(&self, code: &str) -> StageOutcome;
}

/// 最終結果（失敗は `Err(DiecastError::Lookup)`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found { product: ProductInfo, source: String },
    NotFound,
}

/// 同梱・指定カタログによるローカル検索（ネットワークを使わない）
pub struct LocalDatasetStage {
    catalog: Arc<Catalog>,
}

impl LocalDatasetStage {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl IdentifierStage for LocalDatasetStage {
    fn name(&self) -> &str {
        "local"
    }

    async fn lookup(&self, code: &str) -> StageOutcome {
        match self.catalog.find_by_identifier(code) {
            Some(entry) => StageOutcome::Found(ProductInfo::from(entry)),
            None => StageOutcome::NotFound,
        }
    }
}

/// 段階的検索
pub struct IdentifierResolver {
    stages: Vec<Box<dyn IdentifierStage>>,
}

impl IdentifierResolver {
    pub fn new(stages: Vec<Box<dyn IdentifierStage>>) -> Self {
        Self { stages }
    }

    /// ローカル → 外部API の標準構成
    pub fn standard(catalog: Arc<Catalog>, remote: RemoteLookupStage) -> Self {
        Self::new(vec![
            Box::new(LocalDatasetStage::new(catalog)),
            Box::new(remote),
        ])
    }

    /// 識別コードで検索
    ///
    /// どの段でも見つからず、いずれかの段が失敗していれば `Err`。
    /// 全段が「見つからない」を返した場合のみ `NotFound`。
    pub async fn resolve_by_identifier(&self, code: &str) -> Result<LookupOutcome> {
        let code = validate_code(code)?;
        let mut failures = Vec::new();

        for stage in &self.stages {
            match stage.lookup(code).await {
                StageOutcome::Found(mut product) => {
                    log::info!("[LOOKUP] {} found by {} stage", code, stage.name());
                    if product.upc.is_empty() {
                        product.upc = code.to_string();
                    }
                    return Ok(LookupOutcome::Found {
                        product,
                        source: stage.name().to_string(),
                    });
                }
                StageOutcome::NotFound => {
                    log::debug!("[LOOKUP] {} not found by {} stage", code, stage.name());
                }
                StageOutcome::Failed(message) => {
                    log::warn!("[LOOKUP] {} stage failed: {}", stage.name(), message);
                    failures.push(format!("{}: {}", stage.name(), message));
                }
            }
        }

        if failures.is_empty() {
            Ok(LookupOutcome::NotFound)
        } else {
            Err(DiecastError::Lookup(failures.join("; ")))
        }
    }
}

/// 空白を除いた数字のみのコードを受け付ける
fn validate_code(code: &str) -> Result<&str> {
    let code = code.trim();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(DiecastError::InvalidIdentifier(code.to_string()));
    }
    Ok(code)
}
