//! 外部識別コード検索API
//!
//! `GET <endpoint>?upc=<code>` → `{"items": [...]}`。
//! `items` が空・欠落なら「見つからない」、通信・ステータス・JSONの異常は「失敗」。

use super::{IdentifierStage, StageOutcome};
use crate::config::Config;
use async_trait::async_trait;
use diecast_scan_common::ProductInfo;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    items: Option<Vec<LookupItem>>,
}

/// アイテムの各フィールドは型が揃わないことがあるため `Value` で受ける
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LookupItem {
    title: Value,
    brand: Value,
    attributes: Value,
    images: Value,
    description: Value,
}

/// 文字列・数値・真偽値のみ文字列化し、それ以外は空
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// 画像URL（配列なら先頭、文字列ならそのまま）
fn first_image(images: &Value) -> String {
    match images {
        Value::Array(items) => items.first().map(value_text).unwrap_or_default(),
        Value::String(url) => url.clone(),
        _ => String::new(),
    }
}

/// レスポンス本文をパース
///
/// 先頭アイテムを `ProductInfo` に変換。アイテムがなければ `Ok(None)`。
pub fn parse_lookup_response(code: &str, body: &str) -> Result<Option<ProductInfo>, serde_json::Error> {
    let response: LookupResponse = serde_json::from_str(body)?;
    let item = match response.items.and_then(|items| items.into_iter().next()) {
        Some(item) => item,
        None => return Ok(None),
    };

    Ok(Some(ProductInfo {
        upc: code.to_string(),
        name: value_text(&item.title),
        brand: value_text(&item.brand),
        year: value_text(&item.attributes["year"]),
        image_url: first_image(&item.images),
        description: value_text(&item.description),
    }))
}

pub struct RemoteLookupStage {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteLookupStage {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("[LOOKUP] Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.lookup_endpoint(), Duration::from_secs(config.timeout_seconds))
    }

    async fn fetch(&self, code: &str) -> Result<String, String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("upc", code)])
            .send()
            .await
            .map_err(|e| format!("リクエスト失敗: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        response
            .text()
            .await
            .map_err(|e| format!("レスポンス読み込み失敗: {}", e))
    }
}

#[async_trait]
impl IdentifierStage for RemoteLookupStage {
    fn name(&self) -> &str {
        "remote"
    }

    async fn lookup(&self, code: &str) -> StageOutcome {
        log::info!("[LOOKUP] Querying {} for {}", self.endpoint, code);

        let body = match self.fetch(code).await {
            Ok(body) => body,
            Err(message) => return StageOutcome::Failed(message),
        };

        match parse_lookup_response(code, &body) {
            Ok(Some(product)) => StageOutcome::Found(product),
            Ok(None) => StageOutcome::NotFound,
            Err(e) => StageOutcome::Failed(format!("JSON解析エラー: {}", e)),
        }
    }
}
