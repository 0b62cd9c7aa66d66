//! 解決パイプライン
//!
//! OCR → 候補値抽出 → カタログ照合 → マージ の順に実行し、
//! 呼び出しごとに新しい `Resolution` を返す。どの段階の失敗も全体を止めない。

use crate::ocr::{ImageSource, OcrEngine};
use diecast_scan_common::{
    extract_fields_with, is_recognized, merge_record, CandidateFields, Catalog, CatalogEntry,
    CompiledRules, ResolvedRecord,
};
use serde::Serialize;
use std::sync::Arc;

/// OCRに失敗した画像
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedImage {
    pub index: usize,
    pub label: String,
    pub error: String,
}

/// 1回の解決結果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub record: ResolvedRecord,
    pub recognized: bool,
    pub candidates: CandidateFields,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_match: Option<CatalogEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_images: Vec<FailedImage>,
}

/// 解決1回分の途中状態（呼び出し内に閉じる）
#[derive(Default)]
struct ResolutionContext {
    texts: Vec<String>,
    failed_images: Vec<FailedImage>,
    raw_text: String,
    candidates: CandidateFields,
    catalog_match: Option<CatalogEntry>,
}

impl ResolutionContext {
    fn push_text(&mut self, text: String) {
        self.texts.push(text);
    }

    fn push_failure(&mut self, index: usize, image: &ImageSource, error: String) {
        self.failed_images.push(FailedImage {
            index,
            label: image.label().to_string(),
            error,
        });
    }

    fn extract(&mut self, rules: &CompiledRules) {
        self.raw_text = self.texts.join("\n");
        self.candidates = extract_fields_with(&self.raw_text, rules);
    }

    fn match_catalog(&mut self, catalog: &Catalog) {
        self.catalog_match = catalog
            .match_catalog(
                self.candidates.model_name.as_deref(),
                self.candidates.identifier_code.as_deref(),
            )
            .cloned();
    }

    fn finish(self) -> Resolution {
        let record = merge_record(self.catalog_match.as_ref(), &self.candidates);
        let recognized = is_recognized(&self.candidates, self.catalog_match.as_ref());
        Resolution {
            record,
            recognized,
            candidates: self.candidates,
            raw_text: self.raw_text,
            catalog_match: self.catalog_match,
            failed_images: self.failed_images,
        }
    }
}

pub struct Resolver {
    ocr: Arc<dyn OcrEngine>,
    catalog: Arc<Catalog>,
    rules: Arc<CompiledRules>,
    language: String,
}

impl Resolver {
    pub fn new(
        ocr: Arc<dyn OcrEngine>,
        catalog: Arc<Catalog>,
        rules: Arc<CompiledRules>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            ocr,
            catalog,
            rules,
            language: language.into(),
        }
    }

    /// 画像群からレコードを解決
    ///
    /// 画像が空なら OCR もカタログも呼ばずに既定レコードを返す。
    pub async fn resolve(&self, images: &[ImageSource]) -> Resolution {
        if images.is_empty() {
            log::debug!("[RESOLVE] No images supplied");
            return Resolution::default();
        }

        let mut ctx = ResolutionContext::default();

        let futures = images
            .iter()
            .map(|image| self.ocr.extract_text(image, &self.language));
        let outputs = futures::future::join_all(futures).await;

        for (index, (image, output)) in images.iter().zip(outputs).enumerate() {
            match output {
                Ok(text) => {
                    log::debug!("[RESOLVE] {}: {} chars", image.label(), text.len());
                    ctx.push_text(text);
                }
                Err(e) => {
                    log::warn!("[RESOLVE] OCR failed for {}: {}", image.label(), e);
                    ctx.push_failure(index, image, e.to_string());
                }
            }
        }

        ctx.extract(&self.rules);
        ctx.match_catalog(&self.catalog);

        let resolution = ctx.finish();
        log::info!(
            "[RESOLVE] recognized={} model={:?} catalog_hit={}",
            resolution.recognized,
            resolution.candidates.model_name,
            resolution.catalog_match.is_some()
        );
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diecast_scan_common::RuleTable;

    #[test]
    fn test_context_joins_in_push_order() {
        let mut ctx = ResolutionContext::default();
        ctx.push_text("TWIN MILL".into());
        ctx.push_text("HW ART CARS".into());
        ctx.extract(&RuleTable::builtin().compile().unwrap());
        assert_eq!(ctx.raw_text, "TWIN MILL\nHW ART CARS");
        assert_eq!(ctx.candidates.model_name.as_deref(), Some("TWIN MILL"));
    }

    #[test]
    fn test_context_without_text_is_unrecognized() {
        let mut ctx = ResolutionContext::default();
        ctx.extract(CompiledRules::builtin());
        ctx.match_catalog(Catalog::bundled());
        let resolution = ctx.finish();
        assert!(!resolution.recognized);
        assert_eq!(resolution.record, ResolvedRecord::default());
    }
}
