//! Diecast Scan Common Library
//!
//! CLIと外部利用側で共有される型と抽出・照合ロジック

pub mod types;
pub mod rules;
pub mod extractor;
pub mod catalog;
pub mod merge;
pub mod error;

pub use types::{non_empty, CandidateFields, CatalogEntry, Condition, ProductInfo, RawYear, ResolvedRecord};
pub use rules::{CompiledRules, PatternRule, RuleTable};
pub use extractor::{extract_fields, extract_fields_with};
pub use catalog::{normalize_model_key, Catalog};
pub use merge::{is_recognized, merge_record};
pub use error::{Error, Result};
