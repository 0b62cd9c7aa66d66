//! OCRテキストからの候補値抽出
//!
//! 各ヒューリスティックは独立して動作し、どれかが失敗しても他は継続する。
//! 複数の一致がある場合は常に読み順で最初のものを採用する。

use crate::rules::CompiledRules;
use crate::types::{non_empty, CandidateFields};
use regex::Regex;

/// 組み込みルールで候補値を抽出
pub fn extract_fields(raw_text: &str) -> CandidateFields {
    extract_fields_with(raw_text, CompiledRules::builtin())
}

/// 指定ルールで候補値を抽出
pub fn extract_fields_with(raw_text: &str, rules: &CompiledRules) -> CandidateFields {
    let normalized = raw_text.to_uppercase();
    let lines = normalized_lines(&normalized);

    CandidateFields {
        model_name: find_model_name(&lines, rules),
        series: find_series(&lines, rules),
        collection_number: find_collection_number(&normalized, rules),
        identifier_code: find_identifier_code(&normalized, rules),
    }
}

/// トリム済みの空でない行
fn normalized_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// 車名候補: パターンに一致し、除外ルールに当たらない最初の行
pub fn find_model_name(lines: &[&str], rules: &CompiledRules) -> Option<String> {
    lines
        .iter()
        .find(|line| rules.matches_model_name(line) && rules.exclusion_for(line).is_none())
        .and_then(|line| non_empty(line))
}

/// シリーズ候補: いずれかのシリーズルールに一致する最初の行
pub fn find_series(lines: &[&str], rules: &CompiledRules) -> Option<String> {
    lines
        .iter()
        .find(|line| rules.series_rule_for(line).is_some())
        .and_then(|line| non_empty(line))
}

/// コレクション番号: 区切りを `/` に統一し空白を除去
pub fn find_collection_number(text: &str, rules: &CompiledRules) -> Option<String> {
    first_isolated_match(rules.collection_number(), text).and_then(|m| {
        let compact: String = m
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '\\' { '/' } else { c })
            .collect();
        non_empty(&compact)
    })
}

/// 識別コード: 12〜13桁の連続した数字
///
/// 14桁以上の数字列では先頭13桁を採用する（OCRで余分な数字が付いたUPC）。
pub fn find_identifier_code(text: &str, rules: &CompiledRules) -> Option<String> {
    rules
        .identifier_code()
        .find(text)
        .and_then(|m| non_empty(m.as_str()))
}

/// 前後が数字に接していない最初の一致
///
/// `12/2023` の先頭 `12/202` のような部分一致を防ぐ。
fn first_isolated_match<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.find_iter(text)
        .find(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
        })
        .map(|m| m.as_str())
}
