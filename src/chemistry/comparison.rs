//! # 化学式容差比较
//!
//! ## 容差规则
//! 每个元素的原子数差值允许 `max(ceil(max(n1, n2) × pct / 100), 1)`，
//! 即至少 ±1，较大计数时按百分比放宽。某个元素只在一侧出现时另一侧视为 0。
//!
//! ## 依赖关系
//! - 被 `commands/formula.rs` 使用
//! - 使用 `chemistry/formula.rs`

use super::formula::{parse_safely, ElementCountMap};
use serde::Serialize;
use std::collections::BTreeSet;

/// 默认百分比容差
pub const DEFAULT_TOLERANCE_PERCENT: f64 = 10.0;

/// 候选化学式的匹配结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaMatch {
    pub formula: String,
    pub is_exact_match: bool,
    pub similarity_score: f64,
}

/// 两个化学式是否在容差内匹配；空白或无法解析的输入不匹配
pub fn formulas_match(formula1: &str, formula2: &str, tolerance_percent: f64) -> bool {
    if formula1.trim().is_empty() || formula2.trim().is_empty() {
        return false;
    }

    let elements1 = parse_safely(Some(formula1));
    let elements2 = parse_safely(Some(formula2));
    if elements1.is_empty() || elements2.is_empty() {
        return false;
    }

    compare_parsed_formulas(&elements1, &elements2, tolerance_percent)
}

/// 比较已解析的映射：并集中每个元素都需满足容差
pub fn compare_parsed_formulas(
    elements1: &ElementCountMap,
    elements2: &ElementCountMap,
    tolerance_percent: f64,
) -> bool {
    element_union(elements1, elements2).into_iter().all(|el| {
        let n1 = elements1.get(el).copied().unwrap_or(0);
        let n2 = elements2.get(el).copied().unwrap_or(0);
        counts_within_tolerance(n1, n2, tolerance_percent)
    })
}

/// 单个原子数是否在容差内
pub fn counts_within_tolerance(count1: u64, count2: u64, tolerance_percent: f64) -> bool {
    let max_count = count1.max(count2);
    if max_count == 0 {
        return true;
    }

    let diff = count1.abs_diff(count2) as f64;
    let percent = (max_count as f64 * tolerance_percent / 100.0).ceil();
    let allowed = percent.max(1.0);

    diff <= allowed
}

/// 相似度 0.0 ~ 1.0；空白或无法解析的输入为 0.0
pub fn formula_similarity_score(formula1: &str, formula2: &str) -> f64 {
    if formula1.trim().is_empty() || formula2.trim().is_empty() {
        return 0.0;
    }

    let elements1 = parse_safely(Some(formula1));
    let elements2 = parse_safely(Some(formula2));
    if elements1.is_empty() || elements2.is_empty() {
        return 0.0;
    }

    similarity_of_maps(&elements1, &elements2)
}

/// 按原子数加权的逐元素相似度均值
pub fn similarity_of_maps(elements1: &ElementCountMap, elements2: &ElementCountMap) -> f64 {
    let mut total_similarity = 0.0;
    let mut total_weight = 0.0;

    for el in element_union(elements1, elements2) {
        let n1 = elements1.get(el).copied().unwrap_or(0);
        let n2 = elements2.get(el).copied().unwrap_or(0);

        let weight = n1.max(n2);
        if weight == 0 {
            continue;
        }

        let element_similarity = (1.0 - n1.abs_diff(n2) as f64 / weight as f64).max(0.0);
        total_similarity += element_similarity * weight as f64;
        total_weight += weight as f64;
    }

    if total_weight == 0.0 {
        return 1.0;
    }
    (total_similarity / total_weight).clamp(0.0, 1.0)
}

/// 从候选中挑出匹配目标的化学式，按相似度降序，同分时精确匹配优先
pub fn find_matching_formulas<S: AsRef<str>>(
    target: &str,
    candidates: &[S],
    tolerance_percent: Option<f64>,
) -> Vec<FormulaMatch> {
    let tolerance = tolerance_percent.unwrap_or(DEFAULT_TOLERANCE_PERCENT);

    if target.trim().is_empty() || candidates.is_empty() {
        return Vec::new();
    }
    let target_elements = parse_safely(Some(target));
    if target_elements.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<FormulaMatch> = candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|c| !c.trim().is_empty())
        .filter_map(|candidate| {
            let elements = parse_safely(Some(candidate));
            if elements.is_empty()
                || !compare_parsed_formulas(&target_elements, &elements, tolerance)
            {
                return None;
            }

            let score = similarity_of_maps(&target_elements, &elements);
            Some(FormulaMatch {
                formula: candidate.to_string(),
                is_exact_match: score == 1.0,
                similarity_score: score,
            })
        })
        .collect();

    // sort_by 是稳定排序
    matches.sort_by(|a, b| {
        b.similarity_score
            .total_cmp(&a.similarity_score)
            .then_with(|| b.is_exact_match.cmp(&a.is_exact_match))
    });

    matches
}

fn element_union<'a>(a: &'a ElementCountMap, b: &'a ElementCountMap) -> BTreeSet<&'a str> {
    a.keys().chain(b.keys()).map(String::as_str).collect()
}
