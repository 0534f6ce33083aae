//! # 化学模块
//!
//! 化学式解析与容差比较，用于把化合物库中的候选与目标化学式配对。
//!
//! ## 依赖关系
//! - 被 `commands/formula.rs` 使用
//! - 子模块: formula, comparison

pub mod comparison;
pub mod formula;

pub use comparison::{
    compare_parsed_formulas, counts_within_tolerance, find_matching_formulas,
    formula_similarity_score, formulas_match, FormulaMatch, DEFAULT_TOLERANCE_PERCENT,
};
pub use formula::{parse, parse_safely, parse_strict, valid_formula, ElementCountMap};
