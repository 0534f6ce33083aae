//! # 化学式解析器
//!
//! 将化学式字符串解析为 元素 → 原子数 映射。
//!
//! ## 支持的写法
//! ```text
//! C2H6O          → C:2 H:6 O:1
//! C2 H6 O        → 空白被忽略
//! Ca(NO3)2       → 括号组整体乘以尾随倍数，可任意嵌套
//! CaCl2·2H2O     → 水合物分隔符 · • *，前导系数作用于整段
//! ```
//!
//! `parse` 永不失败，遇到无法识别的字符直接跳过；
//! `parse_strict` 对未知字符、括号不匹配返回错误。
//!
//! ## 依赖关系
//! - 被 `chemistry/comparison.rs`、`commands/formula.rs` 使用
//! - 使用 `error.rs`

use crate::error::{Result, ScxrdError};
use log::{debug, warn};
use std::collections::BTreeMap;

/// 元素符号 → 原子数
pub type ElementCountMap = BTreeMap<String, u64>;

/// 水合物 / 加合物分隔符
const SEPARATORS: [char; 3] = ['·', '•', '*'];

/// 括号倍数上限
const MAX_GROUP_MULTIPLIER: u64 = 1000;

/// 解析化学式（宽松模式），空白或无法解析的输入返回空映射
pub fn parse(formula: &str) -> ElementCountMap {
    parse_with_mode(formula, false).unwrap_or_default()
}

/// 严格模式：未知字符、括号不匹配、多余数字都报错
pub fn parse_strict(formula: &str) -> Result<ElementCountMap> {
    parse_with_mode(formula, true)
}

/// 先按严格模式解析，失败时记录警告并退回宽松模式；`None` 视为空白
pub fn parse_safely(formula: Option<&str>) -> ElementCountMap {
    let Some(formula) = formula else {
        return ElementCountMap::new();
    };

    match parse_strict(formula) {
        Ok(map) => map,
        Err(e) => {
            warn!("{}; falling back to tolerant parsing", e);
            parse(formula)
        }
    }
}

/// 至少包含一个元素
pub fn valid_formula(formula: &str) -> bool {
    !parse(formula).is_empty()
}

/// 按元素符号字母序格式化，如 `C2H6O`
pub fn format_counts(counts: &ElementCountMap) -> String {
    counts
        .iter()
        .map(|(el, n)| {
            if *n == 1 {
                el.clone()
            } else {
                format!("{}{}", el, n)
            }
        })
        .collect()
}

fn parse_with_mode(formula: &str, strict: bool) -> Result<ElementCountMap> {
    let mut total = ElementCountMap::new();
    let trimmed = formula.trim();
    if trimmed.is_empty() {
        return Ok(total);
    }

    for segment in trimmed.split(|c| SEPARATORS.contains(&c)) {
        let compact: String = segment.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            continue;
        }

        let counts = parse_segment(&compact, strict).map_err(|reason| ScxrdError::InvalidFormula {
            formula: formula.to_string(),
            reason,
        })?;
        merge_into(&mut total, counts, 1);
    }

    debug!("Parsed formula '{}' -> {:?}", formula, total);
    Ok(total)
}

/// 解析一段（不含分隔符、不含空白），处理前导系数
fn parse_segment(segment: &str, strict: bool) -> std::result::Result<ElementCountMap, String> {
    let chars: Vec<char> = segment.chars().collect();
    let mut pos = 0;

    let coefficient = read_number(&chars, &mut pos).unwrap_or(1);

    // 栈底是整段，每遇到 '(' 压入一层
    let mut stack: Vec<ElementCountMap> = vec![ElementCountMap::new()];

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_ascii_uppercase() {
            let mut symbol = c.to_string();
            pos += 1;
            if pos < chars.len() && chars[pos].is_ascii_lowercase() {
                symbol.push(chars[pos]);
                pos += 1;
            }
            let count = read_number(&chars, &mut pos).unwrap_or(1);
            if let Some(top) = stack.last_mut() {
                add_count(top, &symbol, count);
            }
        } else if c == '(' || c == '[' {
            stack.push(ElementCountMap::new());
            pos += 1;
        } else if c == ')' || c == ']' {
            pos += 1;
            let mut multiplier = read_number(&chars, &mut pos).unwrap_or(1);
            if multiplier > MAX_GROUP_MULTIPLIER {
                warn!(
                    "Large multiplier {} in formula '{}', clamped to {}",
                    multiplier, segment, MAX_GROUP_MULTIPLIER
                );
                multiplier = MAX_GROUP_MULTIPLIER;
            }

            if stack.len() < 2 {
                if strict {
                    return Err(format!("unmatched '{}' at position {}", c, pos - 1));
                }
                continue;
            }
            if let Some(group) = stack.pop() {
                if let Some(parent) = stack.last_mut() {
                    merge_into(parent, group, multiplier);
                }
            }
        } else if c.is_ascii_digit() {
            if strict {
                return Err(format!("unexpected number at position {}", pos));
            }
            // 宽松模式下丢弃孤立数字
            let _ = read_number(&chars, &mut pos);
        } else {
            if strict {
                return Err(format!("unexpected character '{}' at position {}", c, pos));
            }
            pos += 1;
        }
    }

    if stack.len() > 1 && strict {
        return Err("unclosed parenthesis".to_string());
    }

    // 宽松模式下未闭合的括号按倍数 1 并入
    while stack.len() > 1 {
        if let Some(group) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                merge_into(parent, group, 1);
            }
        }
    }

    let mut result = ElementCountMap::new();
    if let Some(base) = stack.pop() {
        merge_into(&mut result, base, coefficient);
    }
    Ok(result)
}

/// 读取连续数字，溢出时饱和
fn read_number(chars: &[char], pos: &mut usize) -> Option<u64> {
    let start = *pos;
    let mut value: u64 = 0;
    while *pos < chars.len() {
        match chars[*pos].to_digit(10) {
            Some(d) => {
                value = value.saturating_mul(10).saturating_add(d as u64);
                *pos += 1;
            }
            None => break,
        }
    }
    (*pos > start).then_some(value)
}

fn add_count(map: &mut ElementCountMap, symbol: &str, count: u64) {
    if count == 0 {
        return;
    }
    let entry = map.entry(symbol.to_string()).or_insert(0);
    *entry = entry.saturating_add(count);
}

fn merge_into(target: &mut ElementCountMap, source: ElementCountMap, multiplier: u64) {
    for (symbol, count) in source {
        add_count(target, &symbol, count.saturating_mul(multiplier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> ElementCountMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_simple_formula() {
        assert_eq!(parse("C2H6O"), counts(&[("C", 2), ("H", 6), ("O", 1)]));
        assert_eq!(parse("H2O"), counts(&[("H", 2), ("O", 1)]));
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(parse("C2 H6 O"), counts(&[("C", 2), ("H", 6), ("O", 1)]));
        assert_eq!(parse("  NaCl  "), counts(&[("Na", 1), ("Cl", 1)]));
    }

    #[test]
    fn test_parenthesized_groups() {
        assert_eq!(parse("Ca(NO3)2"), counts(&[("Ca", 1), ("N", 2), ("O", 6)]));
        assert_eq!(parse("Mg3(PO4)2"), counts(&[("Mg", 3), ("P", 2), ("O", 8)]));
    }

    #[test]
    fn test_nested_groups() {
        // K4[Fe(CN)6]
        assert_eq!(
            parse("K4[Fe(CN)6]"),
            counts(&[("K", 4), ("Fe", 1), ("C", 6), ("N", 6)])
        );
        assert_eq!(
            parse("((CH3)2N)2"),
            counts(&[("C", 4), ("H", 12), ("N", 2)])
        );
    }

    #[test]
    fn test_hydrates() {
        assert_eq!(
            parse("CaCl2·2H2O"),
            counts(&[("Ca", 1), ("Cl", 2), ("H", 4), ("O", 2)])
        );
        assert_eq!(
            parse("CuSO4•5H2O"),
            counts(&[("Cu", 1), ("S", 1), ("O", 9), ("H", 10)])
        );
        assert_eq!(
            parse("CaCl2*2H2O"),
            counts(&[("Ca", 1), ("Cl", 2), ("H", 4), ("O", 2)])
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
        assert!(parse_safely(None).is_empty());
    }

    #[test]
    fn test_multiplier_clamped() {
        let map = parse("(H)5000");
        assert_eq!(map.get("H"), Some(&1000));
    }

    #[test]
    fn test_tolerant_parsing_skips_garbage() {
        assert_eq!(parse("C2H6O!?"), counts(&[("C", 2), ("H", 6), ("O", 1)]));
        assert_eq!(parse("Ca(OH"), counts(&[("Ca", 1), ("O", 1), ("H", 1)]));
        assert_eq!(parse("NaCl)"), counts(&[("Na", 1), ("Cl", 1)]));
    }

    #[test]
    fn test_strict_parsing_rejects_garbage() {
        assert!(parse_strict("C2H6O!").is_err());
        assert!(parse_strict("Ca(OH").is_err());
        assert!(parse_strict("NaCl)").is_err());
        assert!(parse_strict("Ca(NO3)2").is_ok());
    }

    #[test]
    fn test_parse_safely_falls_back() {
        assert_eq!(
            parse_safely(Some("C2H6O#")),
            counts(&[("C", 2), ("H", 6), ("O", 1)])
        );
    }

    #[test]
    fn test_zero_count_dropped() {
        assert_eq!(parse("C2H0O"), counts(&[("C", 2), ("O", 1)]));
    }

    #[test]
    fn test_valid_formula() {
        assert!(valid_formula("C2H6O"));
        assert!(!valid_formula(""));
        assert!(!valid_formula("123"));
        assert!(!valid_formula("abc"));
    }

    #[test]
    fn test_format_counts() {
        assert_eq!(format_counts(&parse("Ca(NO3)2")), "CaN2O6");
    }
}
