//! # .par 文件晶胞解析器
//!
//! ## 格式说明
//! ```text
//! CELL INFORMATION
//! 10.123(0.001) 11.456(0.002) 12.789(0.003)
//! 90.000(0.100) 95.123(0.200) 100.456(0.300)
//! ```
//!
//! 括号中的不确定度在解析前去掉。没有 `CELL INFORMATION` 标题时，
//! 取第一对相邻的“恰好三个带不确定度数值”的行。
//!
//! ## 依赖关系
//! - 被 `scxrd/processor.rs` 使用
//! - 使用 `regex` 去除不确定度

use crate::error::{Result, ScxrdError};
use crate::models::UnitCell;
use log::{debug, warn};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

const CELL_HEADER: &str = "CELL INFORMATION";

fn uncertainty_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)").expect("valid uncertainty pattern"))
}

/// 从文件解析
pub fn parse_par_file(path: &Path) -> Result<Option<UnitCell>> {
    let bytes = fs::read(path).map_err(|e| ScxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let cell = parse_par_content(&String::from_utf8_lossy(&bytes));
    if cell.is_none() {
        debug!("No cell block in {}", path.display());
    }
    Ok(cell)
}

/// 从字符串内容解析
pub fn parse_par_content(content: &str) -> Option<UnitCell> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();

    if let Some(header) = lines.iter().position(|l| l.eq_ignore_ascii_case(CELL_HEADER)) {
        let mut rows = lines[header + 1..]
            .iter()
            .filter(|l| !l.is_empty())
            .take(2)
            .filter_map(|l| parse_triplet(l, false));

        if let (Some(lengths), Some(angles)) = (rows.next(), rows.next()) {
            return build_cell(lengths, angles);
        }
        warn!("CELL INFORMATION block without two rows of three numbers");
    }

    // 无标题：相邻两行都是三个带不确定度的数
    lines.windows(2).find_map(|pair| {
        let lengths = parse_triplet(pair[0], true)?;
        let angles = parse_triplet(pair[1], true)?;
        build_cell(lengths, angles)
    })
}

/// 解析一行中恰好三个数；`require_uncertainty` 时每个数都必须带括号
fn parse_triplet(line: &str, require_uncertainty: bool) -> Option<[f64; 3]> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        return None;
    }
    if require_uncertainty && !tokens.iter().all(|t| t.contains('(') && t.ends_with(')')) {
        return None;
    }

    let re = uncertainty_regex();
    let mut values = [0.0; 3];
    for (slot, token) in values.iter_mut().zip(tokens) {
        *slot = re.replace_all(token, "").parse().ok()?;
    }
    Some(values)
}

fn build_cell(lengths: [f64; 3], angles: [f64; 3]) -> Option<UnitCell> {
    UnitCell::new(lengths[0], lengths[1], lengths[2], angles[0], angles[1], angles[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAR: &str = "CELL INFORMATION\n10.123(0.001) 11.456(0.002) 12.789(0.003)\n90.000(0.100) 95.123(0.200) 100.456(0.300)\n";

    #[test]
    fn test_cell_information_block() {
        let cell = parse_par_content(PAR).unwrap();
        assert_eq!(cell.a, 10.123);
        assert_eq!(cell.b, 11.456);
        assert_eq!(cell.c, 12.789);
        assert_eq!(cell.alpha, 90.0);
        assert_eq!(cell.beta, 95.123);
        assert_eq!(cell.gamma, 100.456);
    }

    #[test]
    fn test_headerless_block() {
        let content = "SOME HEADER\n1 2\n10.123(0.001) 11.456(0.002) 12.789(0.003)\n90.000(0.100) 95.123(0.200) 100.456(0.300)\nEND\n";
        let cell = parse_par_content(content).unwrap();
        assert_eq!(cell.c, 12.789);
    }

    #[test]
    fn test_headerless_requires_uncertainties() {
        let content = "10.1 11.4 12.7\n90 95 100\n";
        assert!(parse_par_content(content).is_none());
    }

    #[test]
    fn test_header_without_numbers() {
        let content = "CELL INFORMATION\nnot a cell\n";
        assert!(parse_par_content(content).is_none());
    }

    #[test]
    fn test_empty_content() {
        assert!(parse_par_content("").is_none());
    }
}
