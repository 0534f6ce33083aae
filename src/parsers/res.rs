//! # SHELX .res 结构文件解析器
//!
//! 只读取判断结构质量所需的信息，不解析原子。
//!
//! ## .res 格式说明
//! ```text
//! TITL sample in P2(1)/c
//! CELL 0.71073 7.2218 8.5411 8.5902 107.658 91.868 90.941
//! ...
//! REM Reflections_all = 4335
//! REM R1_all = 0.0382
//! END
//! ```
//!
//! ## 依赖关系
//! - 被 `scxrd/processor.rs` 使用
//! - 使用 `models/cell.rs`

use crate::error::{Result, ScxrdError};
use crate::models::UnitCell;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// 可接受结构的最少反射数
pub const MIN_REFLECTIONS: u64 = 200;

/// 可接受结构的最大 R1
pub const MAX_R1: f64 = 0.3;

/// .res 文件摘要
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResSummary {
    pub title: Option<String>,
    pub wavelength: Option<f64>,
    pub cell: Option<UnitCell>,
    pub reflections_all: Option<u64>,
    pub r1_all: Option<f64>,
}

impl ResSummary {
    /// Reflections_all ≥ 200 且 R1_all ≤ 0.3
    pub fn passes_quality(&self) -> bool {
        match (self.reflections_all, self.r1_all) {
            (Some(reflections), Some(r1)) => reflections >= MIN_REFLECTIONS && r1 <= MAX_R1,
            _ => false,
        }
    }
}

fn rem_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^REM\s+(Reflections_all|R1_all)\s*=\s*([\d.]+)")
            .expect("valid REM pattern")
    })
}

/// 解析 .res 文件
pub fn parse_res_file(path: &Path) -> Result<ResSummary> {
    let bytes = fs::read(path).map_err(|e| ScxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_res_content(&String::from_utf8_lossy(&bytes)))
}

/// 从字符串内容解析
pub fn parse_res_content(content: &str) -> ResSummary {
    let mut summary = ResSummary::default();
    let rem = rem_regex();

    for line in content.lines() {
        let line = line.trim();
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_uppercase().as_str() {
            "TITL" => {
                summary.title = Some(parts[1..].join(" "));
            }
            "CELL" => {
                // CELL wavelength a b c alpha beta gamma
                if parts.len() >= 8 {
                    let values: Vec<f64> = parts[1..8].iter().filter_map(|p| p.parse().ok()).collect();
                    if values.len() == 7 {
                        summary.wavelength = Some(values[0]);
                        summary.cell = UnitCell::from_array(&values[1..]);
                    }
                }
            }
            "REM" => {
                let Some(caps) = rem.captures(line) else {
                    continue;
                };
                let key = caps[1].to_ascii_lowercase();
                let value = &caps[2];
                if key == "reflections_all" {
                    summary.reflections_all = value.parse().ok();
                } else {
                    summary.r1_all = value.parse().ok();
                }
            }
            "END" => break,
            _ => {}
        }
    }

    summary
}
