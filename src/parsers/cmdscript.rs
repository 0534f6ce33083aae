//! # cmdscript.mac 解析器
//!
//! 提取测角头移动命令中的实际台面坐标：
//! ```text
//! xx xtalcheck move x 48.25 y 1.33 z 0.08
//! ```
//!
//! ## 依赖关系
//! - 被 `scxrd/processor.rs` 使用
//! - 使用 `regex`

use crate::error::{Result, ScxrdError};
use log::{debug, info};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// 台面坐标 (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageCoordinates {
    pub x_mm: f64,
    pub y_mm: f64,
    pub z_mm: f64,
}

fn move_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let num = r"([-+]?(?:\d+\.?\d*|\.\d+))";
        Regex::new(&format!(
            r"(?i)\bmove\s+x\s+{num}\s+y\s+{num}\s+z\s+{num}(?:\s|$)"
        ))
        .expect("valid move pattern")
    })
}

/// 从文件解析
pub fn parse_cmdscript_file(path: &Path) -> Result<Option<StageCoordinates>> {
    let bytes = fs::read(path).map_err(|e| ScxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let coords = parse_cmdscript_content(&String::from_utf8_lossy(&bytes));
    match &coords {
        Some(c) => info!(
            "Stage coordinates from {}: x={} y={} z={}",
            path.display(),
            c.x_mm,
            c.y_mm,
            c.z_mm
        ),
        None => debug!("No move command in {}", path.display()),
    }
    Ok(coords)
}

/// 第一条匹配的 move 行
pub fn parse_cmdscript_content(content: &str) -> Option<StageCoordinates> {
    let re = move_regex();

    content.lines().find_map(|line| {
        let caps = re.captures(line.trim())?;
        Some(StageCoordinates {
            x_mm: caps.get(1)?.as_str().parse().ok()?,
            y_mm: caps.get(2)?.as_str().parse().ok()?,
            z_mm: caps.get(3)?.as_str().parse().ok()?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_line() {
        let coords = parse_cmdscript_content("xx xtalcheck move x 48.25 y 1.33 z 0.08\n").unwrap();
        assert_eq!(coords.x_mm, 48.25);
        assert_eq!(coords.y_mm, 1.33);
        assert_eq!(coords.z_mm, 0.08);
    }

    #[test]
    fn test_negative_values() {
        let coords = parse_cmdscript_content("xx xtalcheck move x -12.75 y 45.2 z -3.14\n").unwrap();
        assert_eq!(coords.x_mm, -12.75);
        assert_eq!(coords.y_mm, 45.2);
        assert_eq!(coords.z_mm, -3.14);
    }

    #[test]
    fn test_first_match_among_other_lines() {
        let content = "xx something else\nXX XTALCHECK MOVE X 1 Y 2 Z 3\nxx xtalcheck move x 9 y 9 z 9\n";
        let coords = parse_cmdscript_content(content).unwrap();
        assert_eq!(coords.x_mm, 1.0);
        assert_eq!(coords.z_mm, 3.0);
    }

    #[test]
    fn test_malformed_file() {
        assert!(parse_cmdscript_content("invalid format line\n").is_none());
        assert!(parse_cmdscript_content("xx xtalcheck move x 1 y 2\n").is_none());
        assert!(parse_cmdscript_content("").is_none());
    }
}
