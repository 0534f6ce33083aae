//! # datacoll.ini 解析器
//!
//! 读取 `[Date]` 段中的测量开始时间：
//! ```text
//! [Date]
//! Start time="Tue May 13 17:58:33 2025"
//! ```
//!
//! ## 依赖关系
//! - 被 `scxrd/processor.rs` 使用
//! - 使用 `chrono` 解析时间

use crate::error::{Result, ScxrdError};
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::fs;
use std::path::Path;

const DATE_SECTION: &str = "[Date]";
const START_TIME_KEY: &str = "Start time=";

/// 依次尝试的时间格式
const TIME_FORMATS: [&str; 3] = [
    "%a %b %e %H:%M:%S %Y",
    "%a %b %d %H:%M:%S %Y",
    "%Y-%m-%d %H:%M:%S",
];

/// 从文件解析
pub fn parse_datacoll_file(path: &Path) -> Result<Option<NaiveDateTime>> {
    let bytes = fs::read(path).map_err(|e| ScxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let measured = parse_datacoll_content(&String::from_utf8_lossy(&bytes));
    if measured.is_none() {
        warn!("No measurement start time in {}", path.display());
    }
    Ok(measured)
}

/// 从字符串内容解析 `[Date]` 段的第一个可解析的开始时间
pub fn parse_datacoll_content(content: &str) -> Option<NaiveDateTime> {
    let mut in_date_section = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_date_section = line == DATE_SECTION;
            continue;
        }
        if !in_date_section {
            continue;
        }

        if let Some(raw) = line.strip_prefix(START_TIME_KEY) {
            let value = raw.trim().trim_matches('"');
            match parse_start_time(value) {
                Some(time) => {
                    debug!("Parsed start time '{}' -> {}", value, time);
                    return Some(time);
                }
                None => warn!("Could not parse start time '{}'", value),
            }
        }
    }

    None
}

fn parse_start_time(value: &str) -> Option<NaiveDateTime> {
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
}
