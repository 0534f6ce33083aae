//! # crystal.ini 解析器
//!
//! ## 格式说明
//! ```text
//! [Crystal]
//! reduced cell plus vol=7.2218583  8.5410638 8.5902173 107.6582105 91.8679754 90.9411566 504.4382028
//!
//! [Lattice]
//! constants plus vol=...
//! ```
//!
//! 首选 `reduced cell plus vol=` 行（多行时最后一个有效行生效）；
//! 都不可用时退回 `[Lattice]` 段中的 `constants plus vol` 行。
//! 至少 6 个数，第 7 个数（体积）可选。
//!
//! ## 依赖关系
//! - 被 `scxrd/processor.rs` 使用
//! - 使用 `models/cell.rs`

use crate::error::{Result, ScxrdError};
use crate::models::UnitCell;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

const REDUCED_CELL_PREFIX: &str = "reduced cell plus vol=";
const LATTICE_CONSTANTS_PREFIX: &str = "constants plus vol";
const LATTICE_SECTION: &str = "[Lattice]";

/// 从文件解析；读取失败返回 `Err`，没有可用晶胞返回 `Ok(None)`
pub fn parse_crystal_ini_file(path: &Path) -> Result<Option<UnitCell>> {
    let bytes = fs::read(path).map_err(|e| ScxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    debug!("Read crystal.ini {} ({} bytes)", path.display(), bytes.len());

    let cell = parse_crystal_ini_content(&content);
    match &cell {
        Some(cell) => info!("Parsed cell from {}: {}", path.display(), cell),
        None => warn!("No usable cell parameters in {}", path.display()),
    }
    Ok(cell)
}

/// 从字符串内容解析
pub fn parse_crystal_ini_content(content: &str) -> Option<UnitCell> {
    let mut reduced: Option<UnitCell> = None;
    let mut lattice: Option<UnitCell> = None;
    let mut in_lattice_section = false;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();

        if line.starts_with(REDUCED_CELL_PREFIX) {
            match parse_cell_line(line) {
                Some(cell) => reduced = Some(cell),
                None => warn!("Malformed reduced cell line at line {}: '{}'", index + 1, line),
            }
        }

        if line.starts_with('[') {
            in_lattice_section = line == LATTICE_SECTION;
            continue;
        }

        if in_lattice_section && line.starts_with(LATTICE_CONSTANTS_PREFIX) {
            match parse_cell_line(line) {
                Some(cell) => lattice = Some(cell),
                None => warn!("Malformed lattice constants at line {}: '{}'", index + 1, line),
            }
        }
    }

    if reduced.is_none() && lattice.is_some() {
        info!("Using [Lattice] constants as fallback cell");
    }
    reduced.or(lattice)
}

/// `<prefix>=a b c alpha beta gamma [volume]`
fn parse_cell_line(line: &str) -> Option<UnitCell> {
    let (_, values) = line.split_once('=')?;
    let numbers: Vec<f64> = values
        .split_whitespace()
        .map_while(|token| token.parse::<f64>().ok())
        .collect();

    if numbers.len() < 6 {
        return None;
    }

    let (a, b, c) = (numbers[0], numbers[1], numbers[2]);
    let (alpha, beta, gamma) = (numbers[3], numbers[4], numbers[5]);
    match numbers.get(6) {
        Some(volume) => UnitCell::with_volume(a, b, c, alpha, beta, gamma, *volume),
        None => UnitCell::new(a, b, c, alpha, beta, gamma),
    }
}
