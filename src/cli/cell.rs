//! # cell 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/cell.rs`

use clap::{Args, Subcommand, ValueEnum};
use scxrdkit::lattice::{CU_KALPHA_WAVELENGTH, MO_KALPHA_WAVELENGTH};
use scxrdkit::models::CellParams;
use std::path::PathBuf;

/// cell 主命令参数
#[derive(Args, Debug)]
pub struct CellArgs {
    #[command(subcommand)]
    pub command: CellCommands,
}

/// cell 子命令
#[derive(Subcommand, Debug)]
pub enum CellCommands {
    /// Convert a 3x3 UB matrix (row-major, 9 values) to cell parameters
    FromUb {
        /// Nine comma-separated matrix entries
        #[arg(value_delimiter = ',', allow_hyphen_values = true, required = true)]
        ub: Vec<f64>,

        /// Wavelength: radiation source name (mo-ka, cu-ka, ...) or value in Å
        #[arg(short, long)]
        wavelength: Option<String>,
    },

    /// Convert a primitive cell to conventional (Bravais) cells via the API
    Conventional {
        /// Cell as "a,b,c,alpha,beta,gamma"
        #[arg(value_parser = parse_cell_values, allow_hyphen_values = true)]
        cell: CellParams,

        /// Le Page maximum delta (default from settings)
        #[arg(long)]
        max_delta: Option<f64>,

        /// Which candidate(s) to show
        #[arg(long, value_enum, default_value = "best")]
        select: ConventionalSelect,
    },

    /// Convert a cell to its primitive form via the API
    Primitive {
        /// Cell as "a,b,c,alpha,beta,gamma"
        #[arg(value_parser = parse_cell_values, allow_hyphen_values = true)]
        cell: CellParams,
    },

    /// G6 distance from a reference cell to one or more cells
    Distance {
        /// Reference cell as "a,b,c,alpha,beta,gamma"
        #[arg(value_parser = parse_cell_values, allow_hyphen_values = true)]
        reference: CellParams,

        /// Cells to compare against (repeatable)
        #[arg(long = "against", value_parser = parse_cell_values, required = true, allow_hyphen_values = true)]
        against: Vec<CellParams>,
    },

    /// Find similar datasets in a JSON list of {id, primitive_cell}
    Similar(SimilarArgs),
}

/// 惯用晶胞候选的选取方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ConventionalSelect {
    /// Lowest-distance candidate (first)
    Best,
    /// Candidate equivalent to the input cell (last)
    AsInput,
    /// Every candidate
    All,
}

/// cell similar 参数
#[derive(Args, Debug)]
pub struct SimilarArgs {
    /// JSON file with an array of datasets
    pub datasets: PathBuf,

    /// Compare only this dataset against the others
    #[arg(long)]
    pub target: Option<u64>,

    /// Maximum G6 distance (default from settings)
    #[arg(short, long)]
    pub tolerance: Option<f64>,
}

/// 预定义辐射源波长 (Å)
pub fn get_predefined_wavelength(name: &str) -> Option<f64> {
    match name.to_lowercase().as_str() {
        "cu-ka" | "cuka" => Some(CU_KALPHA_WAVELENGTH),
        "cu-ka1" | "cuka1" => Some(1.5406),
        "mo-ka" | "moka" => Some(MO_KALPHA_WAVELENGTH),
        "mo-ka1" | "moka1" => Some(0.7093),
        "ag-ka" | "agka" => Some(0.5609),
        "ga-ka" | "gaka" => Some(1.3414),
        _ => None,
    }
}

/// 解析波长输入（辐射源名称或数值）
pub fn parse_wavelength(input: &str) -> Result<f64, String> {
    if let Some(wl) = get_predefined_wavelength(input) {
        return Ok(wl);
    }
    input.parse::<f64>().map_err(|_| {
        format!(
            "Invalid wavelength '{}'. Use a number (e.g., 0.71073) or a name: mo-ka, cu-ka, ag-ka, ga-ka",
            input
        )
    })
}

/// 解析 "a,b,c,alpha,beta,gamma"（逗号或空白分隔）
pub fn parse_cell_values(input: &str) -> Result<CellParams, String> {
    let values: Vec<f64> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", s))
        })
        .collect::<Result<_, _>>()?;

    match values.as_slice() {
        [a, b, c, alpha, beta, gamma] => Ok(CellParams::new(*a, *b, *c, *alpha, *beta, *gamma)),
        _ => Err(format!(
            "Expected 6 values (a,b,c,alpha,beta,gamma), got {}",
            values.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wavelength() {
        assert_eq!(parse_wavelength("Mo-Ka").unwrap(), 0.71073);
        assert_eq!(parse_wavelength("cuka").unwrap(), 1.5418);
        assert_eq!(parse_wavelength("0.5").unwrap(), 0.5);
        assert!(parse_wavelength("xx").is_err());
    }

    #[test]
    fn test_parse_cell_values() {
        let cell = parse_cell_values("10, 11 12,90,95.5,100").unwrap();
        assert_eq!(cell.a, Some(10.0));
        assert_eq!(cell.beta, Some(95.5));
        assert!(parse_cell_values("1,2,3").is_err());
        assert!(parse_cell_values("1,2,3,a,5,6").is_err());
    }
}
