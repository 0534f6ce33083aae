//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `formula`: 分子式解析、比较与匹配
//! - `cell`: UB → 晶胞、惯用晶胞 / 原胞转换、G6 距离
//! - `peaks`: 峰表解码与指标化
//! - `folder`: 处理解压后的实验目录
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: formula, cell, peaks, folder

pub mod cell;
pub mod folder;
pub mod formula;
pub mod peaks;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// scxrdkit - 单晶衍射数据处理工具
#[derive(Parser)]
#[command(name = "scxrdkit")]
#[command(version)]
#[command(about = "Single-crystal diffraction data-processing toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (TOML); ./scxrdkit.toml is used when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the cell conversion / G6 distance API
    #[arg(long, global = true)]
    pub api_endpoint: Option<String>,

    /// API request timeout in seconds
    #[arg(long, global = true)]
    pub api_timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Parse, compare and match chemical formulas
    Formula(formula::FormulaArgs),

    /// Unit-cell tools: UB conversion, conventional/primitive cells, G6 distance
    Cell(cell::CellArgs),

    /// Decode binary peak tables and index reflections
    Peaks(peaks::PeaksArgs),

    /// Process an extracted diffraction experiment folder
    Folder(folder::FolderArgs),
}
