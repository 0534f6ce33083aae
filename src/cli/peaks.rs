//! # peaks 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/peaks.rs`

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

/// peaks 主命令参数
#[derive(Args, Debug)]
pub struct PeaksArgs {
    #[command(subcommand)]
    pub command: PeaksCommands,
}

/// peaks 子命令
#[derive(Subcommand, Debug)]
pub enum PeaksCommands {
    /// Decode a peak table file, or every table in a directory
    Decode(DecodeArgs),

    /// Index reflections of a peak table with a UB matrix
    Index(IndexArgs),
}

/// peaks decode 参数
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input: .tabbin file or directory
    pub input: PathBuf,

    /// Export decoded points (single file) or the summary (batch) to CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for input files (batch mode)
    #[arg(long, default_value = "*.tabbin")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,
}

/// 散点图投影平面
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ProjectionArg {
    #[default]
    Xy,
    Xz,
    Yz,
}

/// peaks index 参数
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Input .tabbin file
    pub input: PathBuf,

    /// UB matrix, nine comma-separated row-major entries
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub ub: Vec<f64>,

    /// Maximum distance from integer hkl (default from settings)
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Export indexed spots to CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Render the reflection cloud (PNG, or SVG by extension)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Projection plane for --plot
    #[arg(long, value_enum, default_value = "xy")]
    pub projection: ProjectionArg,

    /// Figure width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 1000)]
    pub height: u32,
}
