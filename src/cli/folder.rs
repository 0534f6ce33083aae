//! # folder 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/folder.rs`

use clap::Args;
use std::path::PathBuf;

/// folder 子命令参数
#[derive(Args, Debug)]
pub struct FolderArgs {
    /// Extracted experiment directory
    pub dir: PathBuf,

    /// Stage x (mm); overrides the value from cmdscript.mac
    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<String>,

    /// Stage y (mm)
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<String>,

    /// Stage z (mm)
    #[arg(long, allow_hyphen_values = true)]
    pub z: Option<String>,

    /// Well image size in pixels as WIDTHxHEIGHT; prints the image reference point
    #[arg(long, value_parser = parse_image_size)]
    pub well_image: Option<(u32, u32)>,

    /// Well image pixel size in mm
    #[arg(long)]
    pub pixel_size: Option<f64>,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Maximum directory depth (default from settings)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Maximum number of entries to visit (default from settings)
    #[arg(long)]
    pub max_files: Option<usize>,
}

/// 解析 "1000x800"
pub fn parse_image_size(input: &str) -> Result<(u32, u32), String> {
    let (w, h) = input
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got '{}'", input))?;
    let w = w.trim().parse::<u32>().map_err(|_| format!("Invalid width '{}'", w))?;
    let h = h.trim().parse::<u32>().map_err(|_| format!("Invalid height '{}'", h))?;
    Ok((w, h))
}
