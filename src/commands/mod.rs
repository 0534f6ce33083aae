//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/` 以及库中的 `chemistry/`、`lattice/`、`parsers/`、`scxrd/`、`api/`
//! - 子模块: formula, cell, peaks, folder

pub mod cell;
pub mod folder;
pub mod formula;
pub mod peaks;

use crate::cli::Commands;
use scxrdkit::config::Settings;
use scxrdkit::error::Result;

/// 执行命令
pub fn run(cmd: Commands, settings: &Settings) -> Result<()> {
    match cmd {
        Commands::Formula(args) => formula::execute(args),
        Commands::Cell(args) => cell::execute(args, settings),
        Commands::Peaks(args) => peaks::execute(args, settings),
        Commands::Folder(args) => folder::execute(args, settings),
    }
}
