//! # formula 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/formula.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// formula 主命令参数
#[derive(Args, Debug)]
pub struct FormulaArgs {
    #[command(subcommand)]
    pub command: FormulaCommands,
}

/// formula 子命令
#[derive(Subcommand, Debug)]
pub enum FormulaCommands {
    /// Parse a formula into element counts
    Parse {
        /// Chemical formula, e.g. "CaCl2·2H2O"
        formula: String,

        /// Reject malformed input instead of skipping unknown characters
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Compare two formulas under a percentage tolerance
    Compare {
        formula1: String,
        formula2: String,

        /// Allowed deviation per element count, in percent
        #[arg(short, long, default_value_t = 10.0)]
        tolerance: f64,
    },

    /// Rank candidate formulas against a target
    Match(MatchArgs),
}

/// formula match 参数
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Target formula
    pub target: String,

    /// Candidate formulas
    pub candidates: Vec<String>,

    /// Read additional candidates from a file (one per line)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Allowed deviation per element count, in percent
    #[arg(short, long)]
    pub tolerance: Option<f64>,
}
