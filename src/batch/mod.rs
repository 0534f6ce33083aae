//! # 批量处理模块
//!
//! 收集匹配文件并并行处理，汇总成功、跳过与失败的条目。
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
