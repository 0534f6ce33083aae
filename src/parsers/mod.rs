//! # 解析器模块
//!
//! 衍射仪厂商格式的解析器：二进制峰表与实验目录中的文本文件。
//!
//! ## 依赖关系
//! - 被 `scxrd/` 和 `commands/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: peak_table, crystal_ini, par, cmdscript, datacoll, res

pub mod cmdscript;
pub mod crystal_ini;
pub mod datacoll;
pub mod par;
pub mod peak_table;
pub mod res;

pub use cmdscript::StageCoordinates;
pub use peak_table::{PeakTableMetadata, PeakTableOutcome};
pub use res::ResSummary;
