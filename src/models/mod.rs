//! # 数据模型模块
//!
//! 定义晶胞、反射点、指标化结果与实验文件夹结果等纯数据类型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`lattice/`、`scxrd/`、`api/` 和 `commands/` 使用
//! - 子模块: cell, reflection, folder

pub mod cell;
pub mod folder;
pub mod reflection;

pub use cell::{CellParams, UnitCell};
pub use folder::{
    CellSource, CoordinateOverrides, CrystalFolderResult, DiffractionFrame, StagePosition,
    StructureFile, WellImageReference,
};
pub use reflection::{AxisStatistics, IndexedSpot, IndexingResult, PeakStatistics, ReflectionPoint};
