//! # 实验目录处理
//!
//! 对解压后的单晶衍射实验目录建立索引，并从中提取晶胞、台面坐标、
//! 测量时间以及各类数据文件的位置。
//!
//! ## 依赖关系
//! - 被 `commands/folder.rs` 使用
//! - 使用 `parsers/` 与 `models/folder.rs`
//! - 子模块: archive, processor

pub mod archive;
pub mod processor;

pub use archive::{ArchiveEntry, ArchiveIndex};
pub use processor::{
    calculate_well_image_reference_point, ScxrdFolderProcessor, DEFAULT_PIXEL_SIZE_MM,
};
