//! # 晶格计算模块
//!
//! ## 功能
//! - 3×3 闭式矩阵运算
//! - UB 矩阵 → 实空间晶胞参数
//! - 衍射点指标化统计
//!
//! ## 依赖关系
//! - 被 `commands/cell.rs`、`commands/peaks.rs` 使用
//! - 使用 `models/`
//! - 子模块: matrix, ub_matrix, indexing

pub mod indexing;
pub mod matrix;
pub mod ub_matrix;

pub use indexing::{
    calculate_indexed_spots, enrich_with_indexing_info, mark_indexed, DEFAULT_INDEXING_TOLERANCE,
};
pub use matrix::{Mat3, Vec3};
pub use ub_matrix::{
    ub_matrix_to_cell_parameters, ub_values_to_cell_parameters, CU_KALPHA_WAVELENGTH,
    MO_KALPHA_WAVELENGTH,
};
