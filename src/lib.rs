//! # scxrdkit - 单晶衍射数据处理核心
//!
//! 晶体筛板追踪系统中与衍射数据相关的纯计算部分。
//!
//! ## 功能
//! - 分子式解析与比较
//! - UB 矩阵 → 晶胞参数，衍射点指标化
//! - 二进制峰表与实验目录文本文件解析
//! - 外部晶胞 API（惯用晶胞、原胞、G6 距离）客户端
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── config.rs   (运行配置)
//!   ├── error.rs    (错误处理)
//!   ├── models/     (数据模型)
//!   ├── chemistry/  (分子式)
//!   ├── lattice/    (矩阵、UB、指标化)
//!   ├── parsers/    (格式解析器)
//!   ├── scxrd/      (实验目录处理)
//!   ├── api/        (晶胞 API 客户端)
//!   ├── batch/      (批量处理)
//!   ├── export/     (CSV 与图表导出)
//!   └── utils/      (终端输出工具)
//! ```

pub mod api;
pub mod batch;
pub mod chemistry;
pub mod config;
pub mod error;
pub mod export;
pub mod lattice;
pub mod models;
pub mod parsers;
pub mod scxrd;
pub mod utils;
