//! # 实验文件夹处理结果
//!
//! 一个解压后的衍射实验目录经 `ScxrdFolderProcessor` 处理得到的结果，
//! 以及调用方叠加用户坐标的规则。
//!
//! ## 依赖关系
//! - 被 `scxrd/`、`commands/folder.rs` 使用
//! - 使用 `models/cell.rs`、`parsers/cmdscript.rs`

use crate::error::{Result, ScxrdError};
use crate::models::UnitCell;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

/// 晶胞参数来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSource {
    CrystalIni,
    Par,
}

impl std::fmt::Display for CellSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellSource::CrystalIni => write!(f, "crystal.ini"),
            CellSource::Par => write!(f, ".par"),
        }
    }
}

/// 衍射帧元数据（不读取图像内容）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffractionFrame {
    pub path: PathBuf,
    pub run: u32,
    pub image: u32,
    pub size_bytes: u64,
}

/// 解析出的结构文件（.res）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureFile {
    pub path: PathBuf,
    pub reflections_all: u64,
    pub r1_all: f64,
    pub size_bytes: u64,
}

/// 单个实验目录的处理结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrystalFolderResult {
    pub cell: Option<UnitCell>,
    pub cell_source: Option<CellSource>,

    pub real_world_x_mm: Option<f64>,
    pub real_world_y_mm: Option<f64>,
    pub real_world_z_mm: Option<f64>,

    /// datacoll.ini 中的开始时间
    pub measured_at: Option<NaiveDateTime>,

    pub peak_table: Option<PathBuf>,
    pub diffraction_frames: Vec<DiffractionFrame>,
    pub crystal_image: Option<PathBuf>,
    pub structure_file: Option<StructureFile>,

    /// 遍历因数量上限提前终止
    pub truncated_walk: bool,
}

impl CrystalFolderResult {
    pub fn has_coordinates(&self) -> bool {
        self.real_world_x_mm.is_some()
            || self.real_world_y_mm.is_some()
            || self.real_world_z_mm.is_some()
    }
}

/// 用户输入的坐标（原样字符串，空白表示沿用解析值）
#[derive(Debug, Clone, Default)]
pub struct CoordinateOverrides {
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
}

/// 叠加后的最终坐标
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StagePosition {
    pub x_mm: Option<f64>,
    pub y_mm: Option<f64>,
    pub z_mm: Option<f64>,
}

impl CoordinateOverrides {
    /// 逐字段叠加：用户输入 > 解析值 > 无
    pub fn apply(&self, parsed: &CrystalFolderResult) -> Result<StagePosition> {
        Ok(StagePosition {
            x_mm: overlay("x", self.x.as_deref(), parsed.real_world_x_mm)?,
            y_mm: overlay("y", self.y.as_deref(), parsed.real_world_y_mm)?,
            z_mm: overlay("z", self.z.as_deref(), parsed.real_world_z_mm)?,
        })
    }
}

fn overlay(axis: &str, user: Option<&str>, parsed: Option<f64>) -> Result<Option<f64>> {
    match user.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(parsed),
        Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
            ScxrdError::InvalidArgument(format!("{} coordinate '{}' is not a number", axis, raw))
        }),
    }
}

/// 孔板图像左上角参考点（mm）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WellImageReference {
    pub x_mm: f64,
    pub y_mm: f64,
    pub z_mm: f64,
    /// 单个像素边长 (mm)，x/y 相同
    pub pixel_size_mm: f64,
}
