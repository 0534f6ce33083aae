//! # 反射点数据导出
//!
//! - CSV: 全部反射点（可带指标化标记）或被指标化的点（含 hkl）
//! - 图像: 见 `plot.rs`
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs` 调用
//! - 使用 `models/reflection.rs`
//! - 使用 `csv` 库写入 CSV 文件

pub mod plot;

pub use plot::{generate_projection_plot, Projection};

use crate::error::{Result, ScxrdError};
use crate::models::{IndexingResult, ReflectionPoint};

use std::path::Path;

/// 导出全部反射点；`flags` 与 `points` 等长时附加 indexed 列
pub fn points_to_csv(
    points: &[ReflectionPoint],
    flags: Option<&[bool]>,
    output_path: &Path,
) -> Result<()> {
    let flags = flags.filter(|f| f.len() == points.len());
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut header = vec!["x", "y", "z", "r", "i"];
    if flags.is_some() {
        header.push("indexed");
    }
    wtr.write_record(&header)?;

    for (index, point) in points.iter().enumerate() {
        let mut record = vec![
            format!("{:.6}", point.x),
            format!("{:.6}", point.y),
            format!("{:.6}", point.z),
            format!("{:.6}", point.r),
            point.i.to_string(),
        ];
        if let Some(flags) = flags {
            record.push(flags[index].to_string());
        }
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|e| ScxrdError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出被指标化的点
pub fn indexed_spots_to_csv(result: &IndexingResult, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([
        "index", "x", "y", "z", "h", "k", "l", "h_int", "k_int", "l_int", "deviation",
    ])?;

    for spot in &result.indexed_spots {
        wtr.write_record(&[
            spot.index.to_string(),
            format!("{:.6}", spot.point.x),
            format!("{:.6}", spot.point.y),
            format!("{:.6}", spot.point.z),
            format!("{:.4}", spot.hkl[0]),
            format!("{:.4}", spot.hkl[1]),
            format!("{:.4}", spot.hkl[2]),
            spot.hkl_rounded[0].to_string(),
            spot.hkl_rounded[1].to_string(),
            spot.hkl_rounded[2].to_string(),
            format!("{:.4}", spot.deviation),
        ])?;
    }

    wtr.flush().map_err(|e| ScxrdError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
