//! # 衍射点指标化
//!
//! 用 UB 矩阵的逆把每个反射点的 (x, y, z) 映射为分数 Miller 指数，
//! 三个分量到最近整数的距离都不超过容差时认为该点被指标化。
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs` 使用
//! - 使用 `lattice/matrix.rs`、`models/reflection.rs`

use super::matrix::{self, Mat3, Vec3};
use crate::models::{IndexedSpot, IndexingResult, ReflectionPoint};
use log::{debug, warn};

/// 默认容差：到最近整数的最大距离
pub const DEFAULT_INDEXING_TOLERANCE: f64 = 0.125;

/// 计算被 UB 矩阵指标化的点
///
/// UB 缺失或奇异时返回 `indexed_count = 0`，`total_count` 仍为输入长度。
pub fn calculate_indexed_spots(
    points: &[ReflectionPoint],
    ub: Option<&Mat3>,
    tolerance: f64,
) -> IndexingResult {
    let total_count = points.len();
    if total_count == 0 {
        return IndexingResult::unindexed(0);
    }

    let Some(ub_inverse) = ub.and_then(matrix::inverse) else {
        warn!("UB matrix missing or singular, {} spots left unindexed", total_count);
        return IndexingResult::unindexed(total_count);
    };

    let indexed_spots: Vec<IndexedSpot> = points
        .iter()
        .enumerate()
        .filter_map(|(index, point)| {
            let hkl = matrix::mul_vec(&ub_inverse, &point.xyz());
            let distances = integer_distances(&hkl);
            if !within_tolerance(&distances, tolerance) {
                return None;
            }

            Some(IndexedSpot {
                index,
                point: *point,
                hkl,
                hkl_rounded: hkl.map(|v| v.round() as i64),
                distances,
                deviation: distances.iter().copied().fold(0.0, f64::max),
            })
        })
        .collect();

    let indexed_count = indexed_spots.len();
    let indexing_rate = round2(indexed_count as f64 / total_count as f64 * 100.0);
    debug!(
        "Indexed {}/{} spots ({:.2}%) at tolerance {}",
        indexed_count, total_count, indexing_rate, tolerance
    );

    IndexingResult {
        total_count,
        indexed_count,
        indexing_rate,
        indexed_spots,
    }
}

/// 为每个点生成“是否被指标化”标记；无法指标化时返回 None
pub fn enrich_with_indexing_info(
    points: &[ReflectionPoint],
    ub: Option<&Mat3>,
    tolerance: f64,
) -> Option<Vec<bool>> {
    if points.is_empty() {
        return None;
    }
    let ub_inverse = ub.and_then(matrix::inverse)?;

    Some(
        points
            .iter()
            .map(|p| {
                let hkl = matrix::mul_vec(&ub_inverse, &p.xyz());
                within_tolerance(&integer_distances(&hkl), tolerance)
            })
            .collect(),
    )
}

/// 原地写入标记；成功返回 true
pub fn mark_indexed(
    points: &[ReflectionPoint],
    flags: &mut Vec<bool>,
    ub: Option<&Mat3>,
    tolerance: f64,
) -> bool {
    match enrich_with_indexing_info(points, ub, tolerance) {
        Some(result) => {
            *flags = result;
            true
        }
        None => false,
    }
}

fn integer_distances(hkl: &Vec3) -> Vec3 {
    hkl.map(|v| (v - v.round()).abs())
}

fn within_tolerance(distances: &Vec3, tolerance: f64) -> bool {
    distances.iter().all(|d| *d <= tolerance)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
