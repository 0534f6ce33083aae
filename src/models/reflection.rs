//! # 反射点与指标化结果
//!
//! ## 依赖关系
//! - 被 `parsers/peak_table.rs`、`lattice/indexing.rs`、`export/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 峰表中的一个反射点（倒易空间坐标）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReflectionPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// 半径 / 分辨率
    pub r: f64,
    /// 强度
    pub i: i64,
}

impl ReflectionPoint {
    pub fn new(x: f64, y: f64, z: f64, r: f64, i: i64) -> Self {
        ReflectionPoint { x, y, z, r, i }
    }

    /// 仅坐标，r 与强度置零
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        ReflectionPoint::new(x, y, z, 0.0, 0)
    }

    pub fn xyz(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// 单个字段的统计量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// 总体标准差
    pub std: f64,
    /// 上中位数（排序后下标 len/2）
    pub median: f64,
    pub count: usize,
}

impl AxisStatistics {
    /// 空序列返回 None
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = sorted[count / 2];

        Some(AxisStatistics {
            min,
            max,
            mean,
            std: variance.sqrt(),
            median,
            count,
        })
    }
}

/// 峰表统计（x, y, z, r, i 各一组）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakStatistics {
    pub x: AxisStatistics,
    pub y: AxisStatistics,
    pub z: AxisStatistics,
    pub r: AxisStatistics,
    pub i: AxisStatistics,
}

impl PeakStatistics {
    /// 没有点时返回 None
    pub fn from_points(points: &[ReflectionPoint]) -> Option<Self> {
        let column = |f: fn(&ReflectionPoint) -> f64| points.iter().map(f).collect::<Vec<_>>();

        Some(PeakStatistics {
            x: AxisStatistics::from_values(&column(|p| p.x))?,
            y: AxisStatistics::from_values(&column(|p| p.y))?,
            z: AxisStatistics::from_values(&column(|p| p.z))?,
            r: AxisStatistics::from_values(&column(|p| p.r))?,
            i: AxisStatistics::from_values(&column(|p| p.i as f64))?,
        })
    }
}

/// 被指标化的单个点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedSpot {
    /// 在输入序列中的下标
    pub index: usize,
    pub point: ReflectionPoint,
    /// 分数 Miller 指数
    pub hkl: [f64; 3],
    pub hkl_rounded: [i64; 3],
    /// 各分量到最近整数的距离
    pub distances: [f64; 3],
    /// 最大偏差
    pub deviation: f64,
}

/// 指标化汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingResult {
    pub total_count: usize,
    pub indexed_count: usize,
    /// 百分比，保留两位小数
    pub indexing_rate: f64,
    pub indexed_spots: Vec<IndexedSpot>,
}

impl IndexingResult {
    /// 无法指标化时的结果：总数保留，其余为零
    pub fn unindexed(total_count: usize) -> Self {
        IndexingResult {
            total_count,
            indexed_count: 0,
            indexing_rate: 0.0,
            indexed_spots: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_statistics() {
        let stats = AxisStatistics::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert!((stats.min - 1.0).abs() < 1e-12);
        assert!((stats.max - 4.0).abs() < 1e-12);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        // 总体标准差 sqrt(1.25)
        assert!((stats.std - 1.25_f64.sqrt()).abs() < 1e-12);
        // 上中位数
        assert!((stats.median - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_statistics_empty() {
        assert!(AxisStatistics::from_values(&[]).is_none());
        assert!(PeakStatistics::from_points(&[]).is_none());
    }

    #[test]
    fn test_peak_statistics_single_point() {
        let stats = PeakStatistics::from_points(&[ReflectionPoint::new(1.0, 2.0, 3.0, 4.0, 5)])
            .unwrap();
        assert!((stats.x.min - 1.0).abs() < 1e-12);
        assert!((stats.y.mean - 2.0).abs() < 1e-12);
        assert!((stats.z.max - 3.0).abs() < 1e-12);
        assert!((stats.r.median - 4.0).abs() < 1e-12);
        assert!((stats.i.mean - 5.0).abs() < 1e-12);
        assert!(stats.x.std.abs() < 1e-12);
    }
}
