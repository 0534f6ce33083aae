//! # 晶胞 API 适配器
//!
//! 外部晶胞服务的薄适配层：G6 距离、Le Page 惯用晶胞与原胞转换。
//! 所有失败（未配置、输入无效、网络错误、响应格式不符）都以 `None`
//! 或空集合返回，原因写入日志。
//!
//! ## 依赖关系
//! - 被 `commands/cell.rs` 使用
//! - 使用 `config.rs` 的 `Settings`、`models/cell.rs`
//! - 子模块: transport, g6, conventional, primitive

pub mod conventional;
pub mod g6;
pub mod primitive;
pub mod transport;

pub use conventional::ConventionalCellClient;
pub use g6::{DatasetCell, G6DistanceClient, SimilarDataset, SimilarityRecord};
pub use primitive::PrimitiveCellClient;
pub use transport::{CellApiTransport, HttpTransport};

use crate::models::UnitCell;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

/// Le Page 端点（惯用晶胞与原胞共用）
pub const LEPAGE_ENDPOINT: &str = "/api/v1/lepage";

/// G6 距离端点
pub const G6_DISTANCE_ENDPOINT: &str = "/api/v1/g6-distance";

/// Le Page 响应中的一个晶胞选项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConventionalCell {
    /// Bravais 格子符号，如 "mP"、"aP"
    pub bravais: Option<String>,
    /// 基变换算符
    pub cb_op: Option<String>,
    pub cell: UnitCell,
    /// 与输入晶胞的偏差，缺失时为 0
    pub distance: f64,
}

/// 解析 Le Page 响应：数组或单个对象；格式不符的条目被丢弃
pub(crate) fn parse_lepage_response(body: &Value) -> Vec<ConventionalCell> {
    let entries: Vec<&Value> = match body {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![body],
        other => {
            warn!("Unexpected Le Page response shape: {}", other);
            return Vec::new();
        }
    };

    let total = entries.len();
    let cells: Vec<ConventionalCell> = entries.into_iter().filter_map(parse_lepage_entry).collect();
    if cells.len() < total {
        debug!("Dropped {} malformed Le Page entries", total - cells.len());
    }
    cells
}

fn parse_lepage_entry(entry: &Value) -> Option<ConventionalCell> {
    let obj = entry.as_object()?;
    let values: Vec<f64> = obj
        .get("conventional_cell")?
        .as_array()?
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()?;
    if values.len() < 6 {
        return None;
    }

    let cell = match obj.get("volume").and_then(Value::as_f64) {
        Some(volume) => UnitCell::with_volume(
            values[0], values[1], values[2], values[3], values[4], values[5], volume,
        ),
        None => UnitCell::from_array(&values),
    }?;

    Some(ConventionalCell {
        bravais: obj.get("bravais").and_then(Value::as_str).map(str::to_string),
        cb_op: obj.get("cb_op").and_then(Value::as_str).map(str::to_string),
        cell,
        distance: obj.get("distance").and_then(Value::as_f64).unwrap_or(0.0),
    })
}
