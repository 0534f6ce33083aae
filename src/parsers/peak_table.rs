//! # 二进制峰表解析器 (.tabbin)
//!
//! ## 布局（小端）
//! ```text
//! offset 0    u64        chunk 数量 N
//! offset 8    304 字节   填充
//! offset 312  N × 168 字节记录
//!             每条记录: f64 x, f64 y, f64 z, f64 r, i64 intensity, 128 字节填充
//! ```
//!
//! 解析失败不返回 `Err`，而是 `success = false` 并附带可展示给操作员的错误信息。
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs`、`scxrd/processor.rs` 使用
//! - 使用 `models/reflection.rs`

use crate::error::{Result, ScxrdError};
use crate::models::{PeakStatistics, ReflectionPoint};
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

/// 头部总长度
pub const HEADER_SIZE: usize = 312;

/// 单条记录长度
pub const RECORD_SIZE: usize = 168;

/// 记录中有效载荷长度（4 × f64 + i64）
pub const PAYLOAD_SIZE: usize = 40;

const COUNT_SIZE: usize = 8;

pub const ERR_NO_DATA: &str = "No binary data provided";
pub const ERR_TOO_SHORT: &str = "File too short to contain chunk count";

/// 解析元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeakTableMetadata {
    pub num_points: usize,
    pub file_size: usize,
    /// 头部声明的记录数
    pub declared_chunks: u64,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakTableOutcome {
    pub success: bool,
    pub data_points: Vec<ReflectionPoint>,
    /// 仅在成功且至少有一个点时存在
    pub statistics: Option<PeakStatistics>,
    pub metadata: Option<PeakTableMetadata>,
    pub error: Option<String>,
}

impl PeakTableOutcome {
    fn failure(message: impl Into<String>) -> Self {
        PeakTableOutcome {
            success: false,
            data_points: Vec::new(),
            statistics: None,
            metadata: None,
            error: Some(message.into()),
        }
    }
}

/// 解析二进制峰表
pub fn parse(blob: Option<&[u8]>) -> PeakTableOutcome {
    let data = match blob {
        Some(data) if !data.is_empty() => data,
        _ => return PeakTableOutcome::failure(ERR_NO_DATA),
    };

    if data.len() < COUNT_SIZE {
        return PeakTableOutcome::failure(ERR_TOO_SHORT);
    }

    let mut cursor = Cursor::new(data);
    let declared = match cursor.read_u64::<LittleEndian>() {
        Ok(n) => n,
        Err(_) => return PeakTableOutcome::failure(ERR_TOO_SHORT),
    };
    info!("Peak table header declares {} chunks", declared);

    let required = usize::try_from(declared)
        .ok()
        .and_then(|n| n.checked_mul(RECORD_SIZE))
        .and_then(|n| n.checked_add(HEADER_SIZE));

    let available_records = data.len().saturating_sub(HEADER_SIZE) / RECORD_SIZE;
    let complete = matches!(required, Some(required) if required <= data.len());
    let to_decode = if complete {
        declared as usize
    } else {
        available_records.min(usize::try_from(declared).unwrap_or(usize::MAX))
    };

    let data_points = decode_records(data, to_decode);
    let metadata = PeakTableMetadata {
        num_points: data_points.len(),
        file_size: data.len(),
        declared_chunks: declared,
    };

    if !complete {
        let required_text = required
            .map(|n| n.to_string())
            .unwrap_or_else(|| "overflowing".to_string());
        let message = format!(
            "File truncated: header declares {} chunks ({} bytes) but only {} bytes available",
            declared,
            required_text,
            data.len()
        );
        warn!("{} ({} complete records kept)", message, data_points.len());
        return PeakTableOutcome {
            success: false,
            data_points,
            statistics: None,
            metadata: Some(metadata),
            error: Some(message),
        };
    }

    info!("Successfully read {} peak table points", data_points.len());
    let statistics = PeakStatistics::from_points(&data_points);

    PeakTableOutcome {
        success: true,
        data_points,
        statistics,
        metadata: Some(metadata),
        error: None,
    }
}

/// 读取文件并解析
pub fn parse_file(path: &Path) -> Result<PeakTableOutcome> {
    let bytes = std::fs::read(path).map_err(|e| ScxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(parse(Some(&bytes)))
}

fn decode_records(data: &[u8], count: usize) -> Vec<ReflectionPoint> {
    let mut points = Vec::with_capacity(count);

    for index in 0..count {
        let start = HEADER_SIZE + index * RECORD_SIZE;
        let Some(payload) = data.get(start..start + PAYLOAD_SIZE) else {
            break;
        };
        match decode_payload(payload) {
            Ok(point) => points.push(point),
            Err(e) => {
                warn!("Chunk {} could not be decoded: {}", index + 1, e);
                break;
            }
        }
    }

    points
}

fn decode_payload(payload: &[u8]) -> std::io::Result<ReflectionPoint> {
    let mut cursor = Cursor::new(payload);
    let x = cursor.read_f64::<LittleEndian>()?;
    let y = cursor.read_f64::<LittleEndian>()?;
    let z = cursor.read_f64::<LittleEndian>()?;
    let r = cursor.read_f64::<LittleEndian>()?;
    let i = cursor.read_i64::<LittleEndian>()?;
    Ok(ReflectionPoint::new(x, y, z, r, i))
}

/// 按相同布局编码（测试数据与导出使用）
pub fn encode(points: &[ReflectionPoint]) -> Vec<u8> {
    use byteorder::WriteBytesExt;

    let mut buffer = Vec::with_capacity(HEADER_SIZE + points.len() * RECORD_SIZE);
    // 写入 Vec<u8> 不会失败
    let _ = buffer.write_u64::<LittleEndian>(points.len() as u64);
    buffer.resize(HEADER_SIZE, 0);

    for p in points {
        let _ = buffer.write_f64::<LittleEndian>(p.x);
        let _ = buffer.write_f64::<LittleEndian>(p.y);
        let _ = buffer.write_f64::<LittleEndian>(p.z);
        let _ = buffer.write_f64::<LittleEndian>(p.r);
        let _ = buffer.write_i64::<LittleEndian>(p.i);
        buffer.resize(buffer.len() + RECORD_SIZE - PAYLOAD_SIZE, 0);
    }

    buffer
}
