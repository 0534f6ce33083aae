//! # 原胞转换客户端
//!
//! 复用 Le Page 端点：响应中 Bravais 为 `aP` 的条目即原胞，
//! 没有时取第一个条目。
//!
//! ## 依赖关系
//! - 被 `commands/cell.rs` 使用
//! - 使用 `api/transport.rs`、`api/mod.rs` 的响应解析

use super::transport::{CellApiTransport, HttpTransport, HEALTH_PATH};
use super::{parse_lepage_response, ConventionalCell, LEPAGE_ENDPOINT};
use crate::config::Settings;
use crate::models::{CellParams, UnitCell};
use log::{debug, error, warn};
use serde_json::json;

/// 原胞判断的默认容差
pub const PRIMITIVE_TOLERANCE: f64 = 1e-6;

const PRIMITIVE_BRAVAIS: &str = "aP";

/// Le Page 原胞客户端
pub struct PrimitiveCellClient<T = HttpTransport> {
    transport: Option<T>,
    max_delta: f64,
}

impl PrimitiveCellClient<HttpTransport> {
    pub fn from_settings(settings: &Settings) -> Self {
        PrimitiveCellClient {
            transport: HttpTransport::from_settings(settings),
            max_delta: settings.conventional_max_delta,
        }
    }
}

impl<T: CellApiTransport> PrimitiveCellClient<T> {
    pub fn with_transport(transport: T, max_delta: f64) -> Self {
        PrimitiveCellClient {
            transport: Some(transport),
            max_delta,
        }
    }

    pub fn enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// 原胞；关闭、输入无效或请求失败时返回 `None`
    pub fn convert_to_primitive(&self, cell: &CellParams) -> Option<ConventionalCell> {
        let transport = self.transport.as_ref()?;
        let values = cell.to_api_array()?;

        let body = json!({
            "cell": values,
            "lepage_max_delta": self.max_delta,
        });
        debug!("Converting cell to primitive: {:?}", values);

        let response = match transport.post_json(LEPAGE_ENDPOINT, &body) {
            Ok(response) => response,
            Err(e) => {
                error!("Primitive cell API request failed: {}", e);
                return None;
            }
        };

        let mut cells = parse_lepage_response(&response);
        let position = cells
            .iter()
            .position(|c| c.bravais.as_deref() == Some(PRIMITIVE_BRAVAIS))
            .unwrap_or(0);
        if cells.is_empty() {
            warn!("No primitive cell found in Le Page response");
            return None;
        }
        Some(cells.swap_remove(position))
    }

    /// 转换失败时退回输入晶胞；输入无效或关闭时返回 `None`
    pub fn ensure_primitive(&self, cell: &CellParams) -> Option<UnitCell> {
        if !self.enabled() {
            return None;
        }
        let values = cell.to_api_array()?;

        match self.convert_to_primitive(cell) {
            Some(primitive) => Some(primitive.cell),
            None => {
                warn!("Primitive conversion failed; using the original cell");
                UnitCell::from_array(&values)
            }
        }
    }

    /// 输入晶胞与其原胞在容差内逐项相等
    pub fn is_primitive(&self, cell: &CellParams, tolerance: f64) -> bool {
        let Some(values) = cell.to_api_array() else {
            return false;
        };
        let Some(primitive) = self.convert_to_primitive(cell) else {
            return false;
        };

        values
            .iter()
            .zip(primitive.cell.to_array().iter())
            .all(|(original, converted)| (original - converted).abs() < tolerance)
    }

    pub fn api_available(&self) -> bool {
        self.transport
            .as_ref()
            .map(|t| t.get_ok(HEALTH_PATH))
            .unwrap_or(false)
    }
}
