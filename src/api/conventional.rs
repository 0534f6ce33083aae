//! # 惯用晶胞转换客户端
//!
//! 将原胞发送到 Le Page 端点，得到按服务端顺序排列的惯用晶胞候选：
//! 第一个为最佳（偏差最小），最后一个为与输入等价的选项。
//!
//! ## 依赖关系
//! - 被 `commands/cell.rs` 使用
//! - 使用 `api/transport.rs`、`api/mod.rs` 的响应解析

use super::transport::{CellApiTransport, HttpTransport, HEALTH_PATH};
use super::{parse_lepage_response, ConventionalCell, LEPAGE_ENDPOINT};
use crate::config::Settings;
use crate::models::CellParams;
use log::{debug, error, warn};
use serde_json::json;

/// Le Page 惯用晶胞客户端
pub struct ConventionalCellClient<T = HttpTransport> {
    transport: Option<T>,
    max_delta: f64,
}

impl ConventionalCellClient<HttpTransport> {
    pub fn from_settings(settings: &Settings) -> Self {
        ConventionalCellClient {
            transport: HttpTransport::from_settings(settings),
            max_delta: settings.conventional_max_delta,
        }
    }
}

impl<T: CellApiTransport> ConventionalCellClient<T> {
    pub fn with_transport(transport: T, max_delta: f64) -> Self {
        ConventionalCellClient {
            transport: Some(transport),
            max_delta,
        }
    }

    pub fn enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// 全部惯用晶胞候选
    ///
    /// 关闭、输入无效、请求失败或没有可用条目时返回 `None`。
    /// `max_delta` 为 `None` 时使用配置值。
    pub fn convert_to_conventional(
        &self,
        primitive: &CellParams,
        max_delta: Option<f64>,
    ) -> Option<Vec<ConventionalCell>> {
        let transport = self.transport.as_ref()?;
        let Some(cell) = primitive.to_api_array() else {
            debug!("Primitive cell is incomplete; conversion skipped");
            return None;
        };

        let body = json!({
            "cell": cell,
            "lepage_max_delta": max_delta.unwrap_or(self.max_delta),
        });

        let response = match transport.post_json(LEPAGE_ENDPOINT, &body) {
            Ok(response) => response,
            Err(e) => {
                error!("Unit cell conversion API request failed: {}", e);
                return None;
            }
        };

        let cells = parse_lepage_response(&response);
        if cells.is_empty() {
            warn!("Unit cell conversion API returned no usable cells");
            return None;
        }
        Some(cells)
    }

    /// 最佳候选（第一个）
    pub fn best_conventional_cell(
        &self,
        primitive: &CellParams,
        max_delta: Option<f64>,
    ) -> Option<ConventionalCell> {
        self.convert_to_conventional(primitive, max_delta)?
            .into_iter()
            .next()
    }

    /// 与输入等价的候选（最后一个）
    pub fn conventional_cell_as_input(
        &self,
        primitive: &CellParams,
        max_delta: Option<f64>,
    ) -> Option<ConventionalCell> {
        self.convert_to_conventional(primitive, max_delta)?.pop()
    }

    pub fn api_available(&self) -> bool {
        self.transport
            .as_ref()
            .map(|t| t.get_ok(HEALTH_PATH))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::FakeTransport;
    use serde_json::Value;

    fn lepage_body() -> Value {
        json!([
            {"bravais": "mC", "cb_op": "a-b,a+b,c", "conventional_cell": [9.1, 9.9, 8.5, 90.0, 107.6, 90.0], "volume": 730.0, "distance": 0.05},
            {"bravais": "aP", "cb_op": "a,b,c", "conventional_cell": [7.22, 8.54, 8.59, 107.66, 91.87, 90.94], "volume": 504.44}
        ])
    }

    fn primitive() -> CellParams {
        CellParams::new(7.22, 8.54, 8.59, 107.66, 91.87, 90.94)
    }

    #[test]
    fn test_convert_all_options() {
        let client = ConventionalCellClient::with_transport(FakeTransport::responding(lepage_body()), 1.0);
        let cells = client.convert_to_conventional(&primitive(), None).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].bravais.as_deref(), Some("mC"));
        assert_eq!(cells[0].cell.volume, 730.0);
        assert_eq!(cells[1].distance, 0.0);
    }

    #[test]
    fn test_request_uses_max_delta() {
        let client = ConventionalCellClient::with_transport(FakeTransport::responding(lepage_body()), 1.5);
        client.convert_to_conventional(&primitive(), None);
        client.convert_to_conventional(&primitive(), Some(3.0));

        let requests = client.transport.as_ref().unwrap().requests();
        assert_eq!(requests[0].0, LEPAGE_ENDPOINT);
        assert_eq!(requests[0].1["lepage_max_delta"], json!(1.5));
        assert_eq!(requests[1].1["lepage_max_delta"], json!(3.0));
        assert_eq!(requests[0].1["cell"], json!([7.22, 8.54, 8.59, 107.66, 91.87, 90.94]));
    }

    #[test]
    fn test_best_and_as_input() {
        let client = ConventionalCellClient::with_transport(FakeTransport::responding(lepage_body()), 1.0);
        assert_eq!(
            client.best_conventional_cell(&primitive(), None).unwrap().bravais.as_deref(),
            Some("mC")
        );
        assert_eq!(
            client.conventional_cell_as_input(&primitive(), None).unwrap().bravais.as_deref(),
            Some("aP")
        );
    }

    #[test]
    fn test_fails_closed() {
        let invalid = CellParams {
            a: None,
            ..primitive()
        };
        let client = ConventionalCellClient::with_transport(FakeTransport::responding(lepage_body()), 1.0);
        assert!(client.convert_to_conventional(&invalid, None).is_none());

        for body in [Value::Null, json!([]), json!({"error": "bad cell"}), json!([{"bravais": "aP"}])] {
            let client = ConventionalCellClient::with_transport(FakeTransport::responding(body), 1.0);
            assert!(client.convert_to_conventional(&primitive(), None).is_none());
            assert!(client.best_conventional_cell(&primitive(), None).is_none());
        }

        let client = ConventionalCellClient::with_transport(FakeTransport::failing("connection refused"), 1.0);
        assert!(client.convert_to_conventional(&primitive(), None).is_none());
    }

    #[test]
    fn test_disabled_without_endpoint() {
        let client = ConventionalCellClient::from_settings(&Settings::default());
        assert!(!client.enabled());
        assert!(client.convert_to_conventional(&primitive(), None).is_none());
        assert!(!client.api_available());
    }
}
