//! # HTTP 传输层
//!
//! 晶胞 API 客户端只依赖 `CellApiTransport` trait；生产环境使用基于
//! `reqwest::blocking` 的 `HttpTransport`，测试使用 `FakeTransport`。
//!
//! ## 依赖关系
//! - 被 `api/g6.rs`、`api/conventional.rs`、`api/primitive.rs` 使用
//! - 使用 `reqwest` 发送请求，`serde_json` 处理 JSON

use crate::config::Settings;
use crate::error::{Result, ScxrdError};
use log::{debug, warn};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

/// 健康检查路径
pub const HEALTH_PATH: &str = "/health";

/// 晶胞 API 传输接口
pub trait CellApiTransport: Send + Sync {
    /// POST JSON 请求体，返回解析后的 JSON 响应；非 2xx 状态为错误
    fn post_json(&self, path: &str, body: &Value) -> Result<Value>;

    /// GET 请求是否返回 2xx
    fn get_ok(&self, path: &str) -> bool;
}

/// 基于 reqwest 的阻塞 HTTP 传输
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// 端点未配置或客户端构建失败时返回 None
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let endpoint = settings.api_endpoint()?;
        match Self::new(endpoint, Duration::from_secs(settings.cell_api_timeout_secs)) {
            Ok(transport) => Some(transport),
            Err(e) => {
                warn!("Cell API client could not be created: {}", e);
                None
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl CellApiTransport for HttpTransport {
    fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        debug!("POST {} {}", url, body);

        let response = self.client.post(&url).json(body).send()?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ScxrdError::ApiResponse(format!("{} - {}", status, text)));
        }

        let value: Value = response.json()?;
        debug!("Response from {}: {}", url, value);
        Ok(value)
    }

    fn get_ok(&self, path: &str) -> bool {
        self.client
            .get(self.url(path))
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) use fake::FakeTransport;

#[cfg(test)]
mod fake {
    use super::*;
    use std::sync::Mutex;

    type Handler = Box<dyn Fn(&str, &Value) -> std::result::Result<Value, String> + Send + Sync>;

    /// 返回预设响应并记录请求的测试替身
    pub(crate) struct FakeTransport {
        handler: Handler,
        healthy: bool,
        requests: Mutex<Vec<(String, Value)>>,
    }

    impl FakeTransport {
        /// 每次都返回同一个响应
        pub(crate) fn responding(value: Value) -> Self {
            Self::with_handler(move |_, _| Ok(value.clone()))
        }

        /// 每次都失败（模拟网络错误或超时）
        pub(crate) fn failing(message: &str) -> Self {
            let message = message.to_string();
            Self::with_handler(move |_, _| Err(message.clone()))
        }

        pub(crate) fn with_handler<F>(handler: F) -> Self
        where
            F: Fn(&str, &Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
        {
            FakeTransport {
                handler: Box::new(handler),
                healthy: true,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn unhealthy(mut self) -> Self {
            self.healthy = false;
            self
        }

        pub(crate) fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    impl CellApiTransport for FakeTransport {
        fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((path.to_string(), body.clone()));
            }
            (self.handler)(path, body).map_err(ScxrdError::ApiResponse)
        }

        fn get_ok(&self, _path: &str) -> bool {
            self.healthy
        }
    }
}
