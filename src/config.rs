//! # 运行配置
//!
//! 启动时一次性解析出 `Settings`，之后以引用传入各个适配器，不再重复查询。
//!
//! ## 优先级
//! 命令行显式覆盖 > 存储配置（TOML 文件）> 环境变量 > 内置默认值
//!
//! ```toml
//! # scxrdkit.toml
//! [cell_api]
//! endpoint = "http://localhost:3001"
//! timeout_secs = 5
//! max_delta = 1.0
//!
//! [processing]
//! wavelength = 0.71073
//! indexing_tolerance = 0.125
//! similarity_tolerance = 10.0
//! archive_max_depth = 12
//! archive_max_files = 100000
//! ```
//!
//! ## 依赖关系
//! - 被 `main.rs`、`api/`、`scxrd/` 使用
//! - 使用 `toml` + `serde` 解析存储配置

use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默认配置文件名（当前目录下存在时自动加载）
pub const DEFAULT_CONFIG_FILE: &str = "scxrdkit.toml";

pub const ENV_API_BASE_URL: &str = "CONVENTIONAL_CELL_API_BASE_URL";
pub const ENV_API_ENABLED: &str = "CONVENTIONAL_CELL_API_ENABLED";
pub const ENV_API_TIMEOUT: &str = "CONVENTIONAL_CELL_API_TIMEOUT";
pub const ENV_MAX_DELTA: &str = "CONVENTIONAL_CELL_MAX_DELTA";

/// 已解析的运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// 晶胞转换 / G6 距离 API 的基础 URL，空白表示功能关闭
    pub cell_api_endpoint: Option<String>,
    /// 单次请求超时（秒）
    pub cell_api_timeout_secs: u64,
    /// Le Page 最大 delta
    pub conventional_max_delta: f64,
    /// 相似晶胞筛选阈值（G6 距离）
    pub similarity_tolerance: f64,
    /// 存储相似度记录时允许的最大距离
    pub max_stored_distance: f64,
    /// 指标化容差（到最近整数的最大偏差）
    pub indexing_tolerance: f64,
    /// 默认 X 射线波长（Å）
    pub wavelength: f64,
    /// 压缩包目录遍历最大深度
    pub archive_max_depth: usize,
    /// 压缩包目录遍历最多访问的条目数
    pub archive_max_files: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cell_api_endpoint: None,
            cell_api_timeout_secs: 5,
            conventional_max_delta: 1.0,
            similarity_tolerance: 10.0,
            max_stored_distance: 5000.0,
            indexing_tolerance: 0.125,
            wavelength: 0.71073,
            archive_max_depth: 12,
            archive_max_files: 100_000,
        }
    }
}

impl Settings {
    /// 非空白的 API 端点
    pub fn api_endpoint(&self) -> Option<&str> {
        self.cell_api_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// API 是否已配置
    pub fn cell_api_enabled(&self) -> bool {
        self.api_endpoint().is_some()
    }

    /// 按优先级合并各层配置
    pub fn resolve<F>(
        overrides: &SettingsOverrides,
        stored: Option<&StoredSettings>,
        env: F,
    ) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        settings.apply_env(&env);
        if let Some(stored) = stored {
            settings.apply_stored(stored);
        }
        settings.apply_overrides(overrides);

        settings
    }

    fn apply_env<F>(&mut self, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(ENV_API_BASE_URL) {
            self.cell_api_endpoint = Some(url);
        }
        if let Some(flag) = env(ENV_API_ENABLED) {
            if flag.trim().eq_ignore_ascii_case("false") {
                self.cell_api_endpoint = None;
            }
        }
        if let Some(timeout) = env_number::<u64>(env, ENV_API_TIMEOUT) {
            self.cell_api_timeout_secs = timeout;
        }
        if let Some(delta) = env_number::<f64>(env, ENV_MAX_DELTA) {
            self.conventional_max_delta = delta;
        }
    }

    fn apply_stored(&mut self, stored: &StoredSettings) {
        let api = &stored.cell_api;
        if let Some(ref endpoint) = api.endpoint {
            self.cell_api_endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = api.timeout_secs {
            self.cell_api_timeout_secs = timeout;
        }
        if let Some(delta) = api.max_delta {
            self.conventional_max_delta = delta;
        }

        let proc = &stored.processing;
        if let Some(v) = proc.wavelength {
            self.wavelength = v;
        }
        if let Some(v) = proc.indexing_tolerance {
            self.indexing_tolerance = v;
        }
        if let Some(v) = proc.similarity_tolerance {
            self.similarity_tolerance = v;
        }
        if let Some(v) = proc.max_stored_distance {
            self.max_stored_distance = v;
        }
        if let Some(v) = proc.archive_max_depth {
            self.archive_max_depth = v;
        }
        if let Some(v) = proc.archive_max_files {
            self.archive_max_files = v;
        }
    }

    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(ref endpoint) = overrides.api_endpoint {
            self.cell_api_endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = overrides.api_timeout_secs {
            self.cell_api_timeout_secs = timeout;
        }
    }
}

fn env_number<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}='{}': not a valid number", key, raw);
            None
        }
    }
}

/// 命令行全局覆盖（`--api-endpoint`、`--api-timeout`）
///
/// max delta 与波长由各子命令自己的参数覆盖。
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_endpoint: Option<String>,
    pub api_timeout_secs: Option<u64>,
}

/// 存储层配置（TOML），所有字段可选
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredSettings {
    #[serde(default)]
    pub cell_api: CellApiSection,

    #[serde(default)]
    pub processing: ProcessingSection,
}

/// `[cell_api]` 段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellApiSection {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_delta: Option<f64>,
}

/// `[processing]` 段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessingSection {
    pub wavelength: Option<f64>,
    pub indexing_tolerance: Option<f64>,
    pub similarity_tolerance: Option<f64>,
    pub max_stored_distance: Option<f64>,
    pub archive_max_depth: Option<usize>,
    pub archive_max_files: Option<usize>,
}

impl StoredSettings {
    /// 从 TOML 文件加载
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_any_layer() {
        let settings = Settings::resolve(&SettingsOverrides::default(), None, |_| None);
        assert_eq!(settings, Settings::default());
        assert!(!settings.cell_api_enabled());
        assert_eq!(settings.cell_api_timeout_secs, 5);
        assert!((settings.wavelength - 0.71073).abs() < 1e-12);
    }

    #[test]
    fn test_env_layer() {
        let env = env_from(&[
            (ENV_API_BASE_URL, "http://cells.local:3001"),
            (ENV_API_TIMEOUT, "9"),
            (ENV_MAX_DELTA, "2.5"),
        ]);
        let settings = Settings::resolve(&SettingsOverrides::default(), None, env);
        assert_eq!(settings.api_endpoint(), Some("http://cells.local:3001"));
        assert_eq!(settings.cell_api_timeout_secs, 9);
        assert!((settings.conventional_max_delta - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_env_disabled_flag_clears_endpoint() {
        let env = env_from(&[
            (ENV_API_BASE_URL, "http://cells.local:3001"),
            (ENV_API_ENABLED, "FALSE"),
        ]);
        let settings = Settings::resolve(&SettingsOverrides::default(), None, env);
        assert!(!settings.cell_api_enabled());
    }

    #[test]
    fn test_invalid_env_number_is_ignored() {
        let env = env_from(&[(ENV_API_TIMEOUT, "soon")]);
        let settings = Settings::resolve(&SettingsOverrides::default(), None, env);
        assert_eq!(settings.cell_api_timeout_secs, 5);
    }

    #[test]
    fn test_stored_beats_env_and_override_beats_stored() {
        let stored = StoredSettings::from_toml_str(
            r#"
            [cell_api]
            endpoint = "http://stored:3001"
            timeout_secs = 12
            "#,
        )
        .unwrap();
        let env = env_from(&[
            (ENV_API_BASE_URL, "http://env:3001"),
            (ENV_API_TIMEOUT, "3"),
        ]);

        let settings = Settings::resolve(&SettingsOverrides::default(), Some(&stored), &env);
        assert_eq!(settings.api_endpoint(), Some("http://stored:3001"));
        assert_eq!(settings.cell_api_timeout_secs, 12);

        let overrides = SettingsOverrides {
            api_endpoint: Some("http://cli:3001".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(&overrides, Some(&stored), &env);
        assert_eq!(settings.api_endpoint(), Some("http://cli:3001"));
        assert_eq!(settings.cell_api_timeout_secs, 12);
    }

    #[test]
    fn test_overrides_beat_stored_and_env() {
        let stored = StoredSettings::from_toml_str(
            r#"
            [cell_api]
            endpoint = "http://stored:3001"
            timeout_secs = 12
            max_delta = 2.0
            "#,
        )
        .unwrap();
        let env = env_from(&[
            (ENV_API_BASE_URL, "http://env:3001"),
            (ENV_API_TIMEOUT, "3"),
            (ENV_MAX_DELTA, "4.0"),
        ]);
        let overrides = SettingsOverrides {
            api_endpoint: Some("http://cli:3001".to_string()),
            api_timeout_secs: Some(30),
        };

        let settings = Settings::resolve(&overrides, Some(&stored), &env);
        assert_eq!(settings.api_endpoint(), Some("http://cli:3001"));
        assert_eq!(settings.cell_api_timeout_secs, 30);
        assert!((settings.conventional_max_delta - 2.0).abs() < 1e-12);

        let settings = Settings::resolve(&overrides, None, &env);
        assert_eq!(settings.api_endpoint(), Some("http://cli:3001"));
        assert_eq!(settings.cell_api_timeout_secs, 30);
        assert!((settings.conventional_max_delta - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_blank_stored_endpoint_disables_api() {
        let stored = StoredSettings::from_toml_str(
            r#"
            [cell_api]
            endpoint = "   "
            "#,
        )
        .unwrap();
        let env = env_from(&[(ENV_API_BASE_URL, "http://env:3001")]);
        let settings = Settings::resolve(&SettingsOverrides::default(), Some(&stored), env);
        assert!(!settings.cell_api_enabled());
    }

    #[test]
    fn test_processing_section() {
        let stored = StoredSettings::from_toml_str(
            r#"
            [processing]
            wavelength = 1.5418
            indexing_tolerance = 0.2
            archive_max_depth = 4
            "#,
        )
        .unwrap();
        let settings = Settings::resolve(&SettingsOverrides::default(), Some(&stored), |_| None);
        assert!((settings.wavelength - 1.5418).abs() < 1e-12);
        assert!((settings.indexing_tolerance - 0.2).abs() < 1e-12);
        assert_eq!(settings.archive_max_depth, 4);
        assert_eq!(settings.archive_max_files, 100_000);
    }

    #[test]
    fn test_empty_config() {
        let stored = StoredSettings::from_toml_str("").unwrap();
        assert!(stored.cell_api.endpoint.is_none());
        assert!(stored.processing.wavelength.is_none());
    }
}
