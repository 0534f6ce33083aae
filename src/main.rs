//! # scxrdkit - 单晶衍射数据处理工具
//!
//! 把库中的解析与计算功能以子命令形式暴露出来。
//!
//! ## 子命令
//! - `formula` - 分子式解析、比较与匹配
//! - `cell`    - 晶胞工具
//!   - `from-ub`      - UB 矩阵 → 晶胞参数
//!   - `conventional` - 惯用晶胞（外部 API）
//!   - `primitive`    - 原胞（外部 API）
//!   - `distance`     - G6 距离（外部 API）
//!   - `similar`      - 相似晶胞搜索（外部 API）
//! - `peaks`   - 峰表解码与指标化
//! - `folder`  - 处理解压后的实验目录
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   └── commands/   (命令执行逻辑)
//!         └── scxrdkit (库：解析器、晶格计算、API 客户端)
//! ```

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use scxrdkit::config::{Settings, SettingsOverrides, StoredSettings, DEFAULT_CONFIG_FILE};
use scxrdkit::utils::output;
use std::path::PathBuf;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let stored = match load_stored_settings(cli.config.clone()) {
        Ok(stored) => stored,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let overrides = SettingsOverrides {
        api_endpoint: cli.api_endpoint.clone(),
        api_timeout_secs: cli.api_timeout,
    };
    let settings = Settings::resolve(&overrides, stored.as_ref(), |key| std::env::var(key).ok());
    log::debug!("Resolved settings: {:?}", settings);

    if let Err(e) = commands::run(cli.command, &settings) {
        output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

/// 显式指定的配置文件必须存在；默认文件不存在时忽略
fn load_stored_settings(explicit: Option<PathBuf>) -> anyhow::Result<Option<StoredSettings>> {
    match explicit {
        Some(path) => StoredSettings::from_file(&path).map(Some),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                StoredSettings::from_file(&default).map(Some)
            } else {
                Ok(None)
            }
        }
    }
}
