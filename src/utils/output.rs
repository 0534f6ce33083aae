//! # 美化输出工具
//!
//! 提供统一的终端输出样式。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块使用
//! - 使用 `colored` crate、`tabled` 渲染表格

use crate::models::UnitCell;
use colored::Colorize;
use tabled::{Table, Tabled};

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// 打印对齐的键值行
pub fn print_field(key: &str, value: &str) {
    println!("  {:<22} {}", format!("{}:", key).dimmed(), value);
}

#[derive(Tabled)]
struct CellRow {
    #[tabled(rename = "a (Å)")]
    a: String,
    #[tabled(rename = "b (Å)")]
    b: String,
    #[tabled(rename = "c (Å)")]
    c: String,
    #[tabled(rename = "α (°)")]
    alpha: String,
    #[tabled(rename = "β (°)")]
    beta: String,
    #[tabled(rename = "γ (°)")]
    gamma: String,
    #[tabled(rename = "V (Å³)")]
    volume: String,
}

impl From<&UnitCell> for CellRow {
    fn from(cell: &UnitCell) -> Self {
        CellRow {
            a: format!("{:.4}", cell.a),
            b: format!("{:.4}", cell.b),
            c: format!("{:.4}", cell.c),
            alpha: format!("{:.3}", cell.alpha),
            beta: format!("{:.3}", cell.beta),
            gamma: format!("{:.3}", cell.gamma),
            volume: format!("{:.2}", cell.volume),
        }
    }
}

/// 以表格打印晶胞参数
pub fn print_cell(cell: &UnitCell) {
    println!("{}", Table::new([CellRow::from(cell)]));
}
