//! # peaks 命令实现
//!
//! 解码二进制峰表，并用 UB 矩阵统计被指标化的衍射点。
//!
//! ## 功能
//! - 单文件与目录批量解码（rayon 并行）
//! - 导出 CSV
//! - 指标化结果导出 CSV 与投影散点图 (PNG/SVG)
//!
//! ## 依赖关系
//! - 使用 `cli/peaks.rs` 定义的参数
//! - 使用 `batch/` 进行批量处理
//! - 使用 `parsers/peak_table.rs`、`lattice/`、`export/`

use crate::cli::peaks::{DecodeArgs, IndexArgs, PeaksArgs, PeaksCommands, ProjectionArg};
use scxrdkit::batch::{BatchRunner, FileCollector, ProcessResult};
use scxrdkit::config::Settings;
use scxrdkit::error::{Result, ScxrdError};
use scxrdkit::export::{self, Projection};
use scxrdkit::lattice::{calculate_indexed_spots, mark_indexed, matrix};
use scxrdkit::models::{AxisStatistics, PeakStatistics};
use scxrdkit::parsers::peak_table::{self, PeakTableOutcome};
use scxrdkit::utils::output;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 执行 peaks 命令
pub fn execute(args: PeaksArgs, settings: &Settings) -> Result<()> {
    match args.command {
        PeaksCommands::Decode(decode_args) => execute_decode(&decode_args),
        PeaksCommands::Index(index_args) => execute_index(&index_args, settings),
    }
}

// ─────────────────────────────────────────────────────────────
// 解码
// ─────────────────────────────────────────────────────────────

fn execute_decode(args: &DecodeArgs) -> Result<()> {
    output::print_header("Peak Table Decoding");

    if args.input.is_file() {
        decode_single_file(args)
    } else if args.input.is_dir() {
        decode_batch(args)
    } else {
        Err(ScxrdError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 解码失败且没有任何点时视为错误，部分解码只给出警告
fn read_peak_table(path: &Path) -> Result<PeakTableOutcome> {
    let outcome = peak_table::parse_file(path)?;
    if outcome.data_points.is_empty() {
        if let Some(ref err) = outcome.error {
            return Err(ScxrdError::ParseError {
                format: "peak table".to_string(),
                path: path.display().to_string(),
                reason: err.clone(),
            });
        }
    } else if !outcome.success {
        output::print_warning(&format!(
            "{}: {}",
            path.display(),
            outcome.error.as_deref().unwrap_or("partially decoded")
        ));
    }
    Ok(outcome)
}

#[derive(Tabled)]
struct AxisRow {
    #[tabled(rename = "Axis")]
    axis: &'static str,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
    #[tabled(rename = "Median")]
    median: String,
}

fn axis_row(axis: &'static str, s: &AxisStatistics) -> AxisRow {
    AxisRow {
        axis,
        min: format!("{:.4}", s.min),
        max: format!("{:.4}", s.max),
        mean: format!("{:.4}", s.mean),
        std: format!("{:.4}", s.std),
        median: format!("{:.4}", s.median),
    }
}

fn print_statistics(stats: &PeakStatistics) {
    let rows = vec![
        axis_row("x", &stats.x),
        axis_row("y", &stats.y),
        axis_row("z", &stats.z),
        axis_row("r", &stats.r),
        axis_row("i", &stats.i),
    ];
    println!("{}", Table::new(&rows));
}

fn decode_single_file(args: &DecodeArgs) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", args.input.display()));

    let outcome = read_peak_table(&args.input)?;
    output::print_field("Points", &outcome.data_points.len().to_string());
    if let Some(ref meta) = outcome.metadata {
        output::print_field("File size", &format!("{} bytes", meta.file_size));
        output::print_field("Declared chunks", &meta.declared_chunks.to_string());
    }
    println!();

    match outcome.statistics {
        Some(ref stats) => print_statistics(stats),
        None => output::print_warning("Statistics unavailable"),
    }

    if let Some(ref csv_path) = args.csv {
        export::points_to_csv(&outcome.data_points, None, csv_path)?;
        output::print_success(&format!("Points written to '{}'", csv_path.display()));
    }
    Ok(())
}

/// 批量模式中单个峰表的摘要
#[derive(Debug, Clone, Serialize, Tabled)]
struct PeakTableSummary {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Points")]
    points: usize,
    #[tabled(rename = "Complete")]
    complete: bool,
    #[tabled(rename = "Mean r")]
    mean_r: String,
    #[tabled(rename = "Max i")]
    max_i: String,
}

fn summarize(path: &Path) -> ProcessResult<PeakTableSummary> {
    let outcome = match peak_table::parse_file(path) {
        Ok(outcome) => outcome,
        Err(e) => return ProcessResult::Failed(path.to_path_buf(), e.to_string()),
    };
    if outcome.data_points.is_empty() {
        let reason = outcome.error.unwrap_or_else(|| "no points".to_string());
        return ProcessResult::Skipped(path.to_path_buf(), reason);
    }

    let (mean_r, max_i) = match outcome.statistics {
        Some(ref s) => (format!("{:.4}", s.r.mean), format!("{:.0}", s.i.max)),
        None => ("-".to_string(), "-".to_string()),
    };

    ProcessResult::Success(
        path.to_path_buf(),
        PeakTableSummary {
            file: path.display().to_string(),
            points: outcome.data_points.len(),
            complete: outcome.success,
            mean_r,
            max_i,
        },
    )
}

fn decode_batch(args: &DecodeArgs) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive)
        .collect()?;
    output::print_info(&format!("Found {} peak tables", files.len()));

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file: &PathBuf| summarize(file))?;

    let rows: Vec<&PeakTableSummary> = result.outputs.iter().map(|(_, s)| s).collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows.iter().copied()));
    }

    if let Some(ref csv_path) = args.csv {
        let mut wtr = csv::Writer::from_path(csv_path)?;
        for summary in &rows {
            wtr.serialize(summary)?;
        }
        wtr.flush().map_err(|e| ScxrdError::FileWriteError {
            path: csv_path.display().to_string(),
            source: e,
        })?;
        output::print_success(&format!("Summary written to '{}'", csv_path.display()));
    }

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} success, {} skipped, {} failed",
        result.success(),
        result.skipped.len(),
        result.failed()
    ));

    for (path, reason) in &result.skipped {
        output::print_warning(&format!("  {}: {}", path.display(), reason));
    }
    if !result.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path.display(), err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────
// 指标化
// ─────────────────────────────────────────────────────────────

impl From<ProjectionArg> for Projection {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::Xy => Projection::Xy,
            ProjectionArg::Xz => Projection::Xz,
            ProjectionArg::Yz => Projection::Yz,
        }
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

fn execute_index(args: &IndexArgs, settings: &Settings) -> Result<()> {
    output::print_header("Peak Indexing");

    let count = args.ub.len();
    let values: [f64; 9] = args.ub.clone().try_into().map_err(|_| {
        ScxrdError::InvalidArgument(format!("UB matrix needs 9 values, got {}", count))
    })?;
    let ub = matrix::from_row_major(&values);
    let tolerance = args.tolerance.unwrap_or(settings.indexing_tolerance);

    let outcome = read_peak_table(&args.input)?;
    let points = &outcome.data_points;

    let result = calculate_indexed_spots(points, Some(&ub), tolerance);
    output::print_field("Tolerance", &tolerance.to_string());
    output::print_field("Total spots", &result.total_count.to_string());
    output::print_field("Indexed spots", &result.indexed_count.to_string());
    output::print_field("Indexing rate", &format!("{:.2}%", result.indexing_rate));
    if result.total_count > 0 && result.indexed_count == 0 && matrix::inverse(&ub).is_none() {
        output::print_warning("UB matrix is singular");
    }

    if let Some(ref csv_path) = args.csv {
        export::indexed_spots_to_csv(&result, csv_path)?;
        output::print_success(&format!("Indexed spots written to '{}'", csv_path.display()));
    }

    if let Some(ref plot_path) = args.plot {
        let mut flags = Vec::new();
        let flags = if mark_indexed(points, &mut flags, Some(&ub), tolerance) {
            Some(flags.as_slice())
        } else {
            None
        };
        let title = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "peaks".to_string());

        export::generate_projection_plot(
            points,
            flags,
            args.projection.into(),
            plot_path,
            &title,
            args.width,
            args.height,
            is_svg(plot_path),
        )?;
        output::print_success(&format!("Plot written to '{}'", plot_path.display()));
    }

    Ok(())
}
