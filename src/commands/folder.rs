//! # folder 命令实现
//!
//! 处理一个解压后的实验目录，叠加用户坐标，可选计算孔板图像参考点。
//!
//! ## 依赖关系
//! - 使用 `cli/folder.rs` 定义的 FolderArgs
//! - 使用 `scxrd/processor.rs`、`models/folder.rs`

use crate::cli::folder::FolderArgs;
use scxrdkit::config::Settings;
use scxrdkit::error::Result;
use scxrdkit::models::{CoordinateOverrides, CrystalFolderResult, StagePosition, WellImageReference};
use scxrdkit::scxrd::{calculate_well_image_reference_point, ScxrdFolderProcessor};
use scxrdkit::utils::output;

use serde::Serialize;

/// `--json` 输出
#[derive(Debug, Serialize)]
struct FolderReport<'a> {
    #[serde(flatten)]
    result: &'a CrystalFolderResult,
    stage_position: StagePosition,
    well_image_reference: Option<WellImageReference>,
}

/// 执行 folder 命令
pub fn execute(args: FolderArgs, settings: &Settings) -> Result<()> {
    let mut processor = ScxrdFolderProcessor::from_settings(&args.dir, settings);
    if args.max_depth.is_some() || args.max_files.is_some() {
        processor = processor.with_limits(
            args.max_depth.unwrap_or(settings.archive_max_depth),
            args.max_files.unwrap_or(settings.archive_max_files),
        );
    }

    let result = processor.process()?;

    let overrides = CoordinateOverrides {
        x: args.x.clone(),
        y: args.y.clone(),
        z: args.z.clone(),
    };
    let position = overrides.apply(&result)?;
    let reference = well_reference(&args, &position);

    if args.json {
        let report = FolderReport {
            result: &result,
            stage_position: position,
            well_image_reference: reference,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&args, &result, &position, reference.as_ref());
    Ok(())
}

fn well_reference(args: &FolderArgs, position: &StagePosition) -> Option<WellImageReference> {
    let (width, height) = args.well_image?;
    match (position.x_mm, position.y_mm, position.z_mm) {
        (Some(x), Some(y), Some(z)) => Some(calculate_well_image_reference_point(
            x,
            y,
            z,
            width,
            height,
            args.pixel_size,
        )),
        _ => {
            output::print_warning("Well image reference needs x, y and z coordinates");
            None
        }
    }
}

fn format_mm(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4} mm", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_report(
    args: &FolderArgs,
    result: &CrystalFolderResult,
    position: &StagePosition,
    reference: Option<&WellImageReference>,
) {
    output::print_header("Experiment Folder");
    output::print_field("Directory", &args.dir.display().to_string());
    if result.truncated_walk {
        output::print_warning("Directory walk stopped at the file limit; results may be incomplete");
    }

    match (&result.cell, result.cell_source) {
        (Some(cell), source) => {
            let source = source.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
            output::print_field("Cell source", &source);
            println!();
            output::print_cell(cell);
            println!();
        }
        (None, _) => output::print_warning("No unit cell found"),
    }

    output::print_field("Stage x", &format_mm(position.x_mm));
    output::print_field("Stage y", &format_mm(position.y_mm));
    output::print_field("Stage z", &format_mm(position.z_mm));

    let measured = result
        .measured_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    output::print_field("Measured at", &measured);

    let path_or_dash = |p: Option<&std::path::PathBuf>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    output::print_field("Peak table", &path_or_dash(result.peak_table.as_ref()));
    output::print_field("Crystal image", &path_or_dash(result.crystal_image.as_ref()));
    output::print_field(
        "Diffraction frames",
        &result.diffraction_frames.len().to_string(),
    );

    match &result.structure_file {
        Some(s) => output::print_field(
            "Structure",
            &format!(
                "{} ({} reflections, R1 {:.4})",
                s.path.display(),
                s.reflections_all,
                s.r1_all
            ),
        ),
        None => output::print_field("Structure", "-"),
    }

    if let Some(r) = reference {
        output::print_separator();
        output::print_info("Well image reference point");
        output::print_field("x", &format!("{:.4} mm", r.x_mm));
        output::print_field("y", &format!("{:.4} mm", r.y_mm));
        output::print_field("z", &format!("{:.4} mm", r.z_mm));
        output::print_field("Pixel size", &format!("{} mm", r.pixel_size_mm));
    }
}
