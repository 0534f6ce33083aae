//! # cell 命令实现
//!
//! - `from-ub`: 本地计算
//! - `conventional` / `primitive` / `distance` / `similar`: 调用外部晶胞 API
//!
//! ## 依赖关系
//! - 使用 `cli/cell.rs` 定义的参数
//! - 使用 `lattice/ub_matrix.rs`、`api/`
//! - 使用 `utils/progress.rs` 在等待 API 时显示 spinner

use crate::cli::cell::{parse_wavelength, CellArgs, CellCommands, ConventionalSelect, SimilarArgs};
use scxrdkit::api::conventional::ConventionalCellClient;
use scxrdkit::api::g6::{DatasetCell, G6DistanceClient};
use scxrdkit::api::primitive::{PrimitiveCellClient, PRIMITIVE_TOLERANCE};
use scxrdkit::api::ConventionalCell;
use scxrdkit::config::Settings;
use scxrdkit::error::{Result, ScxrdError};
use scxrdkit::lattice::ub_values_to_cell_parameters;
use scxrdkit::models::CellParams;
use scxrdkit::utils::{output, progress};

use std::fs;
use tabled::{Table, Tabled};

/// 执行 cell 命令
pub fn execute(args: CellArgs, settings: &Settings) -> Result<()> {
    match args.command {
        CellCommands::FromUb { ub, wavelength } => {
            execute_from_ub(ub, wavelength.as_deref(), settings)
        }
        CellCommands::Conventional {
            cell,
            max_delta,
            select,
        } => execute_conventional(&cell, max_delta, select, settings),
        CellCommands::Primitive { cell } => execute_primitive(&cell, settings),
        CellCommands::Distance { reference, against } => {
            execute_distance(&reference, &against, settings)
        }
        CellCommands::Similar(similar_args) => execute_similar(similar_args, settings),
    }
}

fn require_endpoint(settings: &Settings) -> Result<()> {
    if settings.cell_api_enabled() {
        Ok(())
    } else {
        Err(ScxrdError::ConfigError(
            "No cell API endpoint configured (use --api-endpoint or CONVENTIONAL_CELL_API_BASE_URL)"
                .to_string(),
        ))
    }
}

fn unavailable(available: bool) -> ScxrdError {
    if available {
        ScxrdError::ApiResponse("the cell API returned no usable result".to_string())
    } else {
        ScxrdError::ApiResponse("the cell API is not reachable".to_string())
    }
}

// ─────────────────────────────────────────────────────────────
// UB → 晶胞
// ─────────────────────────────────────────────────────────────

fn execute_from_ub(ub: Vec<f64>, wavelength: Option<&str>, settings: &Settings) -> Result<()> {
    let count = ub.len();
    let values: [f64; 9] = ub.try_into().map_err(|_| {
        ScxrdError::InvalidArgument(format!("UB matrix needs 9 values, got {}", count))
    })?;

    let wavelength = match wavelength {
        Some(input) => parse_wavelength(input).map_err(ScxrdError::InvalidArgument)?,
        None => settings.wavelength,
    };

    let cell = ub_values_to_cell_parameters(&values, wavelength).ok_or_else(|| {
        ScxrdError::InvalidArgument(
            "UB matrix is singular or the wavelength is not positive".to_string(),
        )
    })?;

    output::print_header("Unit Cell from UB Matrix");
    output::print_field("Wavelength", &format!("{:.5} Å", wavelength));
    println!();
    output::print_cell(&cell);
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// 惯用晶胞 / 原胞
// ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ConventionalRow {
    #[tabled(rename = "Bravais")]
    bravais: String,
    #[tabled(rename = "cb_op")]
    cb_op: String,
    #[tabled(rename = "a")]
    a: String,
    #[tabled(rename = "b")]
    b: String,
    #[tabled(rename = "c")]
    c: String,
    #[tabled(rename = "α")]
    alpha: String,
    #[tabled(rename = "β")]
    beta: String,
    #[tabled(rename = "γ")]
    gamma: String,
    #[tabled(rename = "V")]
    volume: String,
    #[tabled(rename = "Distance")]
    distance: String,
}

impl From<&ConventionalCell> for ConventionalRow {
    fn from(c: &ConventionalCell) -> Self {
        ConventionalRow {
            bravais: c.bravais.clone().unwrap_or_else(|| "-".to_string()),
            cb_op: c.cb_op.clone().unwrap_or_else(|| "-".to_string()),
            a: format!("{:.4}", c.cell.a),
            b: format!("{:.4}", c.cell.b),
            c: format!("{:.4}", c.cell.c),
            alpha: format!("{:.3}", c.cell.alpha),
            beta: format!("{:.3}", c.cell.beta),
            gamma: format!("{:.3}", c.cell.gamma),
            volume: format!("{:.2}", c.cell.volume),
            distance: format!("{:.4}", c.distance),
        }
    }
}

fn execute_conventional(
    cell: &CellParams,
    max_delta: Option<f64>,
    select: ConventionalSelect,
    settings: &Settings,
) -> Result<()> {
    require_endpoint(settings)?;
    let client = ConventionalCellClient::from_settings(settings);

    let spinner = progress::create_spinner("Requesting conventional cells");
    let cells: Option<Vec<ConventionalCell>> = match select {
        ConventionalSelect::All => client.convert_to_conventional(cell, max_delta),
        ConventionalSelect::Best => client.best_conventional_cell(cell, max_delta).map(|c| vec![c]),
        ConventionalSelect::AsInput => client
            .conventional_cell_as_input(cell, max_delta)
            .map(|c| vec![c]),
    };
    spinner.finish_and_clear();

    let cells = cells.ok_or_else(|| unavailable(client.api_available()))?;

    output::print_header("Conventional Cell");
    let rows: Vec<ConventionalRow> = cells.iter().map(ConventionalRow::from).collect();
    println!("{}", Table::new(&rows));
    Ok(())
}

fn execute_primitive(cell: &CellParams, settings: &Settings) -> Result<()> {
    require_endpoint(settings)?;
    let client = PrimitiveCellClient::from_settings(settings);

    let spinner = progress::create_spinner("Requesting primitive cell");
    let primitive = client.ensure_primitive(cell);
    let already_primitive = primitive.is_some() && client.is_primitive(cell, PRIMITIVE_TOLERANCE);
    spinner.finish_and_clear();

    let primitive = primitive.ok_or_else(|| {
        ScxrdError::InvalidArgument("all six cell parameters must be positive".to_string())
    })?;

    output::print_header("Primitive Cell");
    output::print_cell(&primitive);
    if already_primitive {
        output::print_info("Input cell is already primitive");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// G6 距离
// ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DistanceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Cell")]
    cell: String,
    #[tabled(rename = "G6 distance")]
    distance: String,
}

fn format_params(cell: &CellParams) -> String {
    cell.to_api_array()
        .map(|v| {
            v.iter()
                .map(|x| format!("{}", x))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| "invalid".to_string())
}

fn execute_distance(reference: &CellParams, against: &[CellParams], settings: &Settings) -> Result<()> {
    require_endpoint(settings)?;
    let client = G6DistanceClient::from_settings(settings);

    let spinner = progress::create_spinner("Computing G6 distances");
    let distances = match against {
        [single] => client
            .calculate_distance(reference, single)
            .map(|d| vec![Some(d)]),
        _ => client.calculate_distances(reference, against),
    };
    spinner.finish_and_clear();

    let distances = distances.ok_or_else(|| unavailable(client.api_available()))?;

    output::print_header("G6 Distance");
    output::print_field("Reference", &format_params(reference));
    let rows: Vec<DistanceRow> = against
        .iter()
        .zip(distances.iter())
        .enumerate()
        .map(|(i, (cell, d))| DistanceRow {
            index: i + 1,
            cell: format_params(cell),
            distance: d.map(|d| format!("{:.4}", d)).unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("\n{}", Table::new(&rows));
    Ok(())
}

#[derive(Tabled)]
struct SimilarRow {
    #[tabled(rename = "Dataset")]
    dataset: u64,
    #[tabled(rename = "Similar to")]
    other: u64,
    #[tabled(rename = "G6 distance")]
    distance: String,
}

fn execute_similar(args: SimilarArgs, settings: &Settings) -> Result<()> {
    require_endpoint(settings)?;

    let content = fs::read_to_string(&args.datasets).map_err(|e| ScxrdError::FileReadError {
        path: args.datasets.display().to_string(),
        source: e,
    })?;
    let datasets: Vec<DatasetCell> = serde_json::from_str(&content)?;
    let tolerance = args.tolerance.unwrap_or(settings.similarity_tolerance);
    let client = G6DistanceClient::from_settings(settings);

    output::print_header("Similar Unit Cells");
    output::print_info(&format!(
        "{} datasets, tolerance {}",
        datasets.len(),
        tolerance
    ));

    let reference = match args.target {
        Some(target) => Some(datasets.iter().find(|d| d.id == target).ok_or_else(|| {
            ScxrdError::InvalidArgument(format!("Dataset {} not found", target))
        })?),
        None => None,
    };

    let spinner = progress::create_spinner("Comparing cells");
    let rows: Vec<SimilarRow> = match reference {
        Some(reference) => {
            let target = reference.id;
            let others: Vec<DatasetCell> =
                datasets.iter().filter(|d| d.id != target).cloned().collect();
            let records =
                client.similarity_records_for(reference, &others, settings.max_stored_distance);
            let similar = client.find_similar_datasets(reference, &others, tolerance);
            spinner.finish_and_clear();
            output::print_info(&format!(
                "{} similarity records to store (distance ≤ {})",
                records.len(),
                settings.max_stored_distance
            ));

            similar
                .iter()
                .map(|s| SimilarRow {
                    dataset: target,
                    other: s.dataset_id,
                    distance: format!("{:.4}", s.distance),
                })
                .collect()
        }
        None => {
            let all = client.calculate_all_similarities(&datasets, tolerance);
            spinner.finish_and_clear();
            all.iter()
                .flat_map(|(id, hits)| {
                    hits.iter().map(move |h| SimilarRow {
                        dataset: *id,
                        other: h.dataset_id,
                        distance: format!("{:.4}", h.distance),
                    })
                })
                .collect()
        }
    };

    if rows.is_empty() {
        if !client.api_available() {
            output::print_warning("The cell API is not reachable");
        }
        output::print_warning("No similar datasets found");
        return Ok(());
    }
    println!("\n{}", Table::new(&rows));
    Ok(())
}
