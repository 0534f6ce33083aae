//! # formula 命令实现
//!
//! ## 依赖关系
//! - 使用 `cli/formula.rs` 定义的参数
//! - 使用 `chemistry/` 解析与比较化学式

use crate::cli::formula::{FormulaArgs, FormulaCommands, MatchArgs};
use scxrdkit::chemistry::{self, formula::format_counts, ElementCountMap};
use scxrdkit::error::{Result, ScxrdError};
use scxrdkit::utils::output;

use std::fs;
use tabled::{Table, Tabled};

/// 执行 formula 命令
pub fn execute(args: FormulaArgs) -> Result<()> {
    match args.command {
        FormulaCommands::Parse { formula, strict } => execute_parse(&formula, strict),
        FormulaCommands::Compare {
            formula1,
            formula2,
            tolerance,
        } => execute_compare(&formula1, &formula2, tolerance),
        FormulaCommands::Match(match_args) => execute_match(match_args),
    }
}

#[derive(Tabled)]
struct ElementRow {
    #[tabled(rename = "Element")]
    element: String,
    #[tabled(rename = "Count")]
    count: u64,
}

fn element_table(counts: &ElementCountMap) -> Table {
    Table::new(counts.iter().map(|(el, n)| ElementRow {
        element: el.clone(),
        count: *n,
    }))
}

fn execute_parse(formula: &str, strict: bool) -> Result<()> {
    let counts = if strict {
        chemistry::parse_strict(formula)?
    } else {
        chemistry::parse(formula)
    };

    if counts.is_empty() {
        output::print_warning(&format!("No elements found in '{}'", formula));
        return Ok(());
    }

    output::print_header("Formula");
    output::print_field("Input", formula);
    output::print_field("Normalized", &format_counts(&counts));
    println!("\n{}", element_table(&counts));
    Ok(())
}

fn execute_compare(formula1: &str, formula2: &str, tolerance: f64) -> Result<()> {
    let elements1 = chemistry::parse_safely(Some(formula1));
    let elements2 = chemistry::parse_safely(Some(formula2));

    output::print_header("Formula Comparison");
    output::print_field("Formula 1", &format_counts(&elements1));
    output::print_field("Formula 2", &format_counts(&elements2));
    output::print_field("Tolerance", &format!("{}%", tolerance));
    output::print_field(
        "Similarity",
        &format!("{:.4}", chemistry::formula_similarity_score(formula1, formula2)),
    );

    if chemistry::formulas_match(formula1, formula2, tolerance) {
        output::print_success("Formulas match within tolerance");
    } else {
        output::print_warning("Formulas do not match");
    }
    Ok(())
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Similarity")]
    score: String,
    #[tabled(rename = "Exact")]
    exact: String,
}

fn execute_match(args: MatchArgs) -> Result<()> {
    let mut candidates = args.candidates;
    if let Some(ref path) = args.file {
        let content = fs::read_to_string(path).map_err(|e| ScxrdError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        candidates.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string),
        );
    }

    if candidates.is_empty() {
        return Err(ScxrdError::InvalidArgument(
            "No candidate formulas given".to_string(),
        ));
    }

    let tolerance = args
        .tolerance
        .unwrap_or(chemistry::DEFAULT_TOLERANCE_PERCENT);
    let matches = chemistry::find_matching_formulas(&args.target, &candidates, Some(tolerance));

    output::print_header(&format!("Matches for {}", args.target));
    output::print_info(&format!(
        "{} of {} candidates within {}%",
        matches.len(),
        candidates.len(),
        tolerance
    ));

    if matches.is_empty() {
        return Ok(());
    }

    let rows: Vec<MatchRow> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| MatchRow {
            rank: i + 1,
            formula: m.formula.clone(),
            score: format!("{:.4}", m.similarity_score),
            exact: if m.is_exact_match { "yes" } else { "" }.to_string(),
        })
        .collect();
    println!("\n{}", Table::new(&rows));
    Ok(())
}
