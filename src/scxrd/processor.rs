//! # 实验目录处理器
//!
//! 对一个解压后的衍射实验目录依次执行：
//! 1. crystal.ini → 晶胞（首选 `expinfo/` 下的文件；多个文件时最新修改的优先）
//! 2. 若 1 无结果，扫描 `.par` 文件中的晶胞块
//! 3. cmdscript.mac → 台面坐标（与晶胞来源相互独立）
//! 4. datacoll.ini → 测量开始时间
//! 5. 峰表、衍射帧、晶体照片、结构文件的定位
//!
//! 任何单个文件缺失或格式错误都只记录日志，不会中断处理。
//!
//! ## 依赖关系
//! - 被 `commands/folder.rs` 使用
//! - 使用 `scxrd/archive.rs`、`parsers/`、`models/folder.rs`

use super::archive::{ArchiveEntry, ArchiveIndex};
use crate::config::Settings;
use crate::error::Result;
use crate::models::{
    CellSource, CrystalFolderResult, DiffractionFrame, StructureFile, UnitCell,
    WellImageReference,
};
use crate::parsers::{cmdscript, crystal_ini, datacoll, par, res};
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

/// 默认遍历深度上限
pub const DEFAULT_MAX_DEPTH: usize = 12;

/// 默认遍历条目上限
pub const DEFAULT_MAX_FILES: usize = 100_000;

/// 孔板相机默认像素尺寸 (mm)
pub const DEFAULT_PIXEL_SIZE_MM: f64 = 0.0019;

const PRE_PREFIX: &str = "pre_";
const WIT_PREFIX: &str = "wit_";

fn frame_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.+)_(\d+)_(\d+)\.rodhypix$").expect("valid frame pattern"))
}

/// 实验目录处理器
pub struct ScxrdFolderProcessor {
    root: PathBuf,
    max_depth: usize,
    max_files: usize,
}

impl ScxrdFolderProcessor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// 按配置设置遍历上限
    pub fn from_settings(root: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self::new(root).with_limits(settings.archive_max_depth, settings.archive_max_files)
    }

    pub fn with_limits(mut self, max_depth: usize, max_files: usize) -> Self {
        self.max_depth = max_depth;
        self.max_files = max_files;
        self
    }

    /// 处理目录；只有根目录不存在时返回错误
    pub fn process(&self) -> Result<CrystalFolderResult> {
        let index = ArchiveIndex::build(&self.root, self.max_depth, self.max_files)?;
        info!(
            "Processing {} ({} files indexed)",
            self.root.display(),
            index.entries().len()
        );

        let mut result = CrystalFolderResult {
            truncated_walk: index.is_truncated(),
            ..Default::default()
        };

        if let Some(cell) = find_crystal_ini_cell(&index) {
            result.cell = Some(cell);
            result.cell_source = Some(CellSource::CrystalIni);
        } else if let Some(cell) = find_par_cell(&index) {
            result.cell = Some(cell);
            result.cell_source = Some(CellSource::Par);
        } else {
            warn!("No unit cell found in crystal.ini or .par files");
        }

        if let Some(coords) = find_stage_coordinates(&index) {
            result.real_world_x_mm = Some(coords.x_mm);
            result.real_world_y_mm = Some(coords.y_mm);
            result.real_world_z_mm = Some(coords.z_mm);
        }

        result.measured_at = find_measurement_time(&index);
        result.peak_table = find_peak_table(&index);
        result.diffraction_frames = find_diffraction_frames(&index);
        result.crystal_image = index
            .named_in("movie", "*.jpg")
            .first()
            .map(|e| e.path.clone());
        result.structure_file = find_structure_file(&index);

        Ok(result)
    }
}

/// 由图像中心坐标和像素尺寸计算孔板图像左上角参考点
pub fn calculate_well_image_reference_point(
    center_x_mm: f64,
    center_y_mm: f64,
    center_z_mm: f64,
    pixel_width: u32,
    pixel_height: u32,
    pixel_size_mm: Option<f64>,
) -> WellImageReference {
    let pixel_size = pixel_size_mm.unwrap_or(DEFAULT_PIXEL_SIZE_MM);
    let half_width = (pixel_width as f64 * pixel_size) / 2.0;
    let half_height = (pixel_height as f64 * pixel_size) / 2.0;

    // 图像坐标 y 向下增长
    WellImageReference {
        x_mm: center_x_mm - half_width,
        y_mm: center_y_mm - half_height,
        z_mm: center_z_mm,
        pixel_size_mm: pixel_size,
    }
}

// ─────────────────────────────────────────────────────────────
// 晶胞
// ─────────────────────────────────────────────────────────────

fn without_prefix<'a>(entries: Vec<&'a ArchiveEntry>, prefix: &str) -> Vec<&'a ArchiveEntry> {
    entries.into_iter().filter(|e| !e.has_prefix(prefix)).collect()
}

fn find_crystal_ini_cell(index: &ArchiveIndex) -> Option<UnitCell> {
    let mut candidates = without_prefix(index.named_in("expinfo", "*crystal.ini"), PRE_PREFIX);
    if candidates.is_empty() {
        candidates = without_prefix(index.named("*crystal.ini"), PRE_PREFIX);
    }
    if candidates.is_empty() {
        debug!("No crystal.ini files found");
        return None;
    }

    let mut parsed: Vec<(SystemTime, &Path, UnitCell)> = candidates
        .into_iter()
        .filter_map(|entry| match crystal_ini::parse_crystal_ini_file(&entry.path) {
            Ok(Some(cell)) => Some((
                entry.modified.unwrap_or(SystemTime::UNIX_EPOCH),
                entry.path.as_path(),
                cell,
            )),
            Ok(None) => None,
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect();

    // 最旧的在前，较新的文件覆盖冲突值
    parsed.sort_by_key(|(modified, _, _)| *modified);

    let mut merged: Option<(&Path, UnitCell)> = None;
    for (_, path, cell) in parsed {
        if let Some((previous_path, previous)) = merged {
            if previous != cell {
                info!(
                    "Cell conflict: {} ({}) superseded by newer {} ({})",
                    previous,
                    previous_path.display(),
                    cell,
                    path.display()
                );
            }
        }
        merged = Some((path, cell));
    }

    merged.map(|(_, cell)| cell)
}

fn find_par_cell(index: &ArchiveIndex) -> Option<UnitCell> {
    index
        .named("*.par")
        .into_iter()
        .find_map(|entry| match par::parse_par_file(&entry.path) {
            Ok(Some(cell)) => {
                info!("Using cell from {}", entry.path.display());
                Some(cell)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
}

// ─────────────────────────────────────────────────────────────
// 坐标与时间
// ─────────────────────────────────────────────────────────────

fn find_stage_coordinates(index: &ArchiveIndex) -> Option<cmdscript::StageCoordinates> {
    let entry = index.named("cmdscript.mac").into_iter().next()?;
    match cmdscript::parse_cmdscript_file(&entry.path) {
        Ok(coords) => coords,
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

fn find_measurement_time(index: &ArchiveIndex) -> Option<chrono::NaiveDateTime> {
    let candidates = without_prefix(index.named_in("expinfo", "*datacoll.ini"), PRE_PREFIX);
    let entry = candidates
        .iter()
        .find(|e| e.has_prefix(WIT_PREFIX))
        .or_else(|| candidates.first())?;

    match datacoll::parse_datacoll_file(&entry.path) {
        Ok(time) => time,
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 数据文件定位
// ─────────────────────────────────────────────────────────────

fn find_peak_table(index: &ArchiveIndex) -> Option<PathBuf> {
    let candidates = without_prefix(index.named("*.tabbin"), PRE_PREFIX);

    let by_suffix = |suffix: &str| {
        candidates
            .iter()
            .find(|e| e.file_name_lower().ends_with(suffix))
            .copied()
    };

    let chosen = by_suffix("_peakhunt.tabbin")
        .or_else(|| by_suffix("_proffitpeak.tabbin"))
        .or_else(|| candidates.first().copied())?;

    info!("Using peak table {}", chosen.path.display());
    Some(chosen.path.clone())
}

fn find_diffraction_frames(index: &ArchiveIndex) -> Vec<DiffractionFrame> {
    let all = index.named_in("frames", "*.rodhypix");

    let mut selected: Vec<&ArchiveEntry> = all
        .iter()
        .copied()
        .filter(|e| !e.has_prefix(PRE_PREFIX) && !e.has_prefix(WIT_PREFIX))
        .collect();
    if selected.is_empty() {
        selected = all.iter().copied().filter(|e| !e.has_prefix(PRE_PREFIX)).collect();
    }
    if selected.is_empty() {
        selected = all;
    }

    let re = frame_name_regex();

    let mut frames: Vec<DiffractionFrame> = selected
        .into_iter()
        .filter_map(|entry| {
            let name = entry.path.file_name()?.to_string_lossy().to_string();
            let Some(caps) = re.captures(&name) else {
                warn!("Frame name '{}' does not match <name>_<run>_<image>.rodhypix", name);
                return None;
            };
            Some(DiffractionFrame {
                path: entry.path.clone(),
                run: caps[2].parse().ok()?,
                image: caps[3].parse().ok()?,
                size_bytes: entry.size,
            })
        })
        .collect();

    frames.sort_by_key(|f| (f.run, f.image));
    debug!("Found {} diffraction frames", frames.len());
    frames
}

fn find_structure_file(index: &ArchiveIndex) -> Option<StructureFile> {
    index
        .named_under("struct", "*.res")
        .into_iter()
        .filter_map(|entry| {
            let summary = match res::parse_res_file(&entry.path) {
                Ok(summary) => summary,
                Err(e) => {
                    warn!("{}", e);
                    return None;
                }
            };
            if !summary.passes_quality() {
                debug!(
                    "{} rejected (reflections {:?}, R1 {:?})",
                    entry.path.display(),
                    summary.reflections_all,
                    summary.r1_all
                );
                return None;
            }
            Some(StructureFile {
                path: entry.path.clone(),
                reflections_all: summary.reflections_all?,
                r1_all: summary.r1_all?,
                size_bytes: entry.size,
            })
        })
        .max_by_key(|s| s.size_bytes)
}
