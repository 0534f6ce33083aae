//! # 倒易空间散点图
//!
//! 使用 `plotters` 把反射点云投影到 XY / XZ / YZ 平面绘制散点图，
//! 被指标化的点用不同颜色标出。支持 PNG 和 SVG 输出。
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs` 调用
//! - 使用 `models/reflection.rs`
//! - 使用 `plotters` 渲染图表

use crate::error::{Result, ScxrdError};
use crate::models::ReflectionPoint;

use plotters::prelude::*;
use std::path::Path;
use std::str::FromStr;

/// 投影平面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Xy,
    Xz,
    Yz,
}

impl Projection {
    fn coords(&self, p: &ReflectionPoint) -> (f64, f64) {
        match self {
            Projection::Xy => (p.x, p.y),
            Projection::Xz => (p.x, p.z),
            Projection::Yz => (p.y, p.z),
        }
    }

    fn axis_labels(&self) -> (&'static str, &'static str) {
        match self {
            Projection::Xy => ("x (Å⁻¹)", "y (Å⁻¹)"),
            Projection::Xz => ("x (Å⁻¹)", "z (Å⁻¹)"),
            Projection::Yz => ("y (Å⁻¹)", "z (Å⁻¹)"),
        }
    }
}

impl FromStr for Projection {
    type Err = ScxrdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "xy" => Ok(Projection::Xy),
            "xz" => Ok(Projection::Xz),
            "yz" => Ok(Projection::Yz),
            other => Err(ScxrdError::InvalidArgument(format!(
                "Unknown projection '{}' (expected xy, xz or yz)",
                other
            ))),
        }
    }
}

/// 生成散点图；`flags[i]` 为 true 的点绘制为已指标化
#[allow(clippy::too_many_arguments)]
pub fn generate_projection_plot(
    points: &[ReflectionPoint],
    flags: Option<&[bool]>,
    projection: Projection,
    output_path: &Path,
    title: &str,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if points.is_empty() {
        return Err(ScxrdError::InvalidArgument(
            "No reflection points to plot".to_string(),
        ));
    }

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_projection(&root, points, flags, projection, title)?;
        root.present()
            .map_err(|e| ScxrdError::Other(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_projection(&root, points, flags, projection, title)?;
        root.present()
            .map_err(|e| ScxrdError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 坐标范围，两端各留 5% 余量
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (-1.0, 1.0);
    }
    let span = (max - min).max(1e-6);
    (min - span * 0.05, max + span * 0.05)
}

fn draw_projection<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    points: &[ReflectionPoint],
    flags: Option<&[bool]>,
    projection: Projection,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| ScxrdError::Other(format!("{:?}", e)))?;

    let coords: Vec<(f64, f64)> = points.iter().map(|p| projection.coords(p)).collect();
    let (x_min, x_max) = padded_range(coords.iter().map(|c| c.0));
    let (y_min, y_max) = padded_range(coords.iter().map(|c| c.1));
    let (x_desc, y_desc) = projection.axis_labels();

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| ScxrdError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| ScxrdError::Other(format!("{:?}", e)))?;

    let flags = flags.filter(|f| f.len() == points.len());
    let is_indexed = |i: usize| flags.map(|f| f[i]).unwrap_or(false);

    let other_color = RGBColor(150, 150, 150).mix(0.6);
    let indexed_color = RGBColor(204, 51, 0);

    chart
        .draw_series(
            coords
                .iter()
                .enumerate()
                .filter(|(i, _)| !is_indexed(*i))
                .map(|(_, c)| Circle::new(*c, 2, other_color.filled())),
        )
        .map_err(|e| ScxrdError::Other(format!("{:?}", e)))?;

    if flags.is_some() {
        chart
            .draw_series(
                coords
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| is_indexed(*i))
                    .map(|(_, c)| Circle::new(*c, 3, indexed_color.filled())),
            )
            .map_err(|e| ScxrdError::Other(format!("{:?}", e)))?;

        let indexed = flags.map(|f| f.iter().filter(|v| **v).count()).unwrap_or(0);
        let summary = format!("indexed {}/{}", indexed, points.len());
        chart
            .draw_series(std::iter::once(Text::new(
                summary,
                (x_min + (x_max - x_min) * 0.02, y_max - (y_max - y_min) * 0.04),
                ("sans-serif", 14).into_font().color(&BLACK),
            )))
            .map_err(|e| ScxrdError::Other(format!("{:?}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_parse() {
        assert_eq!("XY".parse::<Projection>().unwrap(), Projection::Xy);
        assert_eq!("yz".parse::<Projection>().unwrap(), Projection::Yz);
        assert!("xyz".parse::<Projection>().is_err());
    }

    #[test]
    fn test_projection_coords() {
        let p = ReflectionPoint::new(1.0, 2.0, 3.0, 0.0, 0);
        assert_eq!(Projection::Xz.coords(&p), (1.0, 3.0));
        assert_eq!(Projection::Yz.coords(&p), (2.0, 3.0));
    }

    #[test]
    fn test_padded_range() {
        let (lo, hi) = padded_range([0.0, 10.0].into_iter());
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);

        let (lo, hi) = padded_range([2.0].into_iter());
        assert!(lo < 2.0 && hi > 2.0);
    }

    #[test]
    fn test_empty_plot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(generate_projection_plot(&[], None, Projection::Xy, &dir.path().join("a.png"), "t", 10, 10, false).is_err());
    }
}
