//! # UB 矩阵 → 晶胞参数
//!
//! 存储的 UB 矩阵无量纲，先除以波长得到 Å⁻¹ 单位的倒易取向矩阵。
//! UB 的列是倒易基矢 a*, b*, c*（在实验室坐标系中），
//! 因而 (UB)⁻¹ 的行就是实空间基矢 a, b, c，无 2π 因子。
//! 边长、夹角与取向 U 无关。
//!
//! ## 依赖关系
//! - 被 `commands/cell.rs`、`commands/peaks.rs` 使用
//! - 使用 `lattice/matrix.rs`、`models/cell.rs`

use super::matrix::{self, Mat3};
use crate::models::UnitCell;
use log::{debug, warn};

/// Mo Kα 波长 (Å)
pub const MO_KALPHA_WAVELENGTH: f64 = 0.71073;

/// Cu Kα 波长 (Å)
pub const CU_KALPHA_WAVELENGTH: f64 = 1.5418;

/// 将 UB 矩阵转换为晶胞参数；奇异矩阵、非法波长返回 None
pub fn ub_matrix_to_cell_parameters(ub: &Mat3, wavelength: f64) -> Option<UnitCell> {
    if !wavelength.is_finite() || wavelength <= 0.0 {
        warn!("Invalid wavelength {} for UB conversion", wavelength);
        return None;
    }

    let scaled = matrix::scale(ub, 1.0 / wavelength);

    let Some(real_space) = matrix::inverse(&scaled) else {
        debug!("UB matrix is singular, no cell");
        return None;
    };

    let cell = UnitCell::from_vectors(&real_space);
    if cell.is_none() {
        debug!("UB matrix produced a degenerate cell");
    }
    cell
}

/// 9 个按行排列的矩阵元
pub fn ub_values_to_cell_parameters(values: &[f64; 9], wavelength: f64) -> Option<UnitCell> {
    ub_matrix_to_cell_parameters(&matrix::from_row_major(values), wavelength)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_ub_matrix() {
        let ub = [[0.1, 0.0, 0.0], [0.0, 0.1, 0.0], [0.0, 0.0, 0.1]];
        let cell = ub_matrix_to_cell_parameters(&ub, 1.0).unwrap();

        assert!((cell.a - 10.0).abs() < 0.1);
        assert!((cell.b - 10.0).abs() < 0.1);
        assert!((cell.c - 10.0).abs() < 0.1);
        assert!((cell.alpha - 90.0).abs() < 1.0);
        assert!((cell.beta - 90.0).abs() < 1.0);
        assert!((cell.gamma - 90.0).abs() < 1.0);
        assert!((cell.volume - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_wavelength_divides_entries() {
        let ub = [[0.071073, 0.0, 0.0], [0.0, 0.071073, 0.0], [0.0, 0.0, 0.071073]];
        let cell = ub_matrix_to_cell_parameters(&ub, MO_KALPHA_WAVELENGTH).unwrap();
        assert!((cell.a - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_realistic_ub_matrix() {
        let values = [
            5.41663077870e-02,
            1.19307712811e-02,
            2.23492806450e-02,
            2.03678053387e-02,
            -2.15667381406e-02,
            1.58944187845e-02,
            6.71691977991e-02,
            -2.83506788777e-03,
            -2.28588798291e-02,
        ];
        let cell = ub_values_to_cell_parameters(&values, 1.0).unwrap();

        for length in [cell.a, cell.b, cell.c] {
            assert!(length > 0.0);
        }
        for angle in [cell.alpha, cell.beta, cell.gamma] {
            assert!(angle > 0.0 && angle < 180.0);
        }
        assert!(cell.volume > 0.0);
    }

    #[test]
    fn test_rotation_does_not_change_cell() {
        // 绕 z 轴旋转 30° 的 U
        let (s, c) = 30.0_f64.to_radians().sin_cos();
        let u = [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]];
        let b = [[0.1, 0.02, 0.0], [0.0, 0.125, 0.01], [0.0, 0.0, 0.05]];

        let plain = ub_matrix_to_cell_parameters(&b, 1.0).unwrap();
        let rotated = ub_matrix_to_cell_parameters(&matrix::mul(&u, &b), 1.0).unwrap();
        assert!(plain.approx_eq(&rotated, 1e-9));
        assert!((plain.volume - rotated.volume).abs() < 1e-6);
    }

    #[test]
    fn test_zero_matrix_is_none() {
        assert!(ub_matrix_to_cell_parameters(&[[0.0; 3]; 3], MO_KALPHA_WAVELENGTH).is_none());
    }

    #[test]
    fn test_invalid_wavelength_is_none() {
        let ub = [[0.1, 0.0, 0.0], [0.0, 0.1, 0.0], [0.0, 0.0, 0.1]];
        assert!(ub_matrix_to_cell_parameters(&ub, 0.0).is_none());
        assert!(ub_matrix_to_cell_parameters(&ub, f64::NAN).is_none());
    }
}
