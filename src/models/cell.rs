//! # 晶胞数据模型
//!
//! - `CellParams`: 六个可选参数，对应外部调用方传入的“可能不完整”的晶胞
//! - `UnitCell`: 经过校验的晶胞值类型，构造失败即“无晶胞”
//!
//! ## 依赖关系
//! - 被 `lattice/`、`api/`、`parsers/`、`scxrd/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 可能不完整的晶胞参数（a, b, c, α, β, γ）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellParams {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

impl CellParams {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        CellParams {
            a: Some(a),
            b: Some(b),
            c: Some(c),
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
        }
    }

    /// 六个参数全部存在、有限且为正
    pub fn is_valid(&self) -> bool {
        self.to_api_array().is_some()
    }

    /// 按 a, b, c, α, β, γ 顺序组成 6 元数组；不合法时返回 None
    pub fn to_api_array(&self) -> Option<[f64; 6]> {
        let values = [
            self.a?, self.b?, self.c?, self.alpha?, self.beta?, self.gamma?,
        ];
        if values.iter().all(|v| v.is_finite() && *v > 0.0) {
            Some(values)
        } else {
            None
        }
    }
}

impl From<&UnitCell> for CellParams {
    fn from(cell: &UnitCell) -> Self {
        CellParams::new(cell.a, cell.b, cell.c, cell.alpha, cell.beta, cell.gamma)
    }
}

/// 已校验的晶胞
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// 角度单位：度
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// 体积 (Å³)
    pub volume: f64,
}

impl UnitCell {
    /// 从六个参数构造并计算体积；边长非正、角度退化时返回 None
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Option<Self> {
        let volume = metric_volume(a, b, c, alpha, beta, gamma)?;
        Some(UnitCell {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            volume,
        })
    }

    /// 保留外部给出的体积（如 crystal.ini 第 7 个数），体积非正时回退到计算值
    pub fn with_volume(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
        volume: f64,
    ) -> Option<Self> {
        let mut cell = Self::new(a, b, c, alpha, beta, gamma)?;
        if volume.is_finite() && volume > 0.0 {
            cell.volume = volume;
        }
        Some(cell)
    }

    /// 从 6 元数组构造
    pub fn from_array(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, alpha, beta, gamma, ..] => Self::new(*a, *b, *c, *alpha, *beta, *gamma),
            _ => None,
        }
    }

    /// 从实空间晶格向量（行向量 a, b, c）计算晶胞参数
    pub fn from_vectors(matrix: &[[f64; 3]; 3]) -> Option<Self> {
        let a_vec = matrix[0];
        let b_vec = matrix[1];
        let c_vec = matrix[2];

        let a = (a_vec[0].powi(2) + a_vec[1].powi(2) + a_vec[2].powi(2)).sqrt();
        let b = (b_vec[0].powi(2) + b_vec[1].powi(2) + b_vec[2].powi(2)).sqrt();
        let c = (c_vec[0].powi(2) + c_vec[1].powi(2) + c_vec[2].powi(2)).sqrt();

        if !(a > 0.0 && b > 0.0 && c > 0.0) {
            return None;
        }

        let dot_bc: f64 = b_vec.iter().zip(c_vec.iter()).map(|(x, y)| x * y).sum();
        let dot_ac: f64 = a_vec.iter().zip(c_vec.iter()).map(|(x, y)| x * y).sum();
        let dot_ab: f64 = a_vec.iter().zip(b_vec.iter()).map(|(x, y)| x * y).sum();

        // 浮点误差可能使余弦略微越界
        let alpha = (dot_bc / (b * c)).clamp(-1.0, 1.0).acos().to_degrees();
        let beta = (dot_ac / (a * c)).clamp(-1.0, 1.0).acos().to_degrees();
        let gamma = (dot_ab / (a * b)).clamp(-1.0, 1.0).acos().to_degrees();

        // 标量三重积
        let volume = (a_vec[0] * (b_vec[1] * c_vec[2] - b_vec[2] * c_vec[1])
            - a_vec[1] * (b_vec[0] * c_vec[2] - b_vec[2] * c_vec[0])
            + a_vec[2] * (b_vec[0] * c_vec[1] - b_vec[1] * c_vec[0]))
            .abs();

        if !(volume.is_finite() && volume > 0.0) {
            return None;
        }

        Some(UnitCell {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            volume,
        })
    }

    /// a, b, c, α, β, γ 数组
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.alpha, self.beta, self.gamma]
    }

    /// 六个参数逐项在容差内相等
    pub fn approx_eq(&self, other: &UnitCell, tolerance: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(x, y)| (x - y).abs() < tolerance)
    }
}

impl std::fmt::Display for UnitCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "a={:.4} b={:.4} c={:.4} α={:.3} β={:.3} γ={:.3} V={:.2}",
            self.a, self.b, self.c, self.alpha, self.beta, self.gamma, self.volume
        )
    }
}

/// 由度量张量行列式计算体积
fn metric_volume(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Option<f64> {
    let lengths_ok = [a, b, c].iter().all(|v| v.is_finite() && *v > 0.0);
    let angles_ok = [alpha, beta, gamma]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0 && *v < 180.0);
    if !lengths_ok || !angles_ok {
        return None;
    }

    let ca = alpha.to_radians().cos();
    let cb = beta.to_radians().cos();
    let cg = gamma.to_radians().cos();
    let factor = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
    if factor <= 0.0 {
        return None;
    }

    Some(a * b * c * factor.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_cell_volume() {
        let cell = UnitCell::new(5.0, 5.0, 5.0, 90.0, 90.0, 90.0).unwrap();
        assert!((cell.volume - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_cells_rejected() {
        assert!(UnitCell::new(0.0, 5.0, 5.0, 90.0, 90.0, 90.0).is_none());
        assert!(UnitCell::new(-1.0, 5.0, 5.0, 90.0, 90.0, 90.0).is_none());
        assert!(UnitCell::new(5.0, 5.0, 5.0, 0.0, 90.0, 90.0).is_none());
        assert!(UnitCell::new(5.0, 5.0, 5.0, 90.0, 180.0, 90.0).is_none());
        // 三个角度之和超过 360° 时度量张量退化
        assert!(UnitCell::new(5.0, 5.0, 5.0, 170.0, 170.0, 170.0).is_none());
    }

    #[test]
    fn test_with_volume_keeps_supplied_value() {
        let cell = UnitCell::with_volume(5.0, 5.0, 5.0, 90.0, 90.0, 90.0, 125.5).unwrap();
        assert!((cell.volume - 125.5).abs() < 1e-9);

        let cell = UnitCell::with_volume(5.0, 5.0, 5.0, 90.0, 90.0, 90.0, 0.0).unwrap();
        assert!((cell.volume - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_vectors_hexagonal() {
        let s = 120.0_f64.to_radians();
        let cell =
            UnitCell::from_vectors(&[[3.0, 0.0, 0.0], [3.0 * s.cos(), 3.0 * s.sin(), 0.0], [0.0, 0.0, 5.0]])
                .unwrap();
        assert!((cell.a - 3.0).abs() < 1e-9);
        assert!((cell.b - 3.0).abs() < 1e-9);
        assert!((cell.gamma - 120.0).abs() < 1e-9);
        assert!((cell.alpha - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_vectors_coplanar_is_none() {
        let cell = UnitCell::from_vectors(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]);
        assert!(cell.is_none());
    }

    #[test]
    fn test_cell_params_validity() {
        let full = CellParams::new(10.0, 11.0, 12.0, 90.0, 95.0, 100.0);
        assert!(full.is_valid());
        assert_eq!(full.to_api_array(), Some([10.0, 11.0, 12.0, 90.0, 95.0, 100.0]));

        let missing = CellParams {
            a: None,
            ..full
        };
        assert!(!missing.is_valid());

        let zero = CellParams {
            a: Some(0.0),
            ..full
        };
        assert!(!zero.is_valid());

        let negative = CellParams {
            c: Some(-3.0),
            ..full
        };
        assert!(!negative.is_valid());
    }

    #[test]
    fn test_from_array() {
        let cell = UnitCell::from_array(&[4.0, 4.0, 4.0, 90.0, 90.0, 90.0]).unwrap();
        assert!((cell.volume - 64.0).abs() < 1e-9);
        assert!(UnitCell::from_array(&[4.0, 4.0]).is_none());
    }
}
