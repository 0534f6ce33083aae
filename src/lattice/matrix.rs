//! # 3×3 矩阵运算
//!
//! 闭式公式（行列式、余子式 / 伴随矩阵求逆），不依赖线性代数库。
//!
//! ## 依赖关系
//! - 被 `lattice/ub_matrix.rs`、`lattice/indexing.rs` 使用
//! - 无外部模块依赖

/// 行主序 3×3 矩阵
pub type Mat3 = [[f64; 3]; 3];

/// 三维向量
pub type Vec3 = [f64; 3];

/// 行列式低于此值视为奇异
pub const SINGULAR_EPSILON: f64 = 1e-10;

pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// 从 9 个按行排列的数构造
pub fn from_row_major(values: &[f64; 9]) -> Mat3 {
    [
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
        [values[6], values[7], values[8]],
    ]
}

pub fn determinant(m: &Mat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 余子式矩阵（已带符号）
pub fn cofactor(m: &Mat3) -> Mat3 {
    let mut c = [[0.0; 3]; 3];
    for (row, c_row) in c.iter_mut().enumerate() {
        for (col, value) in c_row.iter_mut().enumerate() {
            let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
            *value = sign * minor(m, row, col);
        }
    }
    c
}

/// 去掉第 row 行、第 col 列后的 2×2 行列式
fn minor(m: &Mat3, row: usize, col: usize) -> f64 {
    let rows: Vec<usize> = (0..3).filter(|&r| r != row).collect();
    let cols: Vec<usize> = (0..3).filter(|&c| c != col).collect();

    m[rows[0]][cols[0]] * m[rows[1]][cols[1]] - m[rows[0]][cols[1]] * m[rows[1]][cols[0]]
}

/// 伴随矩阵法求逆；奇异时返回 None
pub fn inverse(m: &Mat3) -> Option<Mat3> {
    let det = determinant(m);
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return None;
    }

    let c = cofactor(m);
    let mut inv = [[0.0; 3]; 3];
    for (i, inv_row) in inv.iter_mut().enumerate() {
        for (j, value) in inv_row.iter_mut().enumerate() {
            *value = c[j][i] / det;
        }
    }
    Some(inv)
}

pub fn transpose(m: &Mat3) -> Mat3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

pub fn mul_vec(m: &Mat3, v: &Vec3) -> Vec3 {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

pub fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut r = [[0.0; 3]; 3];
    for (i, r_row) in r.iter_mut().enumerate() {
        for (j, value) in r_row.iter_mut().enumerate() {
            *value = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    r
}

/// 每个元素乘以标量
pub fn scale(m: &Mat3, factor: f64) -> Mat3 {
    m.map(|row| row.map(|v| v * factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_close(a: &Mat3, b: &Mat3, tol: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a[i][j] - b[i][j]).abs() < tol,
                    "mismatch at ({}, {}): {} vs {}",
                    i,
                    j,
                    a[i][j],
                    b[i][j]
                );
            }
        }
    }

    #[test]
    fn test_identity_inverse() {
        let inv = inverse(&IDENTITY).unwrap();
        assert_mat_close(&inv, &IDENTITY, 0.001);
    }

    #[test]
    fn test_singular_matrix() {
        assert!(inverse(&[[0.0; 3]; 3]).is_none());
        let dependent = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        assert!(determinant(&dependent).abs() < 0.001);
        assert!(inverse(&dependent).is_none());
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = [[0.1234, -0.0456, 0.0789], [0.0234, 0.1567, -0.0123], [-0.0567, 0.0345, 0.1123]];
        let inv = inverse(&m).unwrap();
        assert_mat_close(&mul(&m, &inv), &IDENTITY, 1e-9);
    }

    #[test]
    fn test_mul_vec() {
        let m = [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]];
        let r = mul_vec(&m, &[1.0, 2.0, 3.0]);
        assert!((r[0] - 1.0).abs() < 0.001);
        assert!((r[1] - 4.0).abs() < 0.001);
        assert!((r[2] - 9.0).abs() < 0.001);
    }

    #[test]
    fn test_transpose_and_row_major() {
        let m = from_row_major(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(m[1], [4.0, 5.0, 6.0]);
        assert_eq!(transpose(&m)[0], [1.0, 4.0, 7.0]);
    }

    #[test]
    fn test_cofactor_signs() {
        let c = cofactor(&IDENTITY);
        assert_mat_close(&c, &IDENTITY, 1e-12);
    }
}
